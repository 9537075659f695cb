/// Half of the map height in world units; vertical bounds are always `±90`.
pub const HALF_HEIGHT: f64 = 90.0;
/// Half of the map width in world units at aspect ratio 1.
pub const HALF_WIDTH_AT_UNIT_ASPECT: f64 = 180.0;

pub const NEAR: f64 = -100.0;
pub const FAR: f64 = 100.0;

/// Left/right/top/bottom extents visible through the orthographic camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthoBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl OrthoBounds {
    /// Horizontal extent scales with `aspect`; vertical extent is fixed.
    pub fn for_aspect(aspect: f64) -> Self {
        let half_w = HALF_WIDTH_AT_UNIT_ASPECT * aspect;
        Self {
            left: -half_w,
            right: half_w,
            top: HALF_HEIGHT,
            bottom: -HALF_HEIGHT,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// Width over height; a degenerate surface counts as square.
pub fn aspect_ratio(width: f64, height: f64) -> f64 {
    if height <= 0.0 || width <= 0.0 || !width.is_finite() || !height.is_finite() {
        1.0
    } else {
        width / height
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthoCamera {
    pub bounds: OrthoBounds,
    pub near: f64,
    pub far: f64,
}

impl OrthoCamera {
    pub fn for_surface(width: f64, height: f64) -> Self {
        Self {
            bounds: OrthoBounds::for_aspect(aspect_ratio(width, height)),
            near: NEAR,
            far: FAR,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.bounds = OrthoBounds::for_aspect(aspect_ratio(width, height));
    }

    /// Column-major (WGSL) orthographic matrix, RH, depth range [0, 1].
    ///
    /// The camera looks down `-z` from the origin, so larger world `z` lands
    /// closer to the viewer.
    pub fn view_proj(&self) -> [[f32; 4]; 4] {
        let b = self.bounds;
        let rl = b.right - b.left;
        let tb = b.top - b.bottom;
        let fne = self.far - self.near;

        let sx = (2.0 / rl) as f32;
        let sy = (2.0 / tb) as f32;
        let sz = (-1.0 / fne) as f32;
        let tx = (-(b.right + b.left) / rl) as f32;
        let ty = (-(b.top + b.bottom) / tb) as f32;
        let tz = (-self.near / fne) as f32;

        [
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
            [tx, ty, tz, 1.0],
        ]
    }
}

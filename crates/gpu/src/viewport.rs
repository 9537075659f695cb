use crate::camera::OrthoCamera;

/// Window size in CSS pixels plus the device pixel ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceSize {
    pub css_width: f64,
    pub css_height: f64,
    pub pixel_ratio: f64,
}

impl SurfaceSize {
    pub fn new(css_width: f64, css_height: f64, pixel_ratio: f64) -> Self {
        let sanitize = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            css_width: sanitize(css_width),
            css_height: sanitize(css_height),
            pixel_ratio,
        }
    }

    /// Backing-store size in device pixels, at least 1x1.
    pub fn physical(&self) -> (u32, u32) {
        let px = |css: f64| ((css * self.pixel_ratio).round() as u32).max(1);
        (px(self.css_width), px(self.css_height))
    }
}

/// Camera bounds and output size, recomputed wholesale from the window size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub size: SurfaceSize,
    pub camera: OrthoCamera,
}

impl Viewport {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            camera: OrthoCamera::for_surface(size.css_width, size.css_height),
        }
    }

    /// Returns `true` when the backing store needs to be resized.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        let changed = size.physical() != self.size.physical();
        self.size = size;
        self.camera.resize(size.css_width, size.css_height);
        changed
    }
}

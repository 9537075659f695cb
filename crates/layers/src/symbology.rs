use serde::Deserialize;

/// Colour and depth layer for one kind of map primitive.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayerStyle {
    pub color: [f32; 4],
    /// World-space `z`; larger values draw in front.
    pub depth: f64,
}

impl LayerStyle {
    pub const fn new(color: [f32; 4], depth: f64) -> Self {
        Self { color, depth }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            depth: 0.0,
        }
    }
}

/// Drop shadow drawn behind every land fill.
///
/// Each ring's shadow is its fill scaled by `scale` about the ring's own
/// bounding-box centre, then moved by `offset`, so it sits below and to the
/// right of the land at every latitude.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShadowStyle {
    pub color: [f32; 4],
    pub depth: f64,
    pub scale: f64,
    pub offset: [f64; 2],
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 0.45],
            depth: -1.0,
            scale: 1.01,
            offset: [0.6, -0.6],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    pub background: [f32; 4],
    pub land: LayerStyle,
    pub shadow: ShadowStyle,
    pub coastline: LayerStyle,
    /// Glow colour of the travel arc; alpha comes from the glow window.
    pub arc: LayerStyle,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            background: [0.02, 0.05, 0.10, 1.0],
            land: LayerStyle::new([0.13, 0.22, 0.30, 1.0], 0.0),
            shadow: ShadowStyle::default(),
            coastline: LayerStyle::new([0.45, 0.65, 0.80, 1.0], 0.5),
            arc: LayerStyle::new([1.0, 0.55, 0.15, 1.0], 1.0),
        }
    }
}

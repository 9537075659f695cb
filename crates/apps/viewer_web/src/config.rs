use layers::{ArcSpec, GlowWindow, MapStyle};
use runtime::GLOW_SPEED;
use serde::Deserialize;

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Glow cycles per second.
    pub speed: f64,
    pub glow: GlowWindow,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: GLOW_SPEED,
            glow: GlowWindow::default(),
        }
    }
}

/// Host-supplied viewer settings; every field is optional in the JSON form.
#[derive(Debug, Copy, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub style: MapStyle,
    pub arc: ArcSpec,
    pub animation: AnimationConfig,
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }
}

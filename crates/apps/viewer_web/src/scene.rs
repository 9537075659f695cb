use formats::{LandDataset, SkipReport};
use foundation::math::Vec3;
use layers::{ArcPath, GlowWindow, LandMeshes, MapStyle};

use crate::config::ViewerConfig;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlatVertex {
    pub position: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ArcVertex {
    pub position: [f32; 3],
    pub progress: f32,
}

/// Uniform block shared by every map pipeline. Layout matches `Globals` in WGSL.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub land: [f32; 4],
    pub shadow: [f32; 4],
    pub coastline: [f32; 4],
    pub arc: [f32; 4],
    /// x = glow time, y = lead, z = trail.
    pub glow: [f32; 4],
}

impl Globals {
    pub fn new(
        view_proj: [[f32; 4]; 4],
        style: &MapStyle,
        glow_time: f64,
        glow: GlowWindow,
    ) -> Self {
        Self {
            view_proj,
            land: style.land.color,
            shadow: style.shadow.color,
            coastline: style.coastline.color,
            arc: style.arc.color,
            glow: [glow_time as f32, glow.lead as f32, glow.trail as f32, 0.0],
        }
    }
}

/// CPU-side vertex data for one mounted map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneData {
    pub shadow: Vec<FlatVertex>,
    pub fill: Vec<FlatVertex>,
    /// Line list.
    pub outline: Vec<FlatVertex>,
    /// Line strip.
    pub arc: Vec<ArcVertex>,
    pub rings_drawn: usize,
    pub rings_skipped: usize,
    pub input_skips: SkipReport,
}

impl SceneData {
    pub fn build(dataset: &LandDataset, config: &ViewerConfig) -> Self {
        let land = LandMeshes::build(dataset, &config.style);
        let arc = ArcPath::generate(&config.arc, config.style.arc.depth);

        Self {
            shadow: flat_vertices(&land.shadow_triangles),
            fill: flat_vertices(&land.fill_triangles),
            outline: flat_vertices(&land.outline_segments),
            arc: arc
                .samples
                .iter()
                .map(|s| ArcVertex {
                    position: s.position.to_f32(),
                    progress: s.progress as f32,
                })
                .collect(),
            rings_drawn: land.rings_drawn,
            rings_skipped: land.rings_skipped,
            input_skips: dataset.skipped,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "land: {} rings drawn, {} rings skipped, {} fill vertices, {} outline vertices; input skips: {:?}; arc: {} samples",
            self.rings_drawn,
            self.rings_skipped,
            self.fill.len(),
            self.outline.len(),
            self.input_skips,
            self.arc.len()
        )
    }
}

fn flat_vertices(points: &[Vec3]) -> Vec<FlatVertex> {
    points
        .iter()
        .map(|p| FlatVertex {
            position: p.to_f32(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ArcVertex, Globals, SceneData};
    use crate::config::ViewerConfig;
    use formats::LandDataset;
    use layers::{GlowWindow, MapStyle};

    const LAND: &str = r#"{ "features": [
        { "geometry": { "type": "Polygon", "coordinates": [
            [[-10, -5], [10, -5], [10, 5], [-10, 5], [-10, -5]]
        ]}},
        { "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1]]] } },
        { "geometry": "missing" }
    ]}"#;

    #[test]
    fn builds_land_and_arc_buffers() {
        let ds = LandDataset::from_geojson_str(LAND).expect("dataset");
        let config = ViewerConfig::default();
        let scene = SceneData::build(&ds, &config);

        assert_eq!(scene.rings_drawn, 1);
        assert_eq!(scene.rings_skipped, 1);
        assert_eq!(scene.input_skips.features, 1);
        assert_eq!(scene.input_skips.points, 1);
        assert_eq!(scene.fill.len(), 6);
        assert_eq!(scene.shadow.len(), 6);
        assert_eq!(scene.outline.len(), 8);

        assert_eq!(scene.arc.len(), 161);
        assert_eq!(scene.arc[0].progress, 0.0);
        assert_eq!(scene.arc[160].progress, 1.0);
        let z = config.style.arc.depth as f32;
        assert!(scene.arc.iter().all(|v| v.position[2] == z));
        assert!(scene.summary().contains("161 samples"));
    }

    #[test]
    fn empty_dataset_still_draws_the_arc() {
        let scene = SceneData::build(&LandDataset::default(), &ViewerConfig::default());
        assert!(scene.fill.is_empty() && scene.outline.is_empty());
        assert_eq!(scene.arc.len(), 161);
    }

    #[test]
    fn gpu_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<ArcVertex>(), 16);
        assert_eq!(std::mem::size_of::<Globals>(), 144);

        let style = MapStyle::default();
        let g = Globals::new([[0.0; 4]; 4], &style, 0.5, GlowWindow::default());
        assert_eq!(g.glow, [0.5, 0.05, 0.2, 0.0]);
        assert_eq!(g.arc, style.arc.color);
        assert_eq!(g.shadow, style.shadow.color);
    }
}

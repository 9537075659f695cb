use foundation::math::{LonLat, Vec3, project_lon_lat};
use serde::Deserialize;

pub const ARC_STEPS: usize = 160;
pub const ARC_LIFT: f64 = 18.0;

/// The travel arc: two fixed endpoints joined by a lifted curve.
///
/// The sample count is always `ARC_STEPS + 1`; only the endpoints and the
/// lift are configurable.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArcSpec {
    /// `[lon, lat]` in degrees.
    pub from: [f64; 2],
    pub to: [f64; 2],
    /// Peak vertical offset (plane units) reached halfway along the arc.
    pub lift: f64,
}

impl Default for ArcSpec {
    fn default() -> Self {
        Self {
            // New York -> London.
            from: [-74.006, 40.7128],
            to: [-0.1278, 51.5074],
            lift: ARC_LIFT,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcSample {
    pub position: Vec3,
    /// Normalised position along the arc, `0.0..=1.0`.
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArcPath {
    pub samples: Vec<ArcSample>,
}

impl ArcPath {
    /// Samples `ARC_STEPS + 1` points uniformly in `t`, lifting each by
    /// `lift * sin(t * PI)` along `y`. `depth` is the world `z` of the line.
    pub fn generate(spec: &ArcSpec, depth: f64) -> Self {
        let steps = ARC_STEPS;
        let from = project_lon_lat(LonLat::new(spec.from[0], spec.from[1]));
        let to = project_lon_lat(LonLat::new(spec.to[0], spec.to[1]));

        let samples = (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                let p = from.lerp(to, t);
                ArcSample {
                    position: Vec3::new(p.x, p.y + arc_lift(spec.lift, t), depth),
                    progress: t,
                }
            })
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Vertical lift at `t`; exactly zero at both endpoints.
pub fn arc_lift(lift: f64, t: f64) -> f64 {
    if t <= 0.0 || t >= 1.0 {
        return 0.0;
    }
    lift * (t * std::f64::consts::PI).sin()
}

/// The lit window that travels along the arc.
///
/// A sample at progress `p` fades in over `[time - lead, time]` and out over
/// `[time, time + trail]`. The fragment shader evaluates the same rule.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlowWindow {
    pub lead: f64,
    pub trail: f64,
}

impl Default for GlowWindow {
    fn default() -> Self {
        Self {
            lead: 0.05,
            trail: 0.2,
        }
    }
}

impl GlowWindow {
    pub fn intensity(&self, progress: f64, time: f64) -> f64 {
        let rise = smoothstep(time - self.lead, time, progress);
        let fall = 1.0 - smoothstep(time, time + self.trail, progress);
        rise * fall
    }
}

/// Hermite step, matching WGSL `smoothstep`.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 == edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::{ARC_LIFT, ARC_STEPS, ArcPath, ArcSpec, GlowWindow, arc_lift, smoothstep};

    #[test]
    fn default_arc_has_161_samples_with_monotonic_progress() {
        let path = ArcPath::generate(&ArcSpec::default(), 1.0);
        assert_eq!(path.len(), ARC_STEPS + 1);
        assert_eq!(path.samples[0].progress, 0.0);
        assert_eq!(path.samples[ARC_STEPS].progress, 1.0);
        for w in path.samples.windows(2) {
            assert!(w[1].progress > w[0].progress);
        }
        assert!(path.samples.iter().all(|s| s.position.z == 1.0));
    }

    #[test]
    fn endpoints_are_unlifted_and_midpoint_peaks() {
        let spec = ArcSpec::default();
        let path = ArcPath::generate(&spec, 0.0);

        let first = path.samples[0].position;
        let last = path.samples[ARC_STEPS].position;
        assert_eq!((first.x, first.y), (spec.from[0], spec.from[1]));
        assert_eq!((last.x, last.y), (spec.to[0], spec.to[1]));

        let mid = path.samples[ARC_STEPS / 2];
        assert_eq!(mid.progress, 0.5);
        let straight_y = (spec.from[1] + spec.to[1]) * 0.5;
        assert!((mid.position.y - straight_y - ARC_LIFT).abs() < 1e-9);
        assert_eq!(arc_lift(ARC_LIFT, 0.5), ARC_LIFT);
    }

    #[test]
    fn lift_is_zero_outside_the_open_interval() {
        assert_eq!(arc_lift(18.0, 0.0), 0.0);
        assert_eq!(arc_lift(18.0, 1.0), 0.0);
        assert!(arc_lift(18.0, 0.25) > 0.0);
    }

    #[test]
    fn custom_endpoints_keep_the_fixed_sample_count() {
        let spec = ArcSpec {
            from: [2.35, 48.85],
            to: [139.69, 35.68],
            lift: 5.0,
        };
        let path = ArcPath::generate(&spec, 0.0);
        assert_eq!(path.len(), ARC_STEPS + 1);
        assert_eq!(path.samples[ARC_STEPS].progress, 1.0);
    }

    #[test]
    fn glow_peaks_at_time_and_fades_on_both_sides() {
        let glow = GlowWindow::default();
        let time = 0.5;
        assert_eq!(glow.intensity(time, time), 1.0);
        assert_eq!(glow.intensity(time - 0.05, time), 0.0);
        assert_eq!(glow.intensity(time + 0.2, time), 0.0);
        assert_eq!(glow.intensity(0.0, time), 0.0);
        assert_eq!(glow.intensity(1.0, time), 0.0);

        let behind = glow.intensity(time - 0.025, time);
        let ahead = glow.intensity(time + 0.1, time);
        assert!(behind > 0.0 && behind < 1.0);
        assert!(ahead > 0.0 && ahead < 1.0);
    }

    #[test]
    fn smoothstep_matches_hermite_curve() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(1.0, 1.0, 1.0), 1.0);
    }
}

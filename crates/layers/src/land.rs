use earcutr::earcut;
use formats::{LandDataset, Ring};
use foundation::Aabb2;
use foundation::math::{Vec2, Vec3, project_lon_lat};

use crate::symbology::{MapStyle, ShadowStyle};

/// Fewer valid points than this and a ring is not drawn at all.
pub const MIN_RING_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilledShape {
    /// Flat triangle list (3 vertices per triangle) in world coordinates.
    pub triangles: Vec<Vec3>,
}

/// Open polyline; the first point is not repeated at the end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub vertices: Vec<Vec3>,
}

impl Polyline {
    /// Consecutive vertex pairs, as consumed by a line-list pipeline.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Everything drawn for one outer ring.
///
/// `shadow` and `fill` are `None` when the ring cannot be triangulated
/// (e.g. all points collinear); the coastline is still drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RingPrimitives {
    pub shadow: Option<FilledShape>,
    pub fill: Option<FilledShape>,
    pub outline: Polyline,
}

pub fn build_ring(ring: &Ring, style: &MapStyle) -> Option<RingPrimitives> {
    let plane: Vec<Vec2> = ring.valid_points().map(project_lon_lat).collect();
    if plane.len() < MIN_RING_POINTS {
        return None;
    }

    let outline = Polyline {
        vertices: plane
            .iter()
            .map(|p| p.extend(style.coastline.depth))
            .collect(),
    };

    let (shadow, fill) = match triangulate(&plane) {
        Some(tris) => {
            let pivot = ring_center(&plane);
            let shadow = FilledShape {
                triangles: tris
                    .iter()
                    .map(|p| shadow_position(*p, pivot, &style.shadow))
                    .collect(),
            };
            let fill = FilledShape {
                triangles: tris.iter().map(|p| p.extend(style.land.depth)).collect(),
            };
            (Some(shadow), Some(fill))
        }
        None => (None, None),
    };

    Some(RingPrimitives {
        shadow,
        fill,
        outline,
    })
}

fn ring_center(plane: &[Vec2]) -> Vec2 {
    let mut bounds = Aabb2::point(plane[0].x, plane[0].y);
    for p in &plane[1..] {
        bounds.include(p.x, p.y);
    }
    let [x, y] = bounds.center();
    Vec2::new(x, y)
}

fn shadow_position(p: Vec2, pivot: Vec2, shadow: &ShadowStyle) -> Vec3 {
    let offset = Vec2::new(shadow.offset[0], shadow.offset[1]);
    ((p - pivot).scale(shadow.scale) + pivot + offset).extend(shadow.depth)
}

fn triangulate(plane: &[Vec2]) -> Option<Vec<Vec2>> {
    let mut points = plane.to_vec();
    drop_closing_duplicate(&mut points);
    if points.len() < 3 {
        return None;
    }

    let coords: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcut(&coords, &[], 2).ok()?;
    if indices.is_empty() {
        return None;
    }
    Some(indices.into_iter().filter_map(|i| points.get(i).copied()).collect())
}

fn drop_closing_duplicate(points: &mut Vec<Vec2>) {
    if let [first, .., last] = points.as_slice() {
        if (first.x - last.x).abs() < 1e-9 && (first.y - last.y).abs() < 1e-9 {
            points.pop();
        }
    }
}

/// Batched land primitives for the whole dataset, ready for upload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LandMeshes {
    pub shadow_triangles: Vec<Vec3>,
    pub fill_triangles: Vec<Vec3>,
    /// Line list: every coastline contributes its consecutive segments.
    pub outline_segments: Vec<Vec3>,
    pub rings_drawn: usize,
    pub rings_skipped: usize,
    pub rings_unfilled: usize,
    /// Plane-space extent of all drawn coastlines.
    pub extent: Option<Aabb2>,
}

impl LandMeshes {
    pub fn build(dataset: &LandDataset, style: &MapStyle) -> Self {
        let mut out = Self::default();
        for (index, ring) in dataset.outer_rings().enumerate() {
            match build_ring(ring, style) {
                Some(prims) => out.push(&prims),
                None => {
                    tracing::debug!(
                        ring = index,
                        valid_points = ring.valid_len(),
                        "skipping ring with too few points"
                    );
                    out.rings_skipped += 1;
                }
            }
        }

        tracing::info!(
            rings = out.rings_drawn,
            skipped = out.rings_skipped,
            unfilled = out.rings_unfilled,
            fill_vertices = out.fill_triangles.len(),
            outline_vertices = out.outline_segments.len(),
            "built land meshes"
        );
        out
    }

    pub fn push(&mut self, prims: &RingPrimitives) {
        if let Some(shadow) = &prims.shadow {
            self.shadow_triangles.extend_from_slice(&shadow.triangles);
        }
        match &prims.fill {
            Some(fill) => self.fill_triangles.extend_from_slice(&fill.triangles),
            None => self.rings_unfilled += 1,
        }

        for (a, b) in prims.outline.segments() {
            self.outline_segments.push(a);
            self.outline_segments.push(b);
        }
        for v in &prims.outline.vertices {
            match &mut self.extent {
                Some(extent) => extent.include(v.x, v.y),
                None => self.extent = Some(Aabb2::point(v.x, v.y)),
            }
        }
        self.rings_drawn += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{LandMeshes, MIN_RING_POINTS, build_ring};
    use crate::symbology::MapStyle;
    use formats::{LandDataset, Ring};
    use foundation::Aabb2;
    use foundation::math::{LonLat, Vec3};
    use pretty_assertions::assert_eq;

    fn square() -> Ring {
        Ring::from_lon_lat(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)])
    }

    #[test]
    fn short_rings_produce_nothing() {
        let style = MapStyle::default();
        for n in 0..MIN_RING_POINTS {
            let pts: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, (i * i) as f64)).collect();
            assert!(build_ring(&Ring::from_lon_lat(&pts), &style).is_none(), "n = {n}");
        }
    }

    #[test]
    fn invalid_points_do_not_count_toward_the_minimum() {
        let ring = Ring::new(vec![
            Some(LonLat::new(0.0, 0.0)),
            None,
            Some(LonLat::new(5.0, 5.0)),
            None,
        ]);
        assert!(build_ring(&ring, &MapStyle::default()).is_none());
    }

    #[test]
    fn invalid_point_is_dropped_without_losing_the_ring() {
        let style = MapStyle::default();
        let ring = Ring::new(vec![
            Some(LonLat::new(0.0, 0.0)),
            Some(LonLat::new(8.0, 0.0)),
            None,
            Some(LonLat::new(8.0, 6.0)),
        ]);
        let prims = build_ring(&ring, &style).expect("ring drawn");
        let z = style.coastline.depth;
        assert_eq!(
            prims.outline.vertices,
            vec![
                Vec3::new(0.0, 0.0, z),
                Vec3::new(8.0, 0.0, z),
                Vec3::new(8.0, 6.0, z),
            ]
        );
        assert_eq!(prims.fill.expect("fill").triangles.len(), 3);
    }

    #[test]
    fn square_builds_fill_shadow_and_outline_layers() {
        let style = MapStyle::default();
        let prims = build_ring(&square(), &style).expect("ring drawn");

        let fill = prims.fill.expect("fill");
        let shadow = prims.shadow.expect("shadow");
        assert_eq!(fill.triangles.len(), 6);
        assert_eq!(shadow.triangles.len(), 6);
        assert!(fill.triangles.iter().all(|v| v.z == style.land.depth));

        // Scaled about the square's centre (5, 5), then offset.
        let s = style.shadow;
        for (f, sh) in fill.triangles.iter().zip(&shadow.triangles) {
            assert!((sh.x - ((f.x - 5.0) * s.scale + 5.0 + s.offset[0])).abs() < 1e-12);
            assert!((sh.y - ((f.y - 5.0) * s.scale + 5.0 + s.offset[1])).abs() < 1e-12);
            assert_eq!(sh.z, s.depth);
        }

        // The outline keeps the closing point: it is an open polyline through the input.
        assert_eq!(prims.outline.vertices.len(), 5);
        assert_eq!(prims.outline.segments().count(), 4);
        assert!(prims.outline.vertices.iter().all(|v| v.z == style.coastline.depth));
    }

    #[test]
    fn shadow_sits_below_the_fill_at_high_latitude() {
        let style = MapStyle::default();
        let ring = Ring::from_lon_lat(&[(0.0, 70.0), (20.0, 70.0), (20.0, 80.0), (0.0, 80.0)]);
        let prims = build_ring(&ring, &style).expect("ring drawn");
        let fill = prims.fill.expect("fill").triangles;
        let shadow = prims.shadow.expect("shadow").triangles;

        let centre = |vs: &[Vec3]| {
            let mut b = Aabb2::point(vs[0].x, vs[0].y);
            for v in vs {
                b.include(v.x, v.y);
            }
            b.center()
        };
        let [fx, fy] = centre(&fill);
        let [sx, sy] = centre(&shadow);
        assert!((sx - fx - style.shadow.offset[0]).abs() < 1e-9);
        assert!((sy - fy - style.shadow.offset[1]).abs() < 1e-9);
        assert!(sy < fy);

        let fill_top = fill.iter().map(|v| v.y).fold(f64::MIN, f64::max);
        let shadow_top = shadow.iter().map(|v| v.y).fold(f64::MIN, f64::max);
        assert!(shadow_top < fill_top, "{shadow_top} >= {fill_top}");
    }

    #[test]
    fn collinear_ring_keeps_only_its_outline() {
        let ring = Ring::from_lon_lat(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let prims = build_ring(&ring, &MapStyle::default()).expect("outline drawn");
        assert!(prims.fill.is_none());
        assert!(prims.shadow.is_none());
        assert_eq!(prims.outline.vertices.len(), 3);
    }

    #[test]
    fn batches_dataset_and_counts_skips() {
        crate::init_test_tracing();
        let payload = r#"{ "features": [
            { "geometry": { "type": "Polygon", "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]
            ]}},
            { "geometry": { "type": "MultiPolygon", "coordinates": [
                [[[20, 20], [21, 20]]],
                [[[-30, -10], [-20, -10], [-25, -5], [-30, -10]]]
            ]}}
        ]}"#;
        let ds = LandDataset::from_geojson_str(payload).expect("dataset");
        let meshes = LandMeshes::build(&ds, &MapStyle::default());

        assert_eq!(meshes.rings_drawn, 2);
        assert_eq!(meshes.rings_skipped, 1);
        assert_eq!(meshes.rings_unfilled, 0);
        assert_eq!(meshes.fill_triangles.len(), 6 + 3);
        assert_eq!(meshes.shadow_triangles.len(), meshes.fill_triangles.len());
        // (5 - 1) + (4 - 1) segments, two vertices each.
        assert_eq!(meshes.outline_segments.len(), 2 * (4 + 3));
        assert_eq!(meshes.extent, Some(Aabb2::new([-30.0, -10.0], [10.0, 10.0])));
    }

    #[test]
    fn empty_dataset_builds_empty_meshes() {
        let meshes = LandMeshes::build(&LandDataset::default(), &MapStyle::default());
        assert_eq!(meshes, LandMeshes::default());
    }
}

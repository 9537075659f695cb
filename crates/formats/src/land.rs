//! Lenient reader for the static land dataset.
//!
//! The input is GeoJSON-shaped (`{ features: [{ geometry: { type, coordinates } }] }`)
//! but is never trusted: anything below the top level that does not look
//! like a `Polygon` or `MultiPolygon` is dropped at the smallest granularity
//! and counted in a [`SkipReport`]. Only a payload that is not JSON at all,
//! or that has no `features` array, is rejected outright.

use foundation::math::LonLat;
use serde_json::Value;

/// Ordered ring positions as they appeared in the payload.
///
/// `None` marks an entry that was not a pair of finite numbers. Such entries
/// are kept so geometry building can skip them per point instead of losing
/// the whole ring.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ring {
    pub points: Vec<Option<LonLat>>,
}

impl Ring {
    pub fn new(points: Vec<Option<LonLat>>) -> Self {
        Self { points }
    }

    pub fn from_lon_lat(points: &[(f64, f64)]) -> Self {
        Self {
            points: points
                .iter()
                .map(|&(lon, lat)| Some(LonLat::new(lon, lat)))
                .collect(),
        }
    }

    pub fn valid_points(&self) -> impl Iterator<Item = LonLat> + '_ {
        self.points.iter().flatten().copied()
    }

    pub fn valid_len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }
}

/// Outer ring followed by zero or more holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RingSet {
    pub rings: Vec<Ring>,
}

impl RingSet {
    pub fn outer(&self) -> Option<&Ring> {
        self.rings.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LandGeometry {
    Polygon(RingSet),
    MultiPolygon(Vec<RingSet>),
}

impl LandGeometry {
    pub fn ring_sets(&self) -> &[RingSet] {
        match self {
            LandGeometry::Polygon(set) => std::slice::from_ref(set),
            LandGeometry::MultiPolygon(sets) => sets,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub geometry: LandGeometry,
}

/// Counts of input entries dropped while reading.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SkipReport {
    pub features: usize,
    pub ring_sets: usize,
    pub rings: usize,
    pub points: usize,
}

impl SkipReport {
    pub fn is_clean(&self) -> bool {
        *self == SkipReport::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandDataset {
    pub features: Vec<Feature>,
    pub skipped: SkipReport,
}

#[derive(Debug)]
pub enum LandDatasetError {
    Json(String),
    MissingFeatures,
}

impl std::fmt::Display for LandDatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandDatasetError::Json(msg) => write!(f, "land dataset is not valid JSON: {msg}"),
            LandDatasetError::MissingFeatures => {
                write!(f, "land dataset has no `features` array")
            }
        }
    }
}

impl std::error::Error for LandDatasetError {}

impl LandDataset {
    pub fn from_geojson_str(payload: &str) -> Result<Self, LandDatasetError> {
        let value: Value = serde_json::from_str(payload).map_err(|e| {
            tracing::warn!(error = %e, "land dataset is not JSON");
            LandDatasetError::Json(e.to_string())
        })?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, LandDatasetError> {
        let features_val = value
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                tracing::warn!("land dataset has no features array");
                LandDatasetError::MissingFeatures
            })?;

        let mut skipped = SkipReport::default();
        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            match parse_feature(feat_val, &mut skipped) {
                Ok(feature) => features.push(feature),
                Err(reason) => {
                    tracing::debug!(index, reason, "skipping land feature");
                    skipped.features += 1;
                }
            }
        }

        if !skipped.is_clean() {
            tracing::debug!(?skipped, kept = features.len(), "land dataset read with skips");
        }
        Ok(Self { features, skipped })
    }

    /// Outer ring of every ring-set, in dataset order.
    pub fn outer_rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.features
            .iter()
            .flat_map(|f| f.geometry.ring_sets())
            .filter_map(RingSet::outer)
    }
}

fn parse_feature(value: &Value, skipped: &mut SkipReport) -> Result<Feature, &'static str> {
    let obj = value.as_object().ok_or("feature must be an object")?;
    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let geom = obj
        .get("geometry")
        .and_then(|v| v.as_object())
        .ok_or("feature missing geometry")?;
    let coords = geom
        .get("coordinates")
        .and_then(|v| v.as_array())
        .ok_or("geometry missing coordinates")?;

    let geometry = match geom.get("type").and_then(|v| v.as_str()) {
        Some("Polygon") => match parse_ring_set(coords, skipped) {
            Some(set) => LandGeometry::Polygon(set),
            None => {
                skipped.ring_sets += 1;
                return Err("polygon has no rings");
            }
        },
        Some("MultiPolygon") => {
            let mut sets = Vec::with_capacity(coords.len());
            for poly in coords {
                match poly.as_array().and_then(|rings| parse_ring_set(rings, skipped)) {
                    Some(set) => sets.push(set),
                    None => skipped.ring_sets += 1,
                }
            }
            if sets.is_empty() {
                return Err("multipolygon has no usable polygons");
            }
            LandGeometry::MultiPolygon(sets)
        }
        Some(_) => return Err("unsupported geometry type"),
        None => return Err("geometry missing type"),
    };

    Ok(Feature { id, geometry })
}

/// `None` when no entry is a ring array; the caller counts the dropped set.
fn parse_ring_set(rings: &[Value], skipped: &mut SkipReport) -> Option<RingSet> {
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        match ring.as_array() {
            Some(points) => out.push(parse_ring(points, skipped)),
            None => skipped.rings += 1,
        }
    }
    (!out.is_empty()).then_some(RingSet { rings: out })
}

fn parse_ring(points: &[Value], skipped: &mut SkipReport) -> Ring {
    let points = points
        .iter()
        .map(|p| {
            let parsed = parse_position(p);
            if parsed.is_none() {
                skipped.points += 1;
            }
            parsed
        })
        .collect();
    Ring { points }
}

/// `[lon, lat, ...]` with finite numbers; extra components are ignored.
fn parse_position(value: &Value) -> Option<LonLat> {
    let arr = value.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let lon = arr[0].as_f64()?;
    let lat = arr[1].as_f64()?;
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    Some(LonLat::new(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::{LandDataset, LandDatasetError, LandGeometry, Ring, SkipReport};
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reads_polygon_and_multipolygon() {
        let value = json!({
            "features": [
                { "geometry": { "type": "Polygon", "coordinates": [
                    [[0, 0], [10, 0], [10, 10], [0, 0]],
                    [[2, 2], [3, 2], [3, 3], [2, 2]]
                ]}},
                { "id": 7, "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[20, 20], [30, 20], [30, 30]]],
                    [[[40, 40], [50, 40], [50, 50]]]
                ]}}
            ]
        });
        let ds = LandDataset::from_geojson_value(&value).expect("dataset");
        assert_eq!(ds.features.len(), 2);
        assert!(ds.skipped.is_clean());
        assert!(matches!(ds.features[0].geometry, LandGeometry::Polygon(_)));
        assert_eq!(ds.features[1].id.as_deref(), Some("7"));

        // Holes are carried but only outer rings are exposed for drawing.
        let outers: Vec<&Ring> = ds.outer_rings().collect();
        assert_eq!(outers.len(), 3);
        assert_eq!(outers[0].valid_len(), 4);
        assert_eq!(outers[2].points[0], Some(LonLat::new(40.0, 40.0)));
    }

    #[test]
    fn malformed_points_are_kept_as_holes_in_the_ring() {
        let value = json!({
            "features": [
                { "geometry": { "type": "Polygon", "coordinates": [
                    [[0, 0], [5], "x", [10, 0], [null, 1], [10, 10, 99]]
                ]}}
            ]
        });
        let ds = LandDataset::from_geojson_value(&value).expect("dataset");
        let ring = ds.outer_rings().next().expect("ring");
        assert_eq!(ring.points.len(), 6);
        assert_eq!(ring.valid_len(), 3);
        assert_eq!(ring.points[1], None);
        assert_eq!(ring.points[5], Some(LonLat::new(10.0, 10.0)));
        assert_eq!(ds.skipped.points, 3);
    }

    #[test]
    fn unusable_features_are_skipped_not_fatal() {
        let value = json!({
            "features": [
                42,
                { "geometry": null },
                { "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                { "geometry": { "coordinates": [] } },
                { "geometry": { "type": "Polygon", "coordinates": "nope" } },
                { "geometry": { "type": "MultiPolygon", "coordinates": [
                    "bad-set",
                    [],
                    ["bad-ring", [[0, 0], [1, 0], [1, 1]]]
                ]}},
                { "geometry": { "type": "Polygon", "coordinates": [] } },
                { "geometry": { "type": "MultiPolygon", "coordinates": [[]] } },
                { "geometry": { "type": "Polygon", "coordinates": ["only-bad-ring"] } }
            ]
        });
        let ds = LandDataset::from_geojson_value(&value).expect("dataset");
        assert_eq!(ds.features.len(), 1);
        assert_eq!(
            ds.skipped,
            SkipReport {
                features: 8,
                ring_sets: 5,
                rings: 2,
                points: 0,
            }
        );
        assert!(!ds.skipped.is_clean());
        assert_eq!(ds.outer_rings().count(), 1);
    }

    #[test]
    fn rejects_payload_without_features() {
        assert!(matches!(
            LandDataset::from_geojson_str("{\"type\":\"FeatureCollection\"}"),
            Err(LandDatasetError::MissingFeatures)
        ));
        assert!(matches!(
            LandDataset::from_geojson_str("not json"),
            Err(LandDatasetError::Json(_))
        ));
    }

    #[test]
    fn non_finite_numbers_are_invalid_points() {
        // serde_json cannot encode NaN, so exercise the position check directly.
        assert_eq!(super::parse_position(&json!([1.5, 2.5])), Some(LonLat::new(1.5, 2.5)));
        assert_eq!(super::parse_position(&json!([1.5])), None);
        assert_eq!(super::parse_position(&json!({"lon": 1})), None);
    }
}

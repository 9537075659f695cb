use super::Vec2;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

/// Maps a geographic position onto the map plane.
///
/// This is an identity map: longitude becomes `x` and latitude becomes `y`,
/// both still in degrees. No equirectangular scaling or other cartographic
/// projection is applied, so the world spans `[-180, 180] x [-90, 90]` in
/// plane units.
pub fn project_lon_lat(p: LonLat) -> Vec2 {
    Vec2::new(p.lon_deg, p.lat_deg)
}

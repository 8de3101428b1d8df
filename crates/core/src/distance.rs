//! Great-circle distance between two WGS-84 positions.
//!
//! Every component that needs a distance (stop distribution, UZI stop
//! counting, the event lookup endpoint) goes through [`distance_m`], so the
//! Earth model is the same everywhere: a sphere with the IUGG mean radius.

use geo::{Distance, Haversine, Point};

use crate::types::GeoPoint;

/// Mean Earth radius (meters) used by the haversine formula.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Longest possible great-circle distance on the sphere (meters).
pub const HALF_CIRCUMFERENCE_M: f64 = std::f64::consts::PI * MEAN_EARTH_RADIUS_M;

/// Meters per degree of latitude along a meridian.
pub const METERS_PER_DEGREE: f64 = MEAN_EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Great-circle distance between `a` and `b` in meters.
///
/// Identical points give `0.0`. Rounding in the haversine term can push
/// near-antipodal pairs outside the domain of `asin`; those resolve to half
/// the circumference instead of `NaN`.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d = Haversine::distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat));
    if d.is_nan() {
        HALF_CIRCUMFERENCE_M
    } else {
        d
    }
}

/// Same as [`distance_m`], in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_m(a, b) / 1000.0
}

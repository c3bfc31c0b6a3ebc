//! Great-circle distance on a spherical-Earth approximation.
//!
//! Every proximity comparison in the crate goes through [`distance_miles`]; the
//! R-tree in the station catalog only enumerates candidates and never ranks by
//! its own metric.

use serde::{Deserialize, Serialize};

/// Spherical-Earth radius used by the haversine formula, in kilometers.
const EARTH_RADIUS_KM: f64 = 6367.0;
/// Statute miles per kilometer.
const MILES_PER_KM: f64 = 0.621371;

/// A geographical coordinate: latitude first, longitude second, both in
/// decimal degrees.
///
/// # Examples
///
/// ```
/// use noaahist::LatLon;
///
/// let sf = LatLon(37.7749, -122.4194);
/// assert_eq!(sf.0, 37.7749); // Latitude
/// assert_eq!(sf.1, -122.4194); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

/// Great-circle distance between two coordinates in statute miles.
///
/// Haversine formula on a 6367 km sphere, converted at 0.621371 mi/km.
/// Pure and deterministic.
pub fn distance_miles(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let km = 2.0 * h.sqrt().asin() * EARTH_RADIUS_KM;
    km * MILES_PER_KM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_for_identical_points() {
        let p = LatLon(38.9, -77.0);
        assert_eq!(distance_miles(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = LatLon(37.7749, -122.4194);
        let b = LatLon(34.0522, -118.2437);
        let ab = distance_miles(a, b);
        let ba = distance_miles(b, a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn san_francisco_to_los_angeles() {
        let sf = LatLon(37.7749, -122.4194);
        let la = LatLon(34.0522, -118.2437);
        let miles = distance_miles(sf, la);
        // Roughly 347 statute miles on this sphere.
        assert!((345.0..350.0).contains(&miles), "got {miles}");
    }

    #[test]
    fn crosses_the_antimeridian() {
        let west = LatLon(0.0, 179.5);
        let east = LatLon(0.0, -179.5);
        let miles = distance_miles(west, east);
        // One degree of longitude at the equator, not 359 degrees.
        assert!(miles < 80.0, "got {miles}");
    }
}

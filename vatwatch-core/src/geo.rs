//! Great-circle distance.

use crate::types::LatLon;

pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Great-circle distance in nautical miles (haversine). Inputs in degrees.
pub fn great_circle_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_NM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Distance between two points in nautical miles.
pub fn distance_nm(from: LatLon, to: LatLon) -> f64 {
    great_circle_nm(from.lat, from.lon, to.lat, to.lon)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_zero() {
        for (lat, lon) in [(0.0, 0.0), (51.47, -0.45), (-33.94, 151.17), (89.9, 179.9)] {
            assert_eq!(great_circle_nm(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let ab = great_circle_nm(51.47, -0.45, 40.64, -73.78);
        let ba = great_circle_nm(40.64, -73.78, 51.47, -0.45);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree along a meridian is 60 nm on this sphere (give or take).
        let d = great_circle_nm(0.0, 0.0, 1.0, 0.0);
        assert!((d - 60.04).abs() < 0.05, "got {d}");
    }

    #[test]
    fn test_london_new_york() {
        let d = great_circle_nm(51.47, -0.45, 40.64, -73.78);
        assert!((2990.0..3000.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_antipodal_finite() {
        let d = great_circle_nm(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_NM).abs() < 1e-6);
    }

    #[test]
    fn test_distance_nm_latlon() {
        let a = LatLon { lat: 33.94, lon: -118.41 };
        let b = LatLon { lat: 37.62, lon: -122.38 };
        assert!((distance_nm(a, b) - great_circle_nm(33.94, -118.41, 37.62, -122.38)).abs() < 1e-12);
    }
}

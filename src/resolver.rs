//! Nearest-point resolution over reference coordinates.
//!
//! Every reverse lookup in the crate funnels through [`nearest`]: an
//! exhaustive haversine scan of the full candidate set. This is intentionally
//! O(n) per query with no spatial index; the Gazetteer tables top out in the
//! tens of thousands of rows, where a plain scan is exact and fast enough.

use crate::error::{Error, Result};
use crate::models::{GeoPoint, Resolved};

/// Mean Earth radius in miles.
const EARTH_RADIUS_MI: f64 = 3958.76;

/// Great-circle distance between two points, in miles.
pub fn haversine_mi(a: GeoPoint, b: GeoPoint) -> f64 {
    let half_dlat = ((b.lat - a.lat).to_radians() / 2.0).sin();
    let half_dlon = ((b.lon - a.lon).to_radians() / 2.0).sin();
    let h = half_dlat * half_dlat
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * half_dlon * half_dlon;
    2.0 * EARTH_RADIUS_MI * h.sqrt().min(1.0).asin()
}

/// Find the candidate nearest to `query`.
///
/// Scans every candidate exactly once and returns the key achieving the
/// minimum great-circle distance. On an exact tie the first candidate
/// encountered wins; when iterating a hash map that order is arbitrary, so
/// any one of the tied keys may come back.
///
/// # Errors
///
/// Returns [`Error::EmptyCandidateSet`] if `candidates` yields nothing.
pub fn nearest<K, I>(query: GeoPoint, candidates: I) -> Result<Resolved<K>>
where
    I: IntoIterator<Item = (K, GeoPoint)>,
{
    let mut best: Option<Resolved<K>> = None;
    for (key, location) in candidates {
        let distance_mi = haversine_mi(query, location);
        match &best {
            Some(b) if b.distance_mi <= distance_mi => {}
            _ => best = Some(Resolved { key, distance_mi }),
        }
    }
    best.ok_or(Error::EmptyCandidateSet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = GeoPoint::new(42.852, -73.786);
        assert!(haversine_mi(p, p).abs() < 1e-9);
    }

    #[test]
    fn known_city_pair_distance() {
        // JFK to LAX is roughly 2,475 miles
        let jfk = GeoPoint::new(40.6413, -73.7781);
        let lax = GeoPoint::new(33.9416, -118.4085);
        let d = haversine_mi(jfk, lax);
        assert!((d - 2475.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(32.246, -110.948);
        let b = GeoPoint::new(37.406, -122.078);
        assert!((haversine_mi(a, b) - haversine_mi(b, a)).abs() < 1e-9);
    }

    #[test]
    fn nearest_picks_minimum() {
        let candidates = vec![
            (10001u32, GeoPoint::new(40.751, -73.997)),
            (85719, GeoPoint::new(32.246, -110.948)),
            (94043, GeoPoint::new(37.406, -122.078)),
        ];
        let hit = nearest(GeoPoint::new(32.3, -111.0), candidates).unwrap();
        assert_eq!(hit.key, 85719);
        assert!(hit.distance_mi < 10.0);
    }

    #[test]
    fn nearest_returns_own_coordinate_at_zero() {
        let candidates = vec![
            (12065u32, GeoPoint::new(42.852, -73.786)),
            (10001, GeoPoint::new(40.751, -73.997)),
        ];
        let hit = nearest(GeoPoint::new(42.852, -73.786), candidates).unwrap();
        assert_eq!(hit.key, 12065);
        assert!(hit.distance_mi < 1e-6);
    }

    #[test]
    fn empty_candidate_set_is_an_error() {
        let none: Vec<(u32, GeoPoint)> = Vec::new();
        assert!(matches!(
            nearest(GeoPoint::new(0.0, 0.0), none),
            Err(Error::EmptyCandidateSet)
        ));
    }
}

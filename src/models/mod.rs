//! Record types shared by the store, resolver, and lookup facade.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Geographic point (lat/lon, decimal degrees, WGS-84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Attributes of a ZIP Code Tabulation Area, keyed by its ZIP code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipRecord {
    pub zip: u32,
    pub population: u64,
    pub housing_units: u64,
    /// Land area in square miles
    pub land_mi2: f64,
    /// Water area in square miles
    pub water_mi2: f64,
    /// Internal point of the tabulation area
    pub location: GeoPoint,
}

/// Lowercased (state, city) key with the trailing descriptor word of the
/// place name ("city", "town", "CDP", ...) stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CityKey {
    /// Two-letter state abbreviation, lowercased
    pub state: String,
    /// Place name, lowercased, descriptor stripped
    pub city: String,
}

impl CityKey {
    /// Build a key from raw input, applying the same normalization used
    /// when the reference store was loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedKey`] if either part is blank.
    pub fn normalize(state: &str, city: &str) -> Result<Self> {
        let state = normalize_state(state);
        let city = normalize_city(city);
        if state.is_empty() || city.is_empty() {
            return Err(Error::MalformedKey(format!("state={state:?} city={city:?}")));
        }
        Ok(Self { state, city })
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state)
    }
}

/// Attributes of a place, keyed by [`CityKey`]. Same shape as [`ZipRecord`];
/// several ZIP codes may resolve to one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRecord {
    pub key: CityKey,
    pub population: u64,
    pub housing_units: u64,
    /// Land area in square miles
    pub land_mi2: f64,
    /// Water area in square miles
    pub water_mi2: f64,
    /// Internal point of the place
    pub location: GeoPoint,
}

/// Output of nearest-point resolution: the winning key and its great-circle
/// distance from the query, in miles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved<K> {
    pub key: K,
    pub distance_mi: f64,
}

/// Place-name descriptors the Gazetteer appends to the `NAME` column.
const DESCRIPTORS: &[&str] = &[
    "city",
    "town",
    "village",
    "borough",
    "cdp",
    "municipality",
    "comunidad",
];

/// Lowercase a state abbreviation.
pub fn normalize_state(state: &str) -> String {
    state.trim().to_lowercase()
}

/// Lowercase a place name and strip its trailing descriptor token.
///
/// Applied identically when loading the reference store and when normalizing
/// a query, so the two sides cannot drift apart. Only tokens from the known
/// descriptor set are stripped; "clifton park" stays whole, "Clifton Park
/// town" becomes "clifton park". Names whose last word is itself a
/// descriptor ("garden city") lose it, so callers should pass the bare name.
pub fn normalize_city(city: &str) -> String {
    let lower = city.trim().to_lowercase();
    match lower.rsplit_once(char::is_whitespace) {
        Some((head, tail)) if DESCRIPTORS.contains(&tail) => head.trim_end().to_string(),
        _ => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_descriptor_is_stripped() {
        assert_eq!(normalize_city("Clifton Park town"), "clifton park");
        assert_eq!(normalize_city("Tucson city"), "tucson");
        assert_eq!(normalize_city("Whetstone CDP"), "whetstone");
    }

    #[test]
    fn bare_names_pass_through() {
        assert_eq!(normalize_city("boston"), "boston");
        assert_eq!(normalize_city("Los Angeles"), "los angeles");
        // "park" is not a descriptor
        assert_eq!(normalize_city("clifton park"), "clifton park");
    }

    #[test]
    fn normalization_is_idempotent_for_descriptor_names() {
        let once = normalize_city("Mountain View city");
        assert_eq!(normalize_city(&once), once);
    }

    #[test]
    fn blank_key_parts_are_rejected() {
        assert!(CityKey::normalize("", "boston").is_err());
        assert!(CityKey::normalize("ma", "  ").is_err());
        let key = CityKey::normalize("MA", "Boston").unwrap();
        assert_eq!(key.state, "ma");
        assert_eq!(key.city, "boston");
    }
}

//! Shared fixtures and geocoder doubles for unit tests.

use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::geocode::Geocoder;
use crate::lookup::GeoLookup;
use crate::models::{CityKey, CityRecord, GeoPoint, ZipRecord};
use crate::store::ReferenceStore;

pub fn zip_record(zip: u32, lat: f64, lon: f64) -> ZipRecord {
    ZipRecord {
        zip,
        population: 1000,
        housing_units: 400,
        land_mi2: 10.0,
        water_mi2: 0.5,
        location: GeoPoint::new(lat, lon),
    }
}

pub fn city_record(state: &str, city: &str, lat: f64, lon: f64) -> CityRecord {
    CityRecord {
        key: CityKey {
            state: state.into(),
            city: city.into(),
        },
        population: 50_000,
        housing_units: 20_000,
        land_mi2: 25.0,
        water_mi2: 1.0,
        location: GeoPoint::new(lat, lon),
    }
}

/// A handful of real ZIPs and places, each ZIP within a few miles of its
/// city's internal point.
pub fn fixture_store() -> ReferenceStore {
    ReferenceStore::from_records(
        vec![
            zip_record(12065, 42.852, -73.786),  // Clifton Park NY
            zip_record(85719, 32.246, -110.948), // Tucson AZ
            zip_record(94043, 37.406, -122.078), // Mountain View CA
            zip_record(10001, 40.751, -73.997),  // New York NY
            zip_record(2108, 42.357, -71.065),   // Boston MA
            zip_record(90001, 33.974, -118.249), // Los Angeles CA
        ],
        vec![
            city_record("ny", "clifton park", 42.862, -73.765),
            city_record("az", "tucson", 32.222, -110.975),
            city_record("ca", "mountain view", 37.386, -122.084),
            city_record("ny", "new york", 40.713, -74.006),
            city_record("ma", "boston", 42.360, -71.059),
            city_record("ca", "los angeles", 34.054, -118.243),
        ],
    )
}

/// Geocoder double answering from a fixed query table.
pub struct StaticGeocoder(HashMap<String, GeoPoint>);

impl StaticGeocoder {
    /// Double that always answers "no match".
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn with_queries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, GeoPoint)>,
    {
        Self(
            entries
                .into_iter()
                .map(|(q, p)| (q.to_string(), p))
                .collect(),
        )
    }

    /// Knows the out-of-store ZIPs used by the batch examples: 1234 lands in
    /// Connecticut (~31 mi from ZIP 10001, ~33 mi from New York's internal
    /// point), 90200 just south of Los Angeles (~2 mi from ZIP 90001).
    pub fn batch_fixture() -> Self {
        Self::with_queries([
            ("1234 USA", GeoPoint::new(41.0, -73.5)),
            ("90200 USA", GeoPoint::new(33.95, -118.22)),
        ])
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeoPoint>> {
        Ok(self.0.get(query).copied())
    }
}

/// Geocoder double that always errors, as an unreachable service would.
pub struct FailingGeocoder;

impl Geocoder for FailingGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeoPoint>> {
        Err(Error::GeocodeFailure {
            query: query.to_string(),
        })
    }
}

pub fn offline_lookup() -> GeoLookup {
    GeoLookup::new(fixture_store(), Box::new(FailingGeocoder))
}

pub fn online_lookup() -> GeoLookup {
    GeoLookup::new(fixture_store(), Box::new(StaticGeocoder::batch_fixture()))
}

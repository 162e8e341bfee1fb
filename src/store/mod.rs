//! Immutable reference tables keyed by ZIP code and by (state, city).

mod load;

use std::path::Path;

use hashbrown::HashMap;

use crate::error::Result;
use crate::models::{CityKey, CityRecord, GeoPoint, ZipRecord};

/// Census Gazetteer reference data, read-only after construction.
pub struct ReferenceStore {
    zips: HashMap<u32, ZipRecord>,
    cities: HashMap<CityKey, CityRecord>,
}

impl ReferenceStore {
    /// Load both tables from Gazetteer TSV files (plain or gzipped).
    ///
    /// # Errors
    ///
    /// Fails if either file is unreadable or is missing a required column.
    pub fn load<P: AsRef<Path>>(zip_path: P, city_path: P) -> Result<Self> {
        Ok(Self {
            zips: load::load_zips(zip_path.as_ref())?,
            cities: load::load_cities(city_path.as_ref())?,
        })
    }

    /// Build a store from already-constructed records. City keys are
    /// expected to be pre-normalized.
    pub fn from_records<Z, C>(zips: Z, cities: C) -> Self
    where
        Z: IntoIterator<Item = ZipRecord>,
        C: IntoIterator<Item = CityRecord>,
    {
        Self {
            zips: zips.into_iter().map(|r| (r.zip, r)).collect(),
            cities: cities.into_iter().map(|r| (r.key.clone(), r)).collect(),
        }
    }

    pub fn zip(&self, zip: u32) -> Option<&ZipRecord> {
        self.zips.get(&zip)
    }

    pub fn city(&self, key: &CityKey) -> Option<&CityRecord> {
        self.cities.get(key)
    }

    /// Candidate set for coordinate-to-ZIP resolution.
    pub fn zip_locations(&self) -> impl Iterator<Item = (u32, GeoPoint)> + '_ {
        self.zips.values().map(|r| (r.zip, r.location))
    }

    /// Candidate set for coordinate-to-city resolution.
    pub fn city_locations(&self) -> impl Iterator<Item = (&CityKey, GeoPoint)> + '_ {
        self.cities.values().map(|r| (&r.key, r.location))
    }

    pub fn zip_count(&self) -> usize {
        self.zips.len()
    }

    pub fn city_count(&self) -> usize {
        self.cities.len()
    }
}

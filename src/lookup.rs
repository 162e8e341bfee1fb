//! Lookup facade composing the reference store, the nearest-point resolver,
//! and the remote geocoder fallback.
//!
//! All four lookup directions share one policy: the local table answers
//! first, and only key-based lookups (ZIP or state/city) may fall back to
//! the remote geocoder. Reverse lookups always resolve through the full
//! candidate table; there is no remote equivalent for them.

use tracing::info;

use crate::error::{Error, Result};
use crate::geocode::Geocoder;
use crate::models::{CityKey, CityRecord, GeoPoint, Resolved, ZipRecord};
use crate::resolver;
use crate::store::ReferenceStore;

pub struct GeoLookup {
    store: ReferenceStore,
    geocoder: Box<dyn Geocoder>,
}

impl GeoLookup {
    pub fn new(store: ReferenceStore, geocoder: Box<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    /// Coordinate for a ZIP code.
    ///
    /// Local table first; with `use_online`, a miss falls back to geocoding
    /// `"<zip> USA"`. The fallback bypasses the resolver entirely, so no
    /// distance is produced on this path.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] on a local miss with `use_online` off;
    /// [`Error::GeocodeFailure`] when the fallback finds no match.
    pub fn zip_to_coord(&self, zip: u32, use_online: bool) -> Result<GeoPoint> {
        if let Some(record) = self.store.zip(zip) {
            return Ok(record.location);
        }
        if !use_online {
            return Err(Error::NotFound);
        }
        info!("using online lookup for zip {}", zip);
        let query = format!("{zip} USA");
        self.geocoder
            .geocode(&query)?
            .ok_or(Error::GeocodeFailure { query })
    }

    /// Full record for a ZIP code. Never goes online.
    pub fn zip_info(&self, zip: u32) -> Result<&ZipRecord> {
        self.store.zip(zip).ok_or(Error::NotFound)
    }

    /// Coordinate for a place, keyed by normalized (state, city).
    ///
    /// Same fallback policy as [`Self::zip_to_coord`], with the online query
    /// `"<city>, <state> USA"`.
    pub fn state_city_to_coord(
        &self,
        state: &str,
        city: &str,
        use_online: bool,
    ) -> Result<GeoPoint> {
        let key = CityKey::normalize(state, city)?;
        if let Some(record) = self.store.city(&key) {
            return Ok(record.location);
        }
        if !use_online {
            return Err(Error::NotFound);
        }
        info!("using online lookup for {}", key);
        let query = format!("{}, {} USA", key.city, key.state);
        self.geocoder
            .geocode(&query)?
            .ok_or(Error::GeocodeFailure { query })
    }

    /// Full record for a place. Never goes online.
    pub fn state_city_info(&self, state: &str, city: &str) -> Result<&CityRecord> {
        let key = CityKey::normalize(state, city)?;
        self.store.city(&key).ok_or(Error::NotFound)
    }

    /// Nearest known ZIP to a coordinate, with its distance in miles.
    pub fn coord_to_zip(&self, lat: f64, lon: f64) -> Result<Resolved<u32>> {
        resolver::nearest(GeoPoint::new(lat, lon), self.store.zip_locations())
    }

    /// Nearest known place to a coordinate, with its distance in miles.
    pub fn coord_to_state_city(&self, lat: f64, lon: f64) -> Result<Resolved<CityKey>> {
        let hit = resolver::nearest(GeoPoint::new(lat, lon), self.store.city_locations())?;
        Ok(Resolved {
            key: hit.key.clone(),
            distance_mi: hit.distance_mi,
        })
    }

    /// Place nearest to a ZIP's coordinate.
    ///
    /// The distance measures how far the resolved coordinate (from the local
    /// record or the online fallback) sits from the winning place's internal
    /// point; it is not a containment guarantee.
    pub fn zip_to_state_city(&self, zip: u32, use_online: bool) -> Result<Resolved<CityKey>> {
        let location = self.zip_to_coord(zip, use_online)?;
        self.coord_to_state_city(location.lat, location.lon)
    }

    /// ZIP nearest to a place's coordinate. Same distance caveat as
    /// [`Self::zip_to_state_city`].
    pub fn state_city_to_zip(
        &self,
        state: &str,
        city: &str,
        use_online: bool,
    ) -> Result<Resolved<u32>> {
        let location = self.state_city_to_coord(state, city, use_online)?;
        self.coord_to_zip(location.lat, location.lon)
    }
}

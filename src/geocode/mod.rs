//! Remote geocoding capability.
//!
//! The lookup facade depends only on the [`Geocoder`] trait; the bundled
//! implementation talks to a Nominatim endpoint over blocking HTTP. Tests
//! substitute in-memory doubles.

mod nominatim;

pub use nominatim::NominatimGeocoder;

use crate::error::Result;
use crate::models::GeoPoint;

/// A remote service turning a free-form query into a coordinate.
///
/// `Ok(None)` means the service answered but found no match; transport and
/// parse failures surface as [`crate::Error::GeocodeFailure`].
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeoPoint>>;
}

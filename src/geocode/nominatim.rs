//! Nominatim search client (blocking).
//!
//! Free-form search against a Nominatim endpoint, restricted to US results.
//! The public instance rate-limits to one request per second; callers doing
//! batch work with online fallback are expected to point this at their own
//! instance or accept the pace.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::warn;
use url::Url;

use super::Geocoder;
use crate::error::{Error, Result};
use crate::models::GeoPoint;

const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_USER_AGENT: &str = "usgeo/0.1 (gazetteer fallback)";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
}

impl NominatimGeocoder {
    /// Client against the public endpoint with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Client against a custom endpoint (e.g. a self-hosted instance).
    pub fn with_config(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeoPoint>> {
        let fail = || Error::GeocodeFailure {
            query: query.to_string(),
        };

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", query),
                ("countrycodes", "us"),
                ("format", "jsonv2"),
                ("limit", "1"),
            ])
            .send()
            .map_err(|e| {
                warn!("Nominatim request failed: {}", e);
                fail()
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Nominatim rate limit hit");
            return Err(fail());
        }
        if !response.status().is_success() {
            warn!("Nominatim returned {}", response.status());
            return Err(fail());
        }

        let body: serde_json::Value = response.json().map_err(|e| {
            warn!("Failed to parse Nominatim response: {}", e);
            fail()
        })?;

        Ok(parse_response(&body))
    }
}

/// First result's coordinate, if any.
fn parse_response(body: &serde_json::Value) -> Option<GeoPoint> {
    let first = body.as_array()?.first()?;
    let lat = first["lat"].as_str()?.parse().ok()?;
    let lon = first["lon"].as_str()?.parse().ok()?;
    Some(GeoPoint::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let body = serde_json::json!([{
            "lat": "42.8520",
            "lon": "-73.7860",
            "display_name": "Clifton Park, Saratoga County, New York, USA"
        }]);
        let point = parse_response(&body).unwrap();
        assert!((point.lat - 42.852).abs() < 1e-4);
        assert!((point.lon - -73.786).abs() < 1e-4);
    }

    #[test]
    fn empty_result_set_is_no_match() {
        assert!(parse_response(&serde_json::json!([])).is_none());
    }

    #[test]
    fn non_numeric_coordinates_are_no_match() {
        let body = serde_json::json!([{ "lat": "not-a-number", "lon": "0" }]);
        assert!(parse_response(&body).is_none());
    }
}

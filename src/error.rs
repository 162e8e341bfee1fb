//! Crate-wide error type.

use thiserror::Error;

/// Errors from lookups, nearest-point resolution, and table operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Key absent from the reference store.
    #[error("not found in reference data")]
    NotFound,

    /// Remote geocoder found no match or errored.
    #[error("geocoding failed for query {query:?}")]
    GeocodeFailure {
        /// The query string sent to the geocoder.
        query: String,
    },

    /// Nearest-point resolution was asked to scan zero candidates.
    #[error("nearest-point resolution over an empty candidate set")]
    EmptyCandidateSet,

    /// Non-numeric ZIP or blank state/city.
    #[error("malformed key: {0:?}")]
    MalformedKey(String),

    /// Required column absent from a table.
    #[error("column {0:?} not found")]
    MissingColumn(String),

    /// Geocoder endpoint URL did not parse.
    #[error("invalid geocoder endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// HTTP client construction failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

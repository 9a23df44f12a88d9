//! Error types for upstream fetching and text parsing
//!
//! This module defines the leaf error types used by the parsers and the
//! upstream clients.

use thiserror::Error;

/// Errors that can occur while talking to an upstream data provider
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error (connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Build a fetch error from a reqwest error, separating out timeouts
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Upstream status code, when the failure was a status failure
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the same request might succeed later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }
}

/// Errors that can occur during parsing operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// No `<lat> <N|S> <lon> <E|W>` pattern in the location text
    #[error("No coordinate pattern found in '{0}'")]
    CoordinatesNotFound(String),

    /// Number could not be read as a float
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    /// Latitude outside [-90, 90]
    #[error("Latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180]
    #[error("Longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// Slug could not be derived from the name
    #[error("Cannot derive a slug from '{0}'")]
    EmptySlug(String),
}

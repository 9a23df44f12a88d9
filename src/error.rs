//! Unified error handling for the surfe-diem crate
//!
//! Domain errors live next to the code that raises them:
//!
//! - [`FetchError`] - upstream provider failures
//! - [`ParseError`] - coordinate, observation and slug parsing
//! - [`StoreError`] - persistence failures
//!
//! [`Error`] wraps all of them so that command-level code can use a single
//! result type while keeping the detailed cause.
//!
//! ```rust,ignore
//! use surfe_diem::error::{Error, ErrorCategory};
//!
//! fn report(err: &Error) {
//!     if err.category() == ErrorCategory::Network && err.is_recoverable() {
//!         tracing::warn!("Transient upstream failure: {}", err);
//!     }
//! }
//! ```

use thiserror::Error;

pub use crate::storage::StoreError;
pub use crate::utils::error::{FetchError, ParseError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Upstream HTTP failures (status, timeout, transport)
    Network,
    /// Parsing, data extraction and rendering errors
    Parsing,
    /// Database errors
    Storage,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
        }
    }
}

/// Unified error type for the surfe-diem crate
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the operation might succeed if retried later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Store(e) => e.is_recoverable(),
            Self::Parse(_) | Self::Json(_) => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Parse(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::Store(_) => ErrorCategory::Storage,
        }
    }
}

/// Result type alias using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

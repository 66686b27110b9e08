//! Error types for the region cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the region cache.
///
/// A cache miss is not an error: region lookups return `Ok(None)`.
/// `NotFound` only exists for surfaces (HTTP) that must turn a miss into a failure.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key or region not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Region configuration rejected at build time
    #[error("Invalid configuration for region '{region}': {reason}")]
    InvalidConfig { region: String, reason: String },

    /// Overflow directory could not be prepared
    #[error("Overflow location {path:?} unavailable: {source}")]
    OverflowLocation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to a region's overflow store failed
    #[error("Overflow write failed for region '{region}': {source}")]
    OverflowWrite {
        region: String,
        #[source]
        source: io::Error,
    },

    /// Reading from a region's overflow store failed
    #[error("Overflow read failed for region '{region}': {source}")]
    OverflowRead {
        region: String,
        #[source]
        source: io::Error,
    },

    /// The region manager has been shut down
    #[error("Cache manager is closed")]
    ManagerClosed,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Shorthand for an [`CacheError::InvalidConfig`] error.
    pub fn invalid_config(region: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            region: region.into(),
            reason: reason.into(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::ManagerClosed => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidConfig { .. }
            | CacheError::OverflowLocation { .. }
            | CacheError::OverflowWrite { .. }
            | CacheError::OverflowRead { .. }
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the region cache.
pub type Result<T> = std::result::Result<T, CacheError>;

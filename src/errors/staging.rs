//! Staging pipeline error types
//!
//! Every failure of the upload, transform and export operations is reported
//! as a [`StagingError`]. Handlers turn these into structured JSON bodies; none
//! of them is allowed to bring the process down.
//!
//! # Examples
//!
//! ```rust
//! use oms_import::errors::StagingError;
//!
//! let err = StagingError::NoStagedData("line targets".to_string());
//! assert!(err.is_not_found());
//! assert_eq!(err.error_code(), "NO_STAGED_DATA");
//! ```

use thiserror::Error;

use super::StoreError;

/// Staging pipeline errors
#[derive(Error, Debug)]
pub enum StagingError {
    /// Uploaded header does not match the active schema
    #[error(
        "Column mismatch: expected {} columns, received {}",
        expected.len(),
        received.len()
    )]
    SchemaMismatch {
        expected: Vec<String>,
        received: Vec<String>,
    },

    /// Nothing staged for the session, or it has expired
    #[error("No staged data available: {0}")]
    NoStagedData(String),

    /// Transform payload is missing required fields
    #[error("Malformed selection: {0}")]
    MalformedSelection(String),

    /// Session store could not be reached
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Upload could not be parsed as CSV
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while writing the export artifact
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagingError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StagingError::SchemaMismatch { .. }
                | StagingError::MalformedSelection(_)
                | StagingError::InvalidCsv(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, StagingError::NoStagedData(_))
    }

    /// Check if the session store is the culprit (503)
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StagingError::StoreUnavailable(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            StagingError::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            StagingError::NoStagedData(_) => "NO_STAGED_DATA",
            StagingError::MalformedSelection(_) => "MALFORMED_SELECTION",
            StagingError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            StagingError::InvalidCsv(_) => "INVALID_CSV",
            StagingError::Serialization(_) => "SERIALIZATION_ERROR",
            StagingError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<StoreError> for StagingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Payload(inner) => StagingError::Serialization(inner),
            other => StagingError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<csv::Error> for StagingError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => StagingError::Io(io),
                other => StagingError::InvalidCsv(format!("{:?}", other)),
            }
        } else {
            StagingError::InvalidCsv(err.to_string())
        }
    }
}

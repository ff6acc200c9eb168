//! Session store error types

use thiserror::Error;

/// Failures raised by a [`SessionStore`](crate::session::SessionStore) backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend could not be reached or rejected the operation
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// A staged payload could not be encoded or decoded
    #[error("Corrupt staged payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Database operation failed
    #[cfg(feature = "server")]
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl StoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "STORE_UNAVAILABLE",
            StoreError::Payload(_) => "CORRUPT_PAYLOAD",
            #[cfg(feature = "server")]
            StoreError::Database(_) => "STORE_UNAVAILABLE",
        }
    }
}

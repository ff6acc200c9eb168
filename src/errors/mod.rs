//! Domain-specific error types
//!
//! - **StagingError**: upload, transform and export failures reported to callers
//! - **StoreError**: session store backend failures

pub mod staging;
pub mod store;

pub use staging::StagingError;
pub use store::StoreError;

/// Result type alias for staging pipeline operations
pub type StagingResult<T> = Result<T, StagingError>;

/// Result type alias for session store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_result_alias() {
        let result: StagingResult<()> = Err(StagingError::MalformedSelection("empty".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_store_result_alias() {
        let result: StoreResult<()> = Err(StoreError::Unavailable("down".to_string()));
        assert!(result.is_err());
    }
}

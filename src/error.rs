//! Error types for the fetch-cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the fetch-cache layer.
///
/// Backing-store failures are carried verbatim in `Backend`; the cache layer
/// never retries or translates them (fail-fast, callers decide).
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store reported an operation failure
    #[error("backing store error: {0}")]
    Backend(String),

    /// A query specification could not be translated into a backing-store request
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A cache operation was given invalid input (e.g. oversized key)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A cached payload could not be encoded or decoded
    #[error("value encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the fetch-cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = CacheError::Backend("connection refused".to_string());
        assert_eq!(err.to_string(), "backing store error: connection refused");
    }

    #[test]
    fn test_encode_error_from_serde() {
        let bad = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: CacheError = bad.into();
        assert!(matches!(err, CacheError::Encode(_)));
    }
}

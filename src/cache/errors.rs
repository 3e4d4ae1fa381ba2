//! Cache error types

use thiserror::Error;

/// Errors raised by the cache store
///
/// Callers on the lookup and job paths treat every variant as "store
/// unavailable": reads become misses and writes are dropped.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Failed to connect to the cache backend
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    /// Stored value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    SerializationError(String),

    /// Operation exceeded the configured store timeout
    #[error("Cache operation timed out: {0}")]
    Timeout(String),

    /// Generic backend error
    #[error("Cache backend error: {0}")]
    BackendError(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::SerializationError(error.to_string())
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

//! Error types for the store crate.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key (or hash field) does not exist or has expired.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// The store could not be reached (connection, I/O or timeout).
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store answered with an error (e.g. wrong value type for the key).
    #[error("store error: {0}")]
    Backend(String),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,

    /// The store could not be built from its configuration.
    #[error("store configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    pub(crate) fn not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Whether the error means the key is absent (as opposed to a failure).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout()
            || err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
        {
            tracing::error!("Revocation store unreachable: {}", err);
            Self::StoreUnavailable(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

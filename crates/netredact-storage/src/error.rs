//! Storage error types.

use thiserror::Error;

/// Storage result type.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend could not be reached.
    #[error("backend connection error: {0}")]
    Connection(String),

    /// A backend command failed.
    #[error("backend command failed: {0}")]
    Backend(String),

    /// Mapping payload could not be (de)serialized.
    #[error("mapping serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StorageError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_io_error() || e.is_connection_dropped() {
            Self::Connection(e.to_string())
        } else {
            Self::Backend(e.to_string())
        }
    }
}

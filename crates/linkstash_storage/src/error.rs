//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in a key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// An underlying I/O error.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be parsed or serialized.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing file holds something other than a JSON object.
    #[error("storage file {path} is corrupt: expected a JSON object at the top level")]
    Corrupt {
        /// Path of the offending file.
        path: String,
    },
}

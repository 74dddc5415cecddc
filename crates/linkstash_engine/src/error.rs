//! Error types for sync operations.

use linkstash_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No credential is stored, or the stored credential is no longer
    /// accepted. An expired credential is erased before this is returned.
    #[error("not authenticated: {reason}")]
    Unauthenticated {
        /// Why authentication failed.
        reason: String,
    },

    /// Backend configuration failed validation; no sync was attempted.
    #[error("invalid sync configuration: {0}")]
    InvalidConfiguration(String),

    /// A sync round is already running (engine re-entry or held lock).
    #[error("sync already in progress")]
    SyncInProgress,

    /// The network is unreachable; nothing was sent.
    #[error("network unreachable")]
    Offline,

    /// The transport failed before a response was produced.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the body when present, else the status line.
        message: String,
    },

    /// The server's response body could not be parsed.
    #[error("malformed server response: {0}")]
    ResponseFormat(String),

    /// Local storage failed underneath the engine.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SyncError {
    /// Creates an `Unauthenticated` error.
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// Returns true for errors the caller should surface as "log in first".
    pub fn is_authentication(&self) -> bool {
        matches!(self, SyncError::Unauthenticated { .. })
    }

    /// Returns true for errors meaning "try again once the current round
    /// finishes".
    pub fn is_busy(&self) -> bool {
        matches!(self, SyncError::SyncInProgress)
    }
}

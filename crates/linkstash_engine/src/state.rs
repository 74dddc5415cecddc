//! Sync-version watermark.

use crate::error::SyncResult;
use linkstash_storage::KeyValueStore;
use serde_json::Value;
use std::sync::Arc;

/// Storage key holding the sync-version watermark.
pub const LAST_VERSION_KEY: &str = "sync:last_version";

/// The scalar marker of how far this client has synced.
///
/// Zero means "never synced" and forces the next round into full-resync
/// mode. On every successful round the watermark advances to the local
/// wall-clock time - it is never set from the server's returned counter,
/// which only steers batch chaining within a round.
pub struct Watermark {
    store: Arc<dyn KeyValueStore>,
}

impl Watermark {
    /// Creates a watermark persisting through the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the current watermark; 0 when never synced.
    pub fn load(&self) -> SyncResult<i64> {
        Ok(self
            .store
            .get(LAST_VERSION_KEY)?
            .and_then(|v| v.as_i64())
            .unwrap_or(0))
    }

    /// Advances the watermark to the given time.
    pub fn advance_to(&self, at: i64) -> SyncResult<()> {
        self.store.set(LAST_VERSION_KEY, Value::from(at))?;
        Ok(())
    }

    /// Resets the watermark to 0, forcing a full resync next round.
    pub fn reset(&self) -> SyncResult<()> {
        self.advance_to(0)
    }
}

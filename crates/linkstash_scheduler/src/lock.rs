//! The shared sync lock.

use linkstash_engine::{now_ms, BackendKind, SyncResult};
use linkstash_storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Storage key holding the lock state.
pub const LOCK_KEY: &str = "sync:lock";

/// Storage key holding the in-progress process descriptor.
pub const PROCESS_KEY: &str = "sync:process";

/// How long a held lock is honored before its holder is presumed dead.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockState {
    is_syncing: bool,
    last_sync_time: i64,
}

/// Whether a sync process is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    /// A round is in flight.
    Syncing,
    /// No round is in flight.
    Idle,
}

/// Persisted descriptor of the current (or last) sync process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProcess {
    /// Current status.
    pub status: ProcessStatus,
    /// When the process started, epoch milliseconds.
    pub start_time: i64,
    /// Which backend the process serves.
    pub service: String,
}

/// The globally exclusive sync slot, shared across both backends.
///
/// The lock is persisted so an interrupted process does not wedge sync
/// forever: a holder older than the staleness window is presumed dead and
/// the lock is forcibly reacquired.
pub struct SyncLockGuard {
    store: Arc<dyn KeyValueStore>,
    stale_after: Duration,
}

impl SyncLockGuard {
    /// Creates a lock guard with the default 5-minute staleness window.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    /// Overrides the staleness window.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Tries to acquire the slot for `backend`.
    ///
    /// Returns `false` when another round holds the lock and is not yet
    /// stale; the caller must report "sync in progress" without touching
    /// local state. A stale holder is overwritten.
    pub fn lock(&self, backend: BackendKind) -> SyncResult<bool> {
        let state = self.load()?;
        if state.is_syncing {
            let elapsed = now_ms().saturating_sub(state.last_sync_time);
            if elapsed < self.stale_after.as_millis() as i64 {
                debug!(%backend, elapsed_ms = elapsed, "sync lock held, refusing");
                return Ok(false);
            }
            warn!(%backend, elapsed_ms = elapsed, "sync lock is stale, reacquiring");
        }

        let now = now_ms();
        self.save(&LockState {
            is_syncing: true,
            last_sync_time: now,
        })?;
        self.save_process(&SyncProcess {
            status: ProcessStatus::Syncing,
            start_time: now,
            service: backend.as_str().to_string(),
        })?;
        Ok(true)
    }

    /// Releases the slot.
    ///
    /// A release when the lock is not held is a no-op returning `false`.
    pub fn unlock(&self) -> SyncResult<bool> {
        let state = self.load()?;
        if !state.is_syncing {
            return Ok(false);
        }

        self.save(&LockState {
            is_syncing: false,
            last_sync_time: state.last_sync_time,
        })?;

        let mut process = self.process()?.unwrap_or(SyncProcess {
            status: ProcessStatus::Idle,
            start_time: state.last_sync_time,
            service: String::new(),
        });
        process.status = ProcessStatus::Idle;
        self.save_process(&process)?;
        Ok(true)
    }

    /// Returns true while the slot is held.
    pub fn is_locked(&self) -> SyncResult<bool> {
        Ok(self.load()?.is_syncing)
    }

    /// Returns the persisted process descriptor, if any round ever ran.
    pub fn process(&self) -> SyncResult<Option<SyncProcess>> {
        match self.store.get(PROCESS_KEY)? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(StorageError::Serialization)?,
            )),
            None => Ok(None),
        }
    }

    fn load(&self) -> SyncResult<LockState> {
        match self.store.get(LOCK_KEY)? {
            Some(value) => {
                Ok(serde_json::from_value(value).map_err(StorageError::Serialization)?)
            }
            None => Ok(LockState::default()),
        }
    }

    fn save(&self, state: &LockState) -> SyncResult<()> {
        let value = serde_json::to_value(state).map_err(StorageError::Serialization)?;
        self.store.set(LOCK_KEY, value)?;
        Ok(())
    }

    fn save_process(&self, process: &SyncProcess) -> SyncResult<()> {
        let value = serde_json::to_value(process).map_err(StorageError::Serialization)?;
        self.store.set(PROCESS_KEY, value)?;
        Ok(())
    }
}

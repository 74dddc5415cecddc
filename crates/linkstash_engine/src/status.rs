//! Per-backend sync status records.

use crate::error::SyncResult;
use linkstash_storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Storage key holding the per-backend status map.
pub const STATUS_KEY: &str = "sync:status";

/// The two sync backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// The REST-style cloud service.
    Cloud,
    /// The file-based remote store.
    FileRemote,
}

impl BackendKind {
    /// Returns the stable identifier used in persisted state and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Cloud => "cloud",
            BackendKind::FileRemote => "file-remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome label of the most recent round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncResultKind {
    /// The round completed.
    Success,
    /// The round failed; see the message.
    Error,
}

/// Observational record of a backend's most recent round.
///
/// Written by the engine and the scheduler, read by UIs and the CLI -
/// never by the reconciliation algorithm itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// When the round finished, epoch milliseconds.
    pub last_sync: i64,
    /// How the round ended.
    pub last_sync_result: SyncResultKind,
    /// Failure detail, when the round failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncStatus {
    /// Creates a success record.
    pub fn success(last_sync: i64) -> Self {
        Self {
            last_sync,
            last_sync_result: SyncResultKind::Success,
            message: None,
        }
    }

    /// Creates a failure record.
    pub fn failure(last_sync: i64, message: impl Into<String>) -> Self {
        Self {
            last_sync,
            last_sync_result: SyncResultKind::Error,
            message: Some(message.into()),
        }
    }
}

/// Persisted per-backend status map.
pub struct SyncStatusStore {
    store: Arc<dyn KeyValueStore>,
}

impl SyncStatusStore {
    /// Creates a status store persisting through the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Records the status for one backend.
    pub fn record(&self, backend: BackendKind, status: SyncStatus) -> SyncResult<()> {
        let mut all = self.load()?;
        all.insert(backend.as_str().to_string(), status);
        let value = serde_json::to_value(&all)
            .map_err(linkstash_storage::StorageError::Serialization)?;
        self.store.set(STATUS_KEY, value)?;
        Ok(())
    }

    /// Returns the status for one backend, if any round ever finished.
    pub fn get(&self, backend: BackendKind) -> SyncResult<Option<SyncStatus>> {
        Ok(self.load()?.remove(backend.as_str()))
    }

    /// Returns the full per-backend map.
    pub fn all(&self) -> SyncResult<BTreeMap<String, SyncStatus>> {
        self.load()
    }

    fn load(&self) -> SyncResult<BTreeMap<String, SyncStatus>> {
        match self.store.get(STATUS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)
                .map_err(linkstash_storage::StorageError::Serialization)?),
            None => Ok(BTreeMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkstash_storage::InMemoryStore;

    #[test]
    fn record_and_read_back() {
        let store = SyncStatusStore::new(Arc::new(InMemoryStore::new()));
        store
            .record(BackendKind::Cloud, SyncStatus::success(1_000))
            .unwrap();
        store
            .record(BackendKind::FileRemote, SyncStatus::failure(2_000, "boom"))
            .unwrap();

        let cloud = store.get(BackendKind::Cloud).unwrap().unwrap();
        assert_eq!(cloud.last_sync_result, SyncResultKind::Success);
        assert_eq!(cloud.last_sync, 1_000);

        let file = store.get(BackendKind::FileRemote).unwrap().unwrap();
        assert_eq!(file.last_sync_result, SyncResultKind::Error);
        assert_eq!(file.message.as_deref(), Some("boom"));

        assert_eq!(store.all().unwrap().len(), 2);
    }

    #[test]
    fn missing_backend_is_none() {
        let store = SyncStatusStore::new(Arc::new(InMemoryStore::new()));
        assert!(store.get(BackendKind::Cloud).unwrap().is_none());
    }

    #[test]
    fn record_overwrites_previous() {
        let store = SyncStatusStore::new(Arc::new(InMemoryStore::new()));
        store
            .record(BackendKind::Cloud, SyncStatus::failure(1, "first"))
            .unwrap();
        store
            .record(BackendKind::Cloud, SyncStatus::success(2))
            .unwrap();

        let status = store.get(BackendKind::Cloud).unwrap().unwrap();
        assert_eq!(status.last_sync_result, SyncResultKind::Success);
        assert!(status.message.is_none());
    }

    #[test]
    fn wire_result_labels_are_lowercase() {
        let status = SyncStatus::success(5);
        let wire = serde_json::to_value(&status).unwrap();
        assert_eq!(wire["lastSyncResult"], "success");
    }
}

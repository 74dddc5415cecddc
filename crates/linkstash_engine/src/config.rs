//! Configuration for the sync engine and backends.

use crate::error::{SyncError, SyncResult};
use crate::status::BackendKind;
use linkstash_storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Storage key holding the persisted sync settings.
pub const SETTINGS_KEY: &str = "sync:settings";

/// Minimum allowed auto-sync interval, in minutes.
const MIN_INTERVAL_MINUTES: u32 = 5;

/// Tuning knobs of a sync round.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the sync server (the engine posts to `<base>/sync`).
    pub server_url: String,
    /// Changes per request in a batched round.
    pub batch_size: usize,
    /// Pause between consecutive batch requests.
    pub batch_delay: Duration,
    /// Entities applied to local storage per chunk during the merge.
    pub apply_chunk_size: usize,
}

impl EngineConfig {
    /// Creates a configuration with the protocol defaults.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            batch_size: 50,
            batch_delay: Duration::from_millis(200),
            apply_chunk_size: 100,
        }
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the inter-batch delay. Tests set this to zero.
    #[must_use]
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Sets the apply chunk size.
    #[must_use]
    pub fn with_apply_chunk_size(mut self, size: usize) -> Self {
        self.apply_chunk_size = size;
        self
    }

    /// Returns the full URL of the sync endpoint.
    #[must_use]
    pub fn sync_url(&self) -> String {
        format!("{}/sync", self.server_url.trim_end_matches('/'))
    }
}

/// Per-backend sync settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSettings {
    /// Whether periodic auto-sync is enabled.
    pub auto_sync: bool,
    /// Auto-sync interval in minutes; values below 5 are clamped up.
    pub interval_minutes: u32,
    /// Whether bookmark data syncs.
    #[serde(default = "default_true")]
    pub sync_bookmarks: bool,
    /// Whether tag data syncs.
    #[serde(default = "default_true")]
    pub sync_tags: bool,
    /// Remote endpoint. Required for validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Account name for the file-based backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Secret for the file-based backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            auto_sync: false,
            interval_minutes: 30,
            sync_bookmarks: true,
            sync_tags: true,
            endpoint: None,
            username: None,
            secret: None,
        }
    }
}

impl BackendSettings {
    /// Returns the auto-sync interval with the minimum clamp applied.
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes.max(MIN_INTERVAL_MINUTES)) * 60)
    }

    fn field_present(field: &Option<String>) -> bool {
        field.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// Persisted sync configuration for both backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Cloud backend settings.
    #[serde(default)]
    pub cloud: BackendSettings,
    /// File-based backend settings.
    #[serde(default)]
    pub file_remote: BackendSettings,
    /// Whether verbose scheduler diagnostics are recorded.
    #[serde(default)]
    pub verbose_logging: bool,
}

impl SyncSettings {
    /// Loads settings from the store; defaults when never saved.
    pub fn load(store: &Arc<dyn KeyValueStore>) -> SyncResult<Self> {
        match store.get(SETTINGS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)
                .map_err(linkstash_storage::StorageError::Serialization)?),
            None => Ok(Self::default()),
        }
    }

    /// Saves settings to the store.
    pub fn save(&self, store: &Arc<dyn KeyValueStore>) -> SyncResult<()> {
        let value =
            serde_json::to_value(self).map_err(linkstash_storage::StorageError::Serialization)?;
        store.set(SETTINGS_KEY, value)?;
        Ok(())
    }

    /// Returns the settings for one backend.
    #[must_use]
    pub fn backend(&self, backend: BackendKind) -> &BackendSettings {
        match backend {
            BackendKind::Cloud => &self.cloud,
            BackendKind::FileRemote => &self.file_remote,
        }
    }

    /// Validates a backend's configuration.
    ///
    /// The cloud backend needs a non-empty endpoint; the file-based
    /// backend needs the full endpoint/username/secret triple.
    pub fn validate(&self, backend: BackendKind) -> SyncResult<()> {
        let settings = self.backend(backend);
        match backend {
            BackendKind::Cloud => {
                if !BackendSettings::field_present(&settings.endpoint) {
                    return Err(SyncError::InvalidConfiguration(
                        "cloud sync endpoint is not configured".into(),
                    ));
                }
            }
            BackendKind::FileRemote => {
                if !BackendSettings::field_present(&settings.endpoint)
                    || !BackendSettings::field_present(&settings.username)
                    || !BackendSettings::field_present(&settings.secret)
                {
                    return Err(SyncError::InvalidConfiguration(
                        "file-remote sync needs endpoint, username, and secret".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

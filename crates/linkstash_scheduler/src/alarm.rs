//! Periodic alarms and their diagnostic log.

use crate::events::{EventBus, SyncEvent};
use linkstash_engine::{now_ms, BackendKind, SyncResult};
use linkstash_storage::{KeyValueStore, StorageError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Storage key holding the diagnostic ring.
pub const ALARM_LOG_KEY: &str = "sync:alarm_log";

/// Maximum number of retained diagnostic entries.
pub const ALARM_LOG_CAP: usize = 100;

/// One diagnostic log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmLogEntry {
    /// When the entry was recorded, epoch milliseconds.
    pub at: i64,
    /// What happened.
    pub message: String,
}

/// Bounded, newest-first ring of alarm diagnostics, persisted through the
/// key-value store.
///
/// Recording is best-effort and a no-op unless verbose diagnostics are
/// enabled.
pub struct AlarmLog {
    store: Arc<dyn KeyValueStore>,
    enabled: AtomicBool,
}

impl AlarmLog {
    /// Creates a disabled log persisting through the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            enabled: AtomicBool::new(false),
        }
    }

    /// Enables or disables recording.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Returns true when recording is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Records an entry at the front, dropping the oldest past the cap.
    pub fn record(&self, message: impl Into<String>) {
        if !self.is_enabled() {
            return;
        }
        if let Err(e) = self.append(message.into()) {
            warn!("failed to persist alarm log entry: {e}");
        }
    }

    /// Returns the entries, newest first.
    pub fn entries(&self) -> SyncResult<Vec<AlarmLogEntry>> {
        match self.store.get(ALARM_LOG_KEY)? {
            Some(value) => {
                Ok(serde_json::from_value(value).map_err(StorageError::Serialization)?)
            }
            None => Ok(Vec::new()),
        }
    }

    fn append(&self, message: String) -> SyncResult<()> {
        let mut entries = self.entries()?;
        entries.insert(
            0,
            AlarmLogEntry {
                at: now_ms(),
                message,
            },
        );
        entries.truncate(ALARM_LOG_CAP);
        let value = serde_json::to_value(&entries).map_err(StorageError::Serialization)?;
        self.store.set(ALARM_LOG_KEY, value)?;
        Ok(())
    }
}

/// A recurring alarm for one backend.
///
/// The alarm fires [`SyncEvent::SyncNow`] on the bus at every period.
/// Re-ensuring with the identical period is a no-op, so configuration
/// reads do not cause alarm storms; any other period cancels and
/// respawns the timer task.
pub struct PeriodicAlarm {
    backend: BackendKind,
    bus: EventBus,
    log: Arc<AlarmLog>,
    period: Mutex<Option<Duration>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicAlarm {
    /// Creates an unscheduled alarm for `backend`.
    pub fn new(backend: BackendKind, bus: EventBus, log: Arc<AlarmLog>) -> Self {
        Self {
            backend,
            bus,
            log,
            period: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Schedules the alarm at `period`, unless it already runs at exactly
    /// that period.
    pub fn ensure(&self, period: Duration) {
        let mut current = self.period.lock();
        let mut handle = self.handle.lock();

        let alive = handle.as_ref().is_some_and(|h| !h.is_finished());
        if alive && *current == Some(period) {
            self.log.record(format!(
                "{} alarm unchanged ({}s), skipping recreate",
                self.backend,
                period.as_secs()
            ));
            return;
        }

        if let Some(previous) = handle.take() {
            previous.abort();
        }

        let backend = self.backend;
        let bus = self.bus.clone();
        let log = Arc::clone(&self.log);
        *handle = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticks = tokio::time::interval_at(start, period);
            loop {
                ticks.tick().await;
                debug!(%backend, "periodic alarm fired");
                log.record(format!("{backend} alarm fired"));
                bus.publish(SyncEvent::SyncNow { backend });
            }
        }));
        *current = Some(period);
        self.log.record(format!(
            "{} alarm scheduled every {}s",
            self.backend,
            period.as_secs()
        ));
    }

    /// Clears the alarm outright.
    pub fn clear(&self) {
        let mut current = self.period.lock();
        let mut handle = self.handle.lock();
        if let Some(previous) = handle.take() {
            previous.abort();
            self.log.record(format!("{} alarm cleared", self.backend));
        }
        *current = None;
    }

    /// Returns true while the alarm is scheduled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PeriodicAlarm {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

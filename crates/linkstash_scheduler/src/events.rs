//! Fire-and-forget event bus.

use linkstash_engine::BackendKind;
use tokio::sync::broadcast;
use tracing::debug;

/// Why a sync was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Local bookmark data changed.
    BookmarksChanged,
    /// Sync settings changed.
    SettingsChanged,
    /// A user asked explicitly.
    Manual,
    /// A periodic alarm fired.
    Periodic,
}

/// Messages carried by the bus.
///
/// Delivery is best-effort: publishing with no listeners is logged and
/// dropped, never retried.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Local storage changed under the given keys.
    StorageChanged {
        /// The changed storage keys.
        keys: Vec<String>,
    },
    /// Request a debounced sync of one backend.
    ScheduleSync {
        /// Which backend.
        backend: BackendKind,
        /// Why.
        reason: TriggerReason,
    },
    /// Execute a sync of one backend now, skipping the debounce.
    SyncNow {
        /// Which backend.
        backend: BackendKind,
    },
}

/// A broadcast bus for [`SyncEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    /// Creates a bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to all current listeners. Fire-and-forget.
    pub fn publish(&self, event: SyncEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("event dropped, no listeners: {e}");
        }
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

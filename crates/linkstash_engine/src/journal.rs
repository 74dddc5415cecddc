//! Pending-change journal and temp queue.

use crate::clock::now_ms;
use crate::error::SyncResult;
use linkstash_protocol::{Bookmark, ChangeRecord};
use linkstash_storage::KeyValueStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Storage key holding the persisted journal map.
pub const JOURNAL_KEY: &str = "sync:pending_changes";

/// One persisted journal entry: when it was recorded, and the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
    /// The captured change.
    pub change: ChangeRecord,
}

/// The durable set of not-yet-synced local mutations.
///
/// Mutations are captured as [`ChangeRecord`]s versioned at capture time
/// and upserted by entity key - re-recording a key replaces its pending
/// change. While a sync round is active, captures are diverted to an
/// in-memory temp queue so the batch in flight is never mutated
/// underneath; the queue is folded back into the journal when the round
/// ends, whatever its outcome.
///
/// The journal itself is cleared only after a confirmed successful round.
pub struct ChangeJournal {
    store: Arc<dyn KeyValueStore>,
    round_active: AtomicBool,
    temp: Mutex<HashMap<String, ChangeRecord>>,
}

impl ChangeJournal {
    /// Creates a journal persisting through the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            round_active: AtomicBool::new(false),
            temp: Mutex::new(HashMap::new()),
        }
    }

    /// Captures a local mutation of the given bookmarks.
    ///
    /// Each bookmark becomes a change record versioned with the current
    /// time. No-ops on an empty slice.
    pub fn record(&self, bookmarks: &[Bookmark], is_deleted: bool) -> SyncResult<()> {
        if bookmarks.is_empty() {
            return Ok(());
        }

        let version = now_ms();

        if self.round_active.load(Ordering::SeqCst) {
            let mut temp = self.temp.lock();
            for bookmark in bookmarks {
                let record = ChangeRecord::new(bookmark.clone(), version, is_deleted);
                temp.insert(bookmark.url.clone(), record);
            }
            debug!(count = bookmarks.len(), "captured changes into temp queue");
            return Ok(());
        }

        let mut entries = self.load()?;
        for bookmark in bookmarks {
            let record = ChangeRecord::new(bookmark.clone(), version, is_deleted);
            entries.insert(
                bookmark.url.clone(),
                JournalEntry {
                    timestamp: version,
                    change: record,
                },
            );
        }
        self.persist(&entries)?;
        debug!(count = bookmarks.len(), "captured changes into journal");
        Ok(())
    }

    /// Returns the journal's current change records without clearing.
    pub fn pending(&self) -> SyncResult<Vec<ChangeRecord>> {
        Ok(self.load()?.into_values().map(|e| e.change).collect())
    }

    /// Returns the number of pending entries.
    pub fn len(&self) -> SyncResult<usize> {
        Ok(self.load()?.len())
    }

    /// Returns true when no entries are pending.
    pub fn is_empty(&self) -> SyncResult<bool> {
        Ok(self.load()?.is_empty())
    }

    /// Empties the journal. Called only after a confirmed successful round.
    pub fn clear(&self) -> SyncResult<()> {
        self.persist(&BTreeMap::new())
    }

    /// Marks a sync round active: captures divert to the temp queue.
    pub fn begin_round(&self) {
        self.round_active.store(true, Ordering::SeqCst);
    }

    /// Ends the round and folds the temp queue back into the journal.
    ///
    /// The fold is additive: existing journal entries survive, and temp
    /// entries replace their keys (being strictly newer captures). Runs on
    /// success and failure alike.
    pub fn finish_round(&self) -> SyncResult<()> {
        self.round_active.store(false, Ordering::SeqCst);

        let drained: HashMap<String, ChangeRecord> = std::mem::take(&mut *self.temp.lock());
        if drained.is_empty() {
            return Ok(());
        }

        let mut entries = self.load()?;
        for (url, change) in drained {
            entries.insert(
                url,
                JournalEntry {
                    timestamp: change.version,
                    change,
                },
            );
        }
        debug!(total = entries.len(), "flushed temp queue into journal");
        self.persist(&entries)
    }

    /// Returns true while a sync round is active.
    pub fn is_round_active(&self) -> bool {
        self.round_active.load(Ordering::SeqCst)
    }

    fn load(&self) -> SyncResult<BTreeMap<String, JournalEntry>> {
        match self.store.get(JOURNAL_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)
                .map_err(linkstash_storage::StorageError::Serialization)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, JournalEntry>) -> SyncResult<()> {
        let value = serde_json::to_value(entries)
            .map_err(linkstash_storage::StorageError::Serialization)?;
        self.store.set(JOURNAL_KEY, value)?;
        Ok(())
    }
}

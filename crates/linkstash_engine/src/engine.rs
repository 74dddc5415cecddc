//! The sync engine round driver.

use crate::auth::AuthProvider;
use crate::clock::now_ms;
use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::journal::ChangeJournal;
use crate::state::Watermark;
use crate::transport::HttpClient;
use linkstash_protocol::{
    bookmark_key, plan_merge, Bookmark, ChangeRecord, ErrorBody, MergePlan, SyncRequest,
    SyncResponse, BOOKMARK_KEY_PREFIX,
};
use linkstash_storage::{KeyValueStore, StorageError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a completed sync round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// When the round finished, epoch milliseconds. This is also the new
    /// watermark.
    pub last_sync: i64,
    /// Number of local changes sent.
    pub pushed: usize,
    /// Number of server changes applied locally.
    pub applied: usize,
    /// Number of server changes discarded as stale.
    pub discarded: usize,
    /// Highest version counter the server reported during the round.
    /// Observational only - the watermark is local time, not this.
    pub server_version: i64,
}

/// The sync engine.
///
/// Owns the watermark, the batch wire protocol, and the merge step.
/// Mutations made while a round is in flight land in the journal's temp
/// queue and are folded back afterwards; the journal itself is cleared
/// only when the round succeeds.
pub struct SyncEngine<C: HttpClient> {
    config: EngineConfig,
    store: Arc<dyn KeyValueStore>,
    auth: Arc<dyn AuthProvider>,
    client: Arc<C>,
    journal: Arc<ChangeJournal>,
    watermark: Watermark,
    in_flight: AtomicBool,
}

impl<C: HttpClient> SyncEngine<C> {
    /// Creates an engine over the given collaborators.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
        auth: Arc<dyn AuthProvider>,
        client: Arc<C>,
    ) -> Self {
        let journal = Arc::new(ChangeJournal::new(Arc::clone(&store)));
        let watermark = Watermark::new(Arc::clone(&store));
        Self {
            config,
            store,
            auth,
            client,
            journal,
            watermark,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns the journal all local mutations must be recorded through.
    #[must_use]
    pub fn journal(&self) -> Arc<ChangeJournal> {
        Arc::clone(&self.journal)
    }

    /// Returns the current watermark; 0 means never synced.
    pub fn last_version(&self) -> SyncResult<i64> {
        self.watermark.load()
    }

    /// Resets the watermark so the next round runs a full resync.
    pub fn force_full_resync(&self) -> SyncResult<()> {
        self.watermark.reset()
    }

    /// Runs one sync round.
    ///
    /// Fails fast with [`SyncError::SyncInProgress`] when called re-entrantly.
    /// On any outcome the journal's temp queue is flushed back; the journal
    /// is cleared only on success.
    pub fn sync(&self) -> SyncResult<SyncOutcome> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SyncError::SyncInProgress);
        }

        self.journal.begin_round();
        let result = self.run_round();
        let flush = self.journal.finish_round();
        self.in_flight.store(false, Ordering::SeqCst);

        match (result, flush) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(flush_err)) => Err(flush_err),
            (Err(round_err), flush) => {
                if let Err(flush_err) = flush {
                    warn!("temp queue flush failed after sync error: {flush_err}");
                }
                Err(round_err)
            }
        }
    }

    fn run_round(&self) -> SyncResult<SyncOutcome> {
        if !self.client.is_online() {
            return Err(SyncError::Offline);
        }

        let token = self
            .auth
            .token()
            .ok_or_else(|| SyncError::unauthenticated("no credential stored"))?;
        if !self.auth.validate_token() {
            self.auth.invalidate();
            return Err(SyncError::unauthenticated("credential expired"));
        }

        let watermark = self.watermark.load()?;
        let full_resync = watermark == 0;
        let changes = if full_resync {
            self.full_change_set()?
        } else {
            self.journal.pending()?
        };
        info!(
            count = changes.len(),
            full_resync, "sync round started"
        );

        let outgoing: HashMap<String, i64> = changes
            .iter()
            .map(|c| (c.key().to_string(), c.version))
            .collect();
        let pushed = changes.len();

        let (server_changes, server_version) = self.exchange(&token, watermark, changes)?;

        let plan = plan_merge(server_changes, &outgoing);
        let applied = plan.upserts.len() + plan.deletions.len();
        let discarded = plan.discarded;
        self.apply(plan)?;

        let now = now_ms();
        self.watermark.advance_to(now)?;
        self.journal.clear()?;
        info!(pushed, applied, discarded, "sync round completed");

        Ok(SyncOutcome {
            last_sync: now,
            pushed,
            applied,
            discarded,
            server_version,
        })
    }

    /// Builds the full-resync change set: every stored bookmark as a
    /// non-deleted change versioned now.
    fn full_change_set(&self) -> SyncResult<Vec<ChangeRecord>> {
        let now = now_ms();
        self.store
            .list_by_prefix(BOOKMARK_KEY_PREFIX)?
            .into_values()
            .map(|value| {
                serde_json::from_value::<Bookmark>(value)
                    .map(|b| ChangeRecord::new(b, now, false))
                    .map_err(|e| SyncError::Storage(StorageError::Serialization(e)))
            })
            .collect()
    }

    /// Sends the change set and accumulates the server's changes.
    ///
    /// Below the batch threshold this is a single request carrying the
    /// watermark. Above it, every request carries the version returned by
    /// the previous response, spaced by the configured delay.
    fn exchange(
        &self,
        token: &str,
        watermark: i64,
        changes: Vec<ChangeRecord>,
    ) -> SyncResult<(Vec<ChangeRecord>, i64)> {
        let batch_size = self.config.batch_size.max(1);
        let mut collected = Vec::new();
        let mut max_version = 0;

        if changes.len() <= batch_size {
            let response = self.send(token, &SyncRequest::single(watermark, changes))?;
            max_version = response.current_version;
            collected.extend(response.changes);
            return Ok((collected, max_version));
        }

        let total = changes.len().div_ceil(batch_size);
        let mut last_version = watermark;
        for (index, chunk) in changes.chunks(batch_size).enumerate() {
            if index > 0 && !self.config.batch_delay.is_zero() {
                std::thread::sleep(self.config.batch_delay);
            }

            let request = SyncRequest::batch(last_version, chunk.to_vec(), index + 1, total);
            let response = self.send(token, &request)?;
            debug!(
                batch = index + 1,
                total,
                version = response.current_version,
                returned = response.changes.len(),
                "batch exchanged"
            );

            last_version = response.current_version;
            max_version = max_version.max(response.current_version);
            collected.extend(response.changes);
        }

        Ok((collected, max_version))
    }

    fn send(&self, token: &str, request: &SyncRequest) -> SyncResult<SyncResponse> {
        let body = serde_json::to_vec(request)
            .map_err(|e| SyncError::ResponseFormat(format!("request encoding failed: {e}")))?;

        let response = self
            .client
            .post(&self.config.sync_url(), token, body)
            .map_err(SyncError::Network)?;

        if response.status == 401 {
            self.auth.invalidate();
            return Err(SyncError::unauthenticated("server rejected credential"));
        }

        if !(200..300).contains(&response.status) {
            let message = serde_json::from_slice::<ErrorBody>(&response.body)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("HTTP {}", response.status));
            return Err(SyncError::Server {
                status: response.status,
                message,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| SyncError::ResponseFormat(e.to_string()))
    }

    /// Applies the merge plan to local storage in bounded chunks.
    fn apply(&self, plan: MergePlan) -> SyncResult<()> {
        let chunk_size = self.config.apply_chunk_size.max(1);

        for chunk in plan.deletions.chunks(chunk_size) {
            let keys: Vec<String> = chunk.iter().map(|url| bookmark_key(url)).collect();
            self.store.remove(&keys)?;
        }

        for chunk in plan.upserts.chunks(chunk_size) {
            for bookmark in chunk {
                let value = serde_json::to_value(bookmark)
                    .map_err(StorageError::Serialization)?;
                self.store.set(&bookmark.storage_key(), value)?;
            }
        }

        Ok(())
    }
}

//! Command implementations.

use crate::http::ReqwestClient;
use linkstash_engine::{
    now_ms, AuthProvider, BackendKind, ChangeJournal, EngineConfig, StaticAuth, SyncEngine,
    SyncResultKind, SyncStatus, SyncStatusStore, Watermark,
};
use linkstash_protocol::{bookmark_key, Bookmark};
use linkstash_scheduler::SyncLockGuard;
use linkstash_storage::KeyValueStore;
use std::sync::Arc;
use tracing::warn;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn status(store: Arc<dyn KeyValueStore>) -> CommandResult {
    let watermark = Watermark::new(Arc::clone(&store)).load()?;
    if watermark == 0 {
        println!("last sync version: never (next round is a full resync)");
    } else {
        println!("last sync version: {watermark}");
    }

    let journal = ChangeJournal::new(Arc::clone(&store));
    println!("pending changes:   {}", journal.len()?);

    let statuses = SyncStatusStore::new(Arc::clone(&store)).all()?;
    for (backend, status) in &statuses {
        let label = match status.last_sync_result {
            SyncResultKind::Success => "success".to_string(),
            SyncResultKind::Error => format!(
                "error ({})",
                status.message.as_deref().unwrap_or("unknown")
            ),
        };
        println!("{backend}: {label} at {}", status.last_sync);
    }
    if statuses.is_empty() {
        println!("no backend has synced yet");
    }

    if let Some(process) = SyncLockGuard::new(store).process()? {
        println!(
            "sync process:      {:?} ({}, started {})",
            process.status, process.service, process.start_time
        );
    }
    Ok(())
}

pub fn pending(store: Arc<dyn KeyValueStore>) -> CommandResult {
    let journal = ChangeJournal::new(store);
    let mut pending = journal.pending()?;
    pending.sort_by(|a, b| a.content.url.cmp(&b.content.url));

    if pending.is_empty() {
        println!("journal is empty");
        return Ok(());
    }
    for change in pending {
        let marker = if change.is_deleted { " (deleted)" } else { "" };
        println!("{} v{}{marker}", change.content.url, change.version);
    }
    Ok(())
}

pub fn add(
    store: Arc<dyn KeyValueStore>,
    url: String,
    title: Option<String>,
    tags: Vec<String>,
) -> CommandResult {
    let title = title.unwrap_or_else(|| url.clone());
    let bookmark = Bookmark::new(url, title, now_ms()).with_tags(tags);

    store.set(&bookmark.storage_key(), serde_json::to_value(&bookmark)?)?;
    ChangeJournal::new(store).record(std::slice::from_ref(&bookmark), false)?;
    println!("recorded {}", bookmark.url);
    Ok(())
}

pub fn remove(store: Arc<dyn KeyValueStore>, url: String) -> CommandResult {
    let key = bookmark_key(&url);
    let Some(value) = store.get(&key)? else {
        return Err(format!("no bookmark stored for {url}").into());
    };
    let bookmark: Bookmark = serde_json::from_value(value)?;

    store.remove(&[key])?;
    ChangeJournal::new(store).record(&[bookmark], true)?;
    println!("removed {url}");
    Ok(())
}

pub fn sync(store: Arc<dyn KeyValueStore>, server: String, token: String) -> CommandResult {
    let lock = SyncLockGuard::new(Arc::clone(&store));
    if !lock.lock(BackendKind::Cloud)? {
        println!("sync already running, try again later");
        return Ok(());
    }

    let auth = Arc::new(StaticAuth::new(token));
    let client = Arc::new(ReqwestClient::new()?);
    let engine = SyncEngine::new(
        EngineConfig::new(server),
        Arc::clone(&store),
        auth as Arc<dyn AuthProvider>,
        client,
    );

    let status_store = SyncStatusStore::new(Arc::clone(&store));
    let result = engine.sync();

    let status = match &result {
        Ok(outcome) => SyncStatus::success(outcome.last_sync),
        Err(e) => SyncStatus::failure(now_ms(), e.to_string()),
    };
    if let Err(e) = status_store.record(BackendKind::Cloud, status) {
        warn!("failed to persist sync status: {e}");
    }
    if let Err(e) = lock.unlock() {
        warn!("failed to release sync lock: {e}");
    }

    match result {
        Ok(outcome) => {
            println!(
                "sync complete: pushed {}, applied {}, discarded {}",
                outcome.pushed, outcome.applied, outcome.discarded
            );
            Ok(())
        }
        Err(e) if e.is_authentication() => Err(format!("not logged in: {e}").into()),
        Err(e) => Err(e.into()),
    }
}

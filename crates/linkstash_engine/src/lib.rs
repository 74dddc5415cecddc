//! # LinkStash Sync Engine
//!
//! Sync engine, change journal, and status store for LinkStash.
//!
//! This crate provides:
//! - Change journal with an in-memory temp queue for writes made mid-round
//! - The sync engine: full/incremental rounds, chained batch protocol,
//!   last-writer-wins merge, chunked application
//! - Sync-version watermark management
//! - Per-backend sync status records
//! - Auth-provider and HTTP-client seams (plus a scriptable mock)
//!
//! ## Round lifecycle
//!
//! 1. Pre-flight: network reachable, credential present and valid
//! 2. Change set: every stored bookmark (watermark 0) or the journal
//! 3. Exchange: batches of 50, each request chaining the version returned
//!    by the previous response, 200 ms apart
//! 4. Merge: server changes win only with a strictly higher version
//! 5. Success: watermark := now, journal cleared
//! 6. Always: temp queue flushed back into the journal
//!
//! ## Key Invariants
//!
//! - The journal is cleared only on a confirmed successful round
//! - Writes made during a round land in the temp queue, never in the
//!   batch already in flight
//! - The watermark is advanced to local time, never to the server counter
//! - One round at a time per engine; re-entry fails fast

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod clock;
mod config;
mod engine;
mod error;
mod journal;
mod state;
mod status;
mod transport;

pub use auth::{AuthProvider, StaticAuth};
pub use clock::now_ms;
pub use config::{BackendSettings, EngineConfig, SyncSettings, SETTINGS_KEY};
pub use engine::{SyncEngine, SyncOutcome};
pub use error::{SyncError, SyncResult};
pub use journal::{ChangeJournal, JournalEntry, JOURNAL_KEY};
pub use state::{Watermark, LAST_VERSION_KEY};
pub use status::{BackendKind, SyncResultKind, SyncStatus, SyncStatusStore, STATUS_KEY};
pub use transport::{HttpClient, HttpResponse, MockHttpClient, RecordedRequest};

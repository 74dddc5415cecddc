//! # LinkStash Sync Protocol
//!
//! Data model, wire messages, and merge rules for LinkStash sync.
//!
//! This crate provides:
//! - The [`Bookmark`] entity and its storage-key helpers
//! - Versioned [`ChangeRecord`]s, the unit of exchange with the server
//! - JSON request/response shapes of the `/sync` endpoint
//! - The pure last-writer-wins merge planner
//!
//! ## Versioning
//!
//! Change versions are wall-clock milliseconds assigned by the client that
//! captured the change. Conflict resolution compares these scalars and
//! keeps the higher one - there is no causal ordering, no vector clocks.
//! Two clients with skewed clocks resolve deterministically, if not always
//! "correctly"; that trade-off is deliberate for a personal bookmark store.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bookmark;
mod merge;
mod messages;
mod record;

pub use bookmark::{bookmark_key, Bookmark, BOOKMARK_KEY_PREFIX};
pub use merge::{plan_merge, resolve_remote, MergeOutcome, MergePlan};
pub use messages::{BatchInfo, ErrorBody, SyncRequest, SyncResponse};
pub use record::ChangeRecord;

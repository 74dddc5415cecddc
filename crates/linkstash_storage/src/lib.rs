//! # LinkStash Storage
//!
//! Key-value store trait and implementations for LinkStash.
//!
//! This crate provides the persistence primitive everything else builds on.
//! Stores hold **JSON values keyed by string** - they do not interpret the
//! data beyond that.
//!
//! ## Design Principles
//!
//! - Stores are simple keyed maps (get, set, remove, list-by-prefix)
//! - No knowledge of bookmarks, journals, or sync state
//! - Must be `Send + Sync` for concurrent access
//! - Per-key overwrite is atomic from the caller's point of view
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral state
//! - [`FileStore`] - Persistent storage backed by a single JSON file
//!
//! ## Example
//!
//! ```rust
//! use linkstash_storage::{KeyValueStore, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! store.set("greeting", serde_json::json!("hello")).unwrap();
//! assert_eq!(store.get("greeting").unwrap(), Some(serde_json::json!("hello")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::KeyValueStore;

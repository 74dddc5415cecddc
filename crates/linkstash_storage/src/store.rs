//! Key-value store trait definition.

use crate::error::StorageResult;
use serde_json::Value;
use std::collections::BTreeMap;

/// The key-value persistence primitive for LinkStash.
///
/// Stores are **keyed JSON maps**. They provide per-key reads and
/// overwrites, bulk removal, and prefix enumeration. Callers own all
/// interpretation of the stored values - stores do not understand
/// bookmarks, journals, or sync state.
///
/// # Invariants
///
/// - `set` replaces any previous value for the key in one step; readers
///   never observe a partially written value
/// - `remove` with an unknown key is not an error
/// - `list_by_prefix` returns entries in key order
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Removes every key in `keys`. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, keys: &[String]) -> StorageResult<()>;

    /// Returns all entries whose key starts with `prefix`, in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn list_by_prefix(&self, prefix: &str) -> StorageResult<BTreeMap<String, Value>>;
}

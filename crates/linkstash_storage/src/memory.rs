//! In-memory store for testing.

use crate::error::StorageResult;
use crate::store::KeyValueStore;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// An in-memory key-value store.
///
/// This store keeps all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral state that doesn't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use linkstash_storage::{KeyValueStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.set("a", serde_json::json!(1)).unwrap();
/// assert_eq!(store.get("a").unwrap(), Some(serde_json::json!(1)));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given entries.
    ///
    /// Useful for setting up test fixtures.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            data: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Returns a copy of the entire contents.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.data.read().clone()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, keys: &[String]) -> StorageResult<()> {
        let mut data = self.data.write();
        for key in keys {
            data.remove(key);
        }
        Ok(())
    }

    fn list_by_prefix(&self, prefix: &str) -> StorageResult<BTreeMap<String, Value>> {
        let data = self.data.read();
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn memory_set_overwrites() {
        let store = InMemoryStore::new();
        store.set("k", json!(1)).unwrap();
        store.set("k", json!(2)).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_remove_bulk() {
        let store = InMemoryStore::new();
        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        store.set("c", json!(3)).unwrap();

        store
            .remove(&["a".to_string(), "c".to_string(), "missing".to_string()])
            .unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), Some(json!(2)));
        assert_eq!(store.get("c").unwrap(), None);
    }

    #[test]
    fn memory_list_by_prefix() {
        let store = InMemoryStore::new();
        store.set("bookmark:https://a", json!("a")).unwrap();
        store.set("bookmark:https://b", json!("b")).unwrap();
        store.set("sync:last_version", json!(0)).unwrap();

        let bookmarks = store.list_by_prefix("bookmark:").unwrap();
        assert_eq!(bookmarks.len(), 2);
        assert!(bookmarks.keys().all(|k| k.starts_with("bookmark:")));

        let all = store.list_by_prefix("").unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn memory_list_by_prefix_is_ordered() {
        let store = InMemoryStore::new();
        store.set("p:c", json!(3)).unwrap();
        store.set("p:a", json!(1)).unwrap();
        store.set("p:b", json!(2)).unwrap();

        let keys: Vec<_> = store.list_by_prefix("p:").unwrap().into_keys().collect();
        assert_eq!(keys, vec!["p:a", "p:b", "p:c"]);
    }

    #[test]
    fn memory_with_entries() {
        let store = InMemoryStore::with_entries([("x".to_string(), json!(true))]);
        assert_eq!(store.get("x").unwrap(), Some(json!(true)));
    }

    #[test]
    fn memory_clear() {
        let store = InMemoryStore::new();
        store.set("k", json!(1)).unwrap();
        store.clear();
        assert!(store.is_empty());
    }
}

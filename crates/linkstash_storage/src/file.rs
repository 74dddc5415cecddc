//! File-based store for persistent storage.

use crate::error::{StorageError, StorageResult};
use crate::store::KeyValueStore;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file-backed key-value store.
///
/// The entire map is held in memory and persisted as a single JSON object.
/// Every mutation rewrites the file through a temporary sibling followed by
/// an atomic rename, so a crash mid-write leaves the previous contents
/// intact.
///
/// # Durability
///
/// A mutation has reached the OS page cache once `set`/`remove` return;
/// the rename makes the replacement atomic with respect to readers.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. Internal
/// locking serializes writers.
///
/// # Example
///
/// ```no_run
/// use linkstash_storage::{KeyValueStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("state.json")).unwrap();
/// store.set("sync:last_version", serde_json::json!(0)).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Value>>,
}

impl FileStore {
    /// Opens or creates a file store at the given path.
    ///
    /// A missing file starts the store empty; the file is created on the
    /// first mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or does not hold
    /// a JSON object.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let data = match fs::read(path) {
            Ok(bytes) => {
                let value: Value = serde_json::from_slice(&bytes)?;
                match value {
                    Value::Object(map) => map.into_iter().collect(),
                    _ => {
                        return Err(StorageError::Corrupt {
                            path: path.display().to_string(),
                        })
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
        })
    }

    /// Opens or creates a file store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be read.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the held map out, replacing the backing file atomically.
    fn persist(&self, data: &BTreeMap<String, Value>) -> StorageResult<()> {
        let object: serde_json::Map<String, Value> =
            data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let bytes = serde_json::to_vec(&Value::Object(object))?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut data = self.data.write();
        data.insert(key.to_string(), value);
        self.persist(&data)
    }

    fn remove(&self, keys: &[String]) -> StorageResult<()> {
        let mut data = self.data.write();
        let mut changed = false;
        for key in keys {
            changed |= data.remove(key).is_some();
        }
        if changed {
            self.persist(&data)?;
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

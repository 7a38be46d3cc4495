//! Client-state persistence capability.
//!
//! The checkout core never talks to a storage medium directly: components
//! that persist client state (the referral store, chiefly) receive a
//! [`StorageBackend`] and work against it. Execution contexts that have no
//! durable storage inject [`NullStorage`] and every read degrades to absent
//! — no operation on any backend ever raises an error.
//!
//! Backends:
//!
//! - [`MemoryStorage`] — process-local map, the test and ephemeral default
//! - [`FileStorage`] — write-through JSON map on disk, the durable backend
//! - [`NullStorage`] — persists nothing, reads nothing
//! - [`ScopedStorage`] — prefixes every key with a scope so independent
//!   sessions can share one durable backend without collisions

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// A key-value persistence capability that may or may not be durable.
///
/// The surface is deliberately infallible: a backend that cannot serve a
/// request behaves as if the key were absent, it never errors.
pub trait StorageBackend: Send + Sync {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Removes the value stored under `key`, if any.
    fn remove(&self, key: &str);
}

/// Shared handle to a storage backend, as injected into stores and sessions.
pub type SharedStorage = Arc<dyn StorageBackend>;

/// In-memory storage backend.
///
/// State lives for the lifetime of the process; useful for tests and for
/// sessions that do not need to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Storage backend for execution contexts without durable storage.
///
/// Writes are discarded and reads always return absent, which is the
/// degradation the referral store contract requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

impl StorageBackend for NullStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}

/// Durable storage backend: a write-through JSON map on disk.
///
/// The file is read once at open and rewritten after every mutation. IO
/// failures are logged at `warn` and swallowed — the backend keeps serving
/// from memory, honoring the never-error surface.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Opens the backend at `path`, loading any previously persisted map.
    ///
    /// A missing file starts empty; an unreadable or corrupt file is logged
    /// and also starts empty rather than failing.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "discarding corrupt storage file"
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "storage file unreadable, starting empty"
                );
                HashMap::new()
            }
        };
        Self {
            path,
            map: RwLock::new(map),
        }
    }

    /// The file this backend persists to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn persist(&self, map: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "failed to create storage directory"
                    );
                    return;
                }
            }
        }
        match serde_json::to_string(map) {
            Ok(contents) => {
                if let Err(err) = std::fs::write(&self.path, contents) {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "failed to persist storage file"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize storage map");
            }
        }
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_owned(), value.to_owned());
        self.persist(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        if map.remove(key).is_some() {
            self.persist(&map);
        }
    }
}

/// A view of another backend with every key prefixed by a scope.
///
/// Lets independent client sessions share one durable backend: keys are
/// written as `scope:key`, so two sessions using the same well-known key
/// never collide.
pub struct ScopedStorage {
    scope: String,
    inner: SharedStorage,
}

impl ScopedStorage {
    /// Wraps `inner` so all keys are namespaced under `scope`.
    #[must_use]
    pub fn new(scope: impl Into<String>, inner: SharedStorage) -> Self {
        Self {
            scope: scope.into(),
            inner,
        }
    }

    /// The scope prefix applied to every key.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn scoped_key(&self, key: &str) -> String {
        format!("{}:{}", self.scope, key)
    }
}

impl fmt::Debug for ScopedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedStorage")
            .field("scope", &self.scope)
            .field("inner", &"<StorageBackend>")
            .finish()
    }
}

impl StorageBackend for ScopedStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(&self.scoped_key(key))
    }

    fn set(&self, key: &str, value: &str) {
        self.inner.set(&self.scoped_key(key), value);
    }

    fn remove(&self, key: &str) {
        self.inner.remove(&self.scoped_key(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k"), None);
        storage.set("k", "v1");
        assert_eq!(storage.get("k"), Some("v1".to_owned()));
        storage.set("k", "v2");
        assert_eq!(storage.get("k"), Some("v2".to_owned()));
        storage.remove("k");
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn test_null_storage_is_always_absent() {
        let storage = NullStorage;
        storage.set("k", "v");
        assert_eq!(storage.get("k"), None);
        storage.remove("k");
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn test_scoped_storage_isolates_scopes() {
        let inner: SharedStorage = Arc::new(MemoryStorage::new());
        let a = ScopedStorage::new("a", Arc::clone(&inner));
        let b = ScopedStorage::new("b", Arc::clone(&inner));

        a.set("k", "from-a");
        b.set("k", "from-b");
        assert_eq!(a.get("k"), Some("from-a".to_owned()));
        assert_eq!(b.get("k"), Some("from-b".to_owned()));

        a.remove("k");
        assert_eq!(a.get("k"), None);
        assert_eq!(b.get("k"), Some("from-b".to_owned()));
    }

    #[test]
    fn test_file_storage_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let storage = FileStorage::open(&path);
        storage.set("k", "v");
        drop(storage);

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get("k"), Some("v".to_owned()));

        reopened.remove("k");
        drop(reopened);
        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get("k"), None);
    }

    #[test]
    fn test_file_storage_survives_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileStorage::open(&path);
        assert_eq!(storage.get("k"), None);
        storage.set("k", "v");
        assert_eq!(storage.get("k"), Some("v".to_owned()));
    }

    #[test]
    fn test_file_storage_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let storage = FileStorage::open(&path);
        storage.set("k", "v");
        assert_eq!(FileStorage::open(&path).get("k"), Some("v".to_owned()));
    }
}

//! Local key-value persistence
//!
//! Browser-local-storage semantics: synchronous, string values, every write
//! replaces the whole value.

use crate::error::StoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Synchronous key-value store
pub trait LocalStore: Send + Sync + std::fmt::Debug {
    /// Read value
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.lock().remove(key);
        Ok(())
    }
}

/// Directory-backed store, one `<key>.json` file per key
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create store rooted at `dir` (created on first write)
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::io_error(&self.dir, e))?;

        // Unique temp file in the same directory so the rename is atomic
        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|e| StoreError::io_error(&self.dir, e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io_error(tmp.path(), e))?;
        tmp.persist(&path)
            .map(drop)
            .map_err(|e| StoreError::io_error(&path, e.error))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert!(store.get("admission_draft").unwrap().is_none());
        store.set("admission_draft", r#"{"currentStep":2}"#).unwrap();

        let reopened = FileStore::new(dir.path().join("nested"));
        assert_eq!(
            reopened.get("admission_draft").unwrap().as_deref(),
            Some(r#"{"currentStep":2}"#)
        );
    }

    #[test]
    fn file_store_concurrent_writers_leave_one_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"currentStep":{i},"formData":{{}}}}"#))
            .collect();

        std::thread::scope(|scope| {
            for value in &values {
                let store = FileStore::new(dir.path());
                scope.spawn(move || {
                    for _ in 0..20 {
                        store.set("admission_draft", value).unwrap();
                    }
                });
            }
        });

        let stored = FileStore::new(dir.path()).get("admission_draft").unwrap().unwrap();
        assert!(values.contains(&stored));
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("admission_draft.json")]);
    }

    #[test]
    fn file_store_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.remove("admission_draft").unwrap();
        store.set("admission_draft", "{}").unwrap();
        store.remove("admission_draft").unwrap();
        assert!(store.get("admission_draft").unwrap().is_none());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }
}

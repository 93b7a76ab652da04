//! Durable key→watermark checkpoint document.
//!
//! The full document is a flat JSON object mapping opaque source/table keys
//! to last-seen high-water-mark values. All access happens inside a
//! serialized session: read the whole document, mutate an in-memory copy,
//! write it back atomically (temp file, then rename). A crash between the
//! temp write and the rename leaves the previous document intact; the lost
//! update is simply recomputed on the next run.
//!
//! Watermark monotonicity is the extractor's responsibility — the store
//! persists whatever it is given. Cross-process writers are not
//! coordinated; the queue's one-worker-per-stage delivery is what keeps a
//! pipeline's checkpoint single-writer.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::error::{Result, StateError};

/// File-backed checkpoint store for one pipeline.
pub struct CheckpointStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CheckpointStore {
    /// Open or create the checkpoint document at `path`.
    ///
    /// Creates parent directories and seeds an empty document when the file
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] when the directory or seed document can't
    /// be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            path,
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            store.write_document(&Map::new())?;
        }
        Ok(store)
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the checkpoint document inside one serialized
    /// session. The mutated document is written back atomically before the
    /// session lock is released.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the document can't be read, parsed, or
    /// written back.
    pub fn session<T>(&self, f: impl FnOnce(&mut Map<String, Value>) -> T) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| StateError::LockPoisoned)?;
        let mut data = self.read_document()?;
        let out = f(&mut data);
        self.write_document(&data)?;
        Ok(out)
    }

    /// Read the watermark for `key`, or `default` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] on storage failure.
    pub fn get(&self, key: &str, default: Value) -> Result<Value> {
        self.session(|data| data.get(key).cloned().unwrap_or(default))
    }

    /// Upsert the watermark for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] on storage failure.
    pub fn update(&self, key: &str, value: Value) -> Result<()> {
        tracing::debug!(key, %value, "Checkpoint updated");
        self.session(|data| {
            data.insert(key.to_string(), value);
        })
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        let raw = std::fs::read_to_string(&self.path)?;
        let parsed: Value = serde_json::from_str(&raw)?;
        match parsed {
            Value::Object(map) => Ok(map),
            _ => Err(StateError::NotAnObject(self.path.display().to_string())),
        }
    }

    /// Write to a temp file in the same directory, then rename over the
    /// original so no reader ever observes a partial document.
    fn write_document(&self, data: &Map<String, Value>) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&Value::Object(data.clone()))?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> CheckpointStore {
        CheckpointStore::open(dir.path().join("checkpoints.json")).unwrap()
    }

    #[test]
    fn open_seeds_empty_document_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/checkpoints.json");
        let store = CheckpointStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.get("anything", json!(null)).unwrap(), json!(null));
    }

    #[test]
    fn update_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.update("orders.updated_at", json!("2026-08-01T00:00:00Z")).unwrap();
        store.update("users.id", json!(4812)).unwrap();

        assert_eq!(
            store.get("orders.updated_at", json!(null)).unwrap(),
            json!("2026-08-01T00:00:00Z")
        );
        assert_eq!(store.get("users.id", json!(0)).unwrap(), json!(4812));
    }

    #[test]
    fn get_absent_key_returns_default_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let default = json!({"watermark": "1970-01-01"});
        assert_eq!(store.get("missing", default.clone()).unwrap(), default);
    }

    #[test]
    fn reopen_preserves_existing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        CheckpointStore::open(&path)
            .unwrap()
            .update("k", json!("v"))
            .unwrap();
        let reopened = CheckpointStore::open(&path).unwrap();
        assert_eq!(reopened.get("k", json!(null)).unwrap(), json!("v"));
    }

    #[test]
    fn stale_temp_file_does_not_shadow_document() {
        // Simulates a crash between temp-write and rename: the abandoned
        // temp file must not affect subsequent reads.
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.update("k", json!("committed")).unwrap();

        let tmp = dir.path().join("checkpoints.tmp");
        std::fs::write(&tmp, r#"{"k": "torn write"}"#).unwrap();

        assert_eq!(store.get("k", json!(null)).unwrap(), json!("committed"));
    }

    #[test]
    fn corrupt_document_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        let store = CheckpointStore::open(&path).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            store.get("k", json!(null)),
            Err(StateError::Corrupt(_))
        ));
    }

    #[test]
    fn non_object_document_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoints.json");
        let store = CheckpointStore::open(&path).unwrap();
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            store.get("k", json!(null)),
            Err(StateError::NotAnObject(_))
        ));
    }

    #[test]
    fn sessions_from_threads_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(store_in(&dir));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    store.update(&format!("source_{i}"), json!(i)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8 {
            assert_eq!(store.get(&format!("source_{i}"), json!(null)).unwrap(), json!(i));
        }
    }
}

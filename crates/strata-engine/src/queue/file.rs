//! File-backed continuation queue.
//!
//! The whole queue lives in one JSON document rewritten atomically
//! (temp file then rename) on every mutation, the same durability
//! scheme the checkpoint store uses. Visibility is wall-clock based so
//! it survives process restarts: a crashed worker's message becomes
//! visible again once its timeout passes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_types::ContinuationMessage;

use crate::queue::{MessageHandle, QueueError, ReceivedMessage, TaskQueue};

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    id: u64,
    receipt: u64,
    visible_at: DateTime<Utc>,
    message: ContinuationMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    next_id: u64,
    next_receipt: u64,
    entries: Vec<Entry>,
}

impl Document {
    fn empty() -> Self {
        Self {
            next_id: 1,
            next_receipt: 1,
            entries: Vec::new(),
        }
    }
}

/// Durable [`TaskQueue`] stored as a single JSON document.
pub struct FileTaskQueue {
    path: PathBuf,
    visibility_timeout: Duration,
    // Serializes sessions within this process; cross-process callers are
    // expected to run one worker per queue document.
    lock: Mutex<()>,
}

impl FileTaskQueue {
    /// Open (or create) the queue document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] if the parent directory or document
    /// cannot be created.
    pub fn open(path: impl Into<PathBuf>, visibility_timeout: Duration) -> Result<Self, QueueError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let queue = Self {
            path,
            visibility_timeout,
            lock: Mutex::new(()),
        };
        if !queue.path.exists() {
            queue.write_document(&Document::empty())?;
        }
        Ok(queue)
    }

    /// Location of the queue document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, QueueError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_document(&self, doc: &Document) -> Result<(), QueueError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(doc)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn session<T>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<T, QueueError>,
    ) -> Result<T, QueueError> {
        let _guard = self.lock.lock().map_err(|_| QueueError::LockPoisoned)?;
        let mut doc = self.read_document()?;
        let out = f(&mut doc)?;
        self.write_document(&doc)?;
        Ok(out)
    }
}

impl TaskQueue for FileTaskQueue {
    fn enqueue(&self, message: &ContinuationMessage) -> Result<(), QueueError> {
        self.session(|doc| {
            let id = doc.next_id;
            doc.next_id += 1;
            doc.entries.push(Entry {
                id,
                receipt: 0,
                visible_at: Utc::now(),
                message: message.clone(),
            });
            tracing::debug!(id, stage = %message.stage, "Enqueued continuation message");
            Ok(())
        })
    }

    fn receive_one(&self) -> Result<Option<ReceivedMessage>, QueueError> {
        // Oversized timeouts clamp to a year; an in-flight deadline past
        // the datetime range would otherwise panic on addition.
        let timeout = chrono::Duration::from_std(self.visibility_timeout)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        self.session(|doc| {
            let now = Utc::now();
            let receipt = doc.next_receipt;
            let Some(entry) = doc.entries.iter_mut().find(|e| e.visible_at <= now) else {
                return Ok(None);
            };
            entry.receipt = receipt;
            entry.visible_at = now
                .checked_add_signed(timeout)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            let received = ReceivedMessage {
                message: entry.message.clone(),
                handle: MessageHandle {
                    id: entry.id,
                    receipt,
                },
            };
            doc.next_receipt += 1;
            Ok(Some(received))
        })
    }

    fn delete(&self, handle: &MessageHandle) -> Result<(), QueueError> {
        self.session(|doc| {
            match doc.entries.iter().position(|e| e.id == handle.id) {
                Some(pos) if doc.entries[pos].receipt == handle.receipt => {
                    doc.entries.remove(pos);
                    Ok(())
                }
                Some(_) => Err(QueueError::StaleReceipt(handle.id)),
                None => Ok(()),
            }
        })
    }

    fn is_empty(&self) -> Result<bool, QueueError> {
        let _guard = self.lock.lock().map_err(|_| QueueError::LockPoisoned)?;
        let doc = self.read_document()?;
        let now = Utc::now();
        Ok(!doc.entries.iter().any(|e| e.visible_at <= now))
    }
}

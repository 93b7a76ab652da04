//! In-memory queue for tests and single-process runs.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use strata_types::ContinuationMessage;

use crate::queue::{MessageHandle, QueueError, ReceivedMessage, TaskQueue};

struct Entry {
    id: u64,
    receipt: u64,
    visible_at: Instant,
    message: ContinuationMessage,
}

struct Inner {
    next_id: u64,
    next_receipt: u64,
    entries: Vec<Entry>,
}

/// In-process [`TaskQueue`] with the same visibility semantics as the
/// file-backed queue.
pub struct MemoryTaskQueue {
    visibility_timeout: Duration,
    inner: Mutex<Inner>,
}

impl MemoryTaskQueue {
    #[must_use]
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            visibility_timeout,
            inner: Mutex::new(Inner {
                next_id: 1,
                next_receipt: 1,
                entries: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, QueueError> {
        self.inner.lock().map_err(|_| QueueError::LockPoisoned)
    }
}

impl TaskQueue for MemoryTaskQueue {
    fn enqueue(&self, message: &ContinuationMessage) -> Result<(), QueueError> {
        let mut inner = self.lock()?;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            receipt: 0,
            visible_at: Instant::now(),
            message: message.clone(),
        });
        Ok(())
    }

    fn receive_one(&self) -> Result<Option<ReceivedMessage>, QueueError> {
        let mut inner = self.lock()?;
        let now = Instant::now();
        let receipt = inner.next_receipt;
        let timeout = self.visibility_timeout;
        let Some(entry) = inner.entries.iter_mut().find(|e| e.visible_at <= now) else {
            return Ok(None);
        };
        entry.receipt = receipt;
        entry.visible_at = now + timeout;
        let received = ReceivedMessage {
            message: entry.message.clone(),
            handle: MessageHandle {
                id: entry.id,
                receipt,
            },
        };
        inner.next_receipt += 1;
        Ok(Some(received))
    }

    fn delete(&self, handle: &MessageHandle) -> Result<(), QueueError> {
        let mut inner = self.lock()?;
        match inner.entries.iter().position(|e| e.id == handle.id) {
            Some(pos) if inner.entries[pos].receipt == handle.receipt => {
                inner.entries.remove(pos);
                Ok(())
            }
            Some(_) => Err(QueueError::StaleReceipt(handle.id)),
            // Already deleted; acknowledging twice is harmless.
            None => Ok(()),
        }
    }

    fn is_empty(&self) -> Result<bool, QueueError> {
        let inner = self.lock()?;
        let now = Instant::now();
        Ok(!inner.entries.iter().any(|e| e.visible_at <= now))
    }
}

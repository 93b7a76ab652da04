//! Continuation queue abstraction.
//!
//! An at-least-once message queue hands "run the next stage" work between
//! process invocations. [`TaskQueue::receive_one`] hides the returned
//! message from other receivers for the queue's visibility timeout; a
//! consumer that does not [`TaskQueue::delete`] it in time sees it
//! redelivered. Redelivery is the sole retry mechanism for stage
//! execution, so stage tasks must be idempotent.

pub mod file;
pub mod memory;

use strata_types::ContinuationMessage;

pub use file::FileTaskQueue;
pub use memory::MemoryTaskQueue;

/// Errors produced by queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// File-system I/O failure (file-backed queue).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The queue document or a payload is not valid JSON.
    #[error("queue document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Internal mutex was poisoned by a panicked thread.
    #[error("queue lock poisoned")]
    LockPoisoned,

    /// Delete presented a receipt from a superseded delivery. The message
    /// has been redelivered to another receiver since.
    #[error("stale receipt for message {0}: message was redelivered")]
    StaleReceipt(u64),
}

/// Identifies one *delivery* of a message. The receipt changes on every
/// redelivery, so a worker that outlived its visibility timeout cannot
/// delete the message out from under the worker now holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    pub id: u64,
    pub receipt: u64,
}

/// A message received from the queue, invisible to other receivers until
/// its visibility timeout elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message: ContinuationMessage,
    pub handle: MessageHandle,
}

/// Continuation queue contract.
pub trait TaskQueue: Send + Sync {
    /// Append a message to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on storage failure.
    fn enqueue(&self, message: &ContinuationMessage) -> Result<(), QueueError>;

    /// Receive at most one currently-visible message, hiding it for the
    /// visibility timeout. Returns `Ok(None)` when nothing is visible.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on storage failure.
    fn receive_one(&self) -> Result<Option<ReceivedMessage>, QueueError>;

    /// Acknowledge a delivery, removing the message permanently.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::StaleReceipt`] when the delivery has been
    /// superseded, or [`QueueError`] on storage failure.
    fn delete(&self, handle: &MessageHandle) -> Result<(), QueueError>;

    /// `true` when no message is currently visible. In-flight (invisible)
    /// messages do not count, mirroring a peek on a hosted queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on storage failure.
    fn is_empty(&self) -> Result<bool, QueueError>;
}

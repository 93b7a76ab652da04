//! Checkpoint store error types.

/// Errors produced by [`CheckpointStore`](crate::CheckpointStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// File-system I/O failure (reading, temp-writing, or renaming the
    /// checkpoint document).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The checkpoint document is not valid JSON.
    #[error("checkpoint document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The checkpoint document parsed but is not a JSON object.
    #[error("checkpoint document at {0} is not a JSON object")]
    NotAnObject(String),

    /// Internal mutex was poisoned by a panicked thread.
    #[error("checkpoint store lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StateError>;

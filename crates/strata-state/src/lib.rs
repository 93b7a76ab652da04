//! Checkpoint persistence for Strata pipelines.
//!
//! Provides the [`CheckpointStore`]: a durable key→watermark document used
//! by extraction tasks to resume incrementally across invocations.

#![warn(clippy::pedantic)]

pub mod checkpoint;
pub mod error;

pub use checkpoint::CheckpointStore;
pub use error::StateError;

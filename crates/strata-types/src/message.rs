//! Continuation queue payload.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Payload handed between worker invocations through the task queue.
///
/// `stage` is the stage to execute now; `remaining` is the ordered list of
/// stages after it. `remaining` never contains `stage` and is never
/// reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationMessage {
    /// Path to the pipeline configuration the worker should load.
    pub config_path: String,
    /// Stage to execute in this invocation.
    pub stage: Stage,
    /// Stages still to run after `stage`, in order.
    pub remaining: Vec<Stage>,
}

impl ContinuationMessage {
    /// Build the first message for an execution order.
    ///
    /// Returns `None` when the order is empty (nothing to schedule).
    #[must_use]
    pub fn head(config_path: impl Into<String>, order: &[Stage]) -> Option<Self> {
        let (first, rest) = order.split_first()?;
        Some(Self {
            config_path: config_path.into(),
            stage: *first,
            remaining: rest.to_vec(),
        })
    }

    /// The follow-on message to enqueue after this stage succeeds, or
    /// `None` when no stages remain.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        let (first, rest) = self.remaining.split_first()?;
        Some(Self {
            config_path: self.config_path.clone(),
            stage: *first,
            remaining: rest.to_vec(),
        })
    }
}

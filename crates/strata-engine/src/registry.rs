//! Registered-function abstractions for pluggable pipeline behavior.
//!
//! Extraction connectors and transformation bodies are host-supplied: the
//! process registers implementations at startup under explicit names, and
//! stage construction resolves them from these registries. Nothing is
//! loaded or looked up at run time by path or script name.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use strata_state::CheckpointStore;
use strata_types::Stage;

use crate::config::types::SourceConfig;

/// One stage's injected task: a zero-argument callable returning a
/// human-readable summary of its outputs.
pub trait StageTask: Send + Sync {
    /// Execute the stage.
    ///
    /// # Errors
    ///
    /// Propagates whatever the underlying task fails with; the driver wraps
    /// it with stage context.
    fn run(&self) -> anyhow::Result<String>;
}

impl<F> StageTask for F
where
    F: Fn() -> anyhow::Result<String> + Send + Sync,
{
    fn run(&self) -> anyhow::Result<String> {
        self()
    }
}

/// Per-stage task bindings for one driver.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<Stage, Box<dyn StageTask>>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `task` to `stage`, replacing any previous binding.
    pub fn register(&mut self, stage: Stage, task: Box<dyn StageTask>) {
        self.tasks.insert(stage, task);
    }

    #[must_use]
    pub fn get(&self, stage: Stage) -> Option<&dyn StageTask> {
        self.tasks.get(&stage).map(Box::as_ref)
    }

    #[must_use]
    pub fn is_registered(&self, stage: Stage) -> bool {
        self.tasks.contains_key(&stage)
    }
}

/// Extraction connector interface.
///
/// Implementations read from a source system into the landing directory and
/// may consult the checkpoint store for incremental watermarks. They must
/// be safe to re-run: the queue's at-least-once delivery can replay a
/// stage, so outputs are overwritten, never appended.
pub trait Extractor: Send + Sync {
    /// Extract all configured tables of `source` into `landing`, returning
    /// the names of the datasets produced.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be read or landed.
    fn extract(
        &self,
        source: &SourceConfig,
        landing: &Path,
        checkpoints: &CheckpointStore,
    ) -> anyhow::Result<Vec<String>>;
}

/// Extractors keyed by source `type`.
#[derive(Default, Clone)]
pub struct ExtractorRegistry {
    by_type: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source_type: impl Into<String>, extractor: Arc<dyn Extractor>) {
        self.by_type.insert(source_type.into(), extractor);
    }

    #[must_use]
    pub fn get(&self, source_type: &str) -> Option<&Arc<dyn Extractor>> {
        self.by_type.get(source_type)
    }
}

/// Everything a transformation sees: its name plus explicit input/output
/// locations derived from the stage layout at construction time.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// Registered transformation name.
    pub name: &'a str,
    /// Directory holding the previous stage's outputs.
    pub input_path: &'a Path,
    /// Directory this transformation writes into.
    pub output_path: &'a Path,
}

/// Transformation interface: consumes named input locations, produces
/// datasets, returns their names.
pub trait Transform: Send + Sync {
    /// Apply the transformation.
    ///
    /// # Errors
    ///
    /// Returns an error when inputs are missing or the transformation
    /// itself fails.
    fn apply(&self, ctx: &TransformContext<'_>) -> anyhow::Result<Vec<String>>;
}

/// Transformations keyed by registered name.
#[derive(Default, Clone)]
pub struct TransformRegistry {
    by_name: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, transform: Arc<dyn Transform>) {
        self.by_name.insert(name.into(), transform);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transform>> {
        self.by_name.get(name)
    }
}

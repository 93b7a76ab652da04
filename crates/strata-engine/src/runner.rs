//! Driver assembly from configuration and registries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use strata_state::CheckpointStore;
use strata_types::Stage;

use crate::config::parser::parse_pipeline;
use crate::config::types::PipelineConfig;
use crate::config::validator::validate_pipeline;
use crate::driver::Driver;
use crate::queue::FileTaskQueue;
use crate::registry::{ExtractorRegistry, TaskRegistry, TransformRegistry};
use crate::stages::{BronzeTask, TransformTask};

/// Host-supplied behavior: the extractors and transformations the
/// pipeline's configuration may reference.
#[derive(Default, Clone)]
pub struct Registries {
    pub extractors: ExtractorRegistry,
    pub transforms: TransformRegistry,
}

/// Load, validate, and wire a pipeline into a ready [`Driver`].
///
/// Every invocation rebuilds the full task set from scratch; there is no
/// cached state besides what the checkpoint document holds on disk.
///
/// # Errors
///
/// Returns an error when the configuration cannot be parsed or fails
/// semantic validation, or the checkpoint store cannot be opened.
pub fn create_driver(config_path: &Path, registries: &Registries) -> Result<Driver> {
    let config = parse_pipeline(config_path)?;
    validate_pipeline(&config)?;

    let checkpoints = Arc::new(
        CheckpointStore::open(&config.stages.bronze.checkpoint_path).with_context(|| {
            format!(
                "Failed to open checkpoint store {}",
                config.stages.bronze.checkpoint_path.display()
            )
        })?,
    );

    let mut tasks = TaskRegistry::new();
    tasks.register(
        Stage::Bronze,
        Box::new(BronzeTask::new(
            config.pipeline.clone(),
            config.sources.clone(),
            config.stages.bronze.clone(),
            registries.extractors.clone(),
            checkpoints,
        )),
    );
    tasks.register(
        Stage::Silver,
        Box::new(TransformTask::new(
            config.pipeline.clone(),
            config.stages.silver.transformations.clone(),
            registries.transforms.clone(),
            config.stages.bronze.local_path.clone(),
            config.stages.silver.local_path.clone(),
            config.stages.silver.contracts_path.clone(),
        )),
    );
    tasks.register(
        Stage::Gold,
        Box::new(TransformTask::new(
            config.pipeline.clone(),
            config.stages.gold.transformations.clone(),
            registries.transforms.clone(),
            config.stages.silver.local_path.clone(),
            config.stages.gold.local_path.clone(),
            config.stages.gold.contracts_path.clone(),
        )),
    );

    Ok(Driver::new(config, tasks))
}

/// Open the configured file-backed continuation queue.
///
/// # Errors
///
/// Returns an error when the queue document cannot be created or read.
pub fn open_queue(config: &PipelineConfig) -> Result<FileTaskQueue> {
    FileTaskQueue::open(
        &config.queue.path,
        Duration::from_secs(config.queue.visibility_timeout_secs),
    )
    .with_context(|| format!("Failed to open queue {}", config.queue.path.display()))
}

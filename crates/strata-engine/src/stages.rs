//! Concrete stage tasks.
//!
//! Each task owns everything it needs at construction time: registries,
//! resolved paths, and the checkpoint store. Derived locations (one
//! stage's output feeding the next stage's input) are computed once when
//! the driver is wired, so a running task never consults global state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use strata_state::CheckpointStore;

use crate::config::types::{BronzeStageConfig, SourceConfig};
use crate::contracts::{ContractLoader, ContractValidator, Dataset};
use crate::registry::{ExtractorRegistry, StageTask, TransformContext, TransformRegistry};

/// Raw extraction: lands every configured source into the bronze
/// directory through the extractor registry.
pub struct BronzeTask {
    pipeline: String,
    sources: Vec<SourceConfig>,
    config: BronzeStageConfig,
    extractors: ExtractorRegistry,
    checkpoints: Arc<CheckpointStore>,
}

impl BronzeTask {
    #[must_use]
    pub fn new(
        pipeline: String,
        sources: Vec<SourceConfig>,
        config: BronzeStageConfig,
        extractors: ExtractorRegistry,
        checkpoints: Arc<CheckpointStore>,
    ) -> Self {
        Self {
            pipeline,
            sources,
            config,
            extractors,
            checkpoints,
        }
    }
}

impl StageTask for BronzeTask {
    fn run(&self) -> Result<String> {
        std::fs::create_dir_all(&self.config.local_path).with_context(|| {
            format!(
                "Failed to create landing directory {}",
                self.config.local_path.display()
            )
        })?;

        let mut produced = Vec::new();
        for source in &self.sources {
            let Some(extractor) = self.extractors.get(&source.source_type) else {
                bail!(
                    "no extractor registered for source type '{}' (source '{}')",
                    source.source_type,
                    source.name
                );
            };
            tracing::info!(
                pipeline = self.pipeline,
                source = source.name,
                source_type = source.source_type,
                "Extracting source"
            );
            let datasets = extractor
                .extract(source, &self.config.local_path, &self.checkpoints)
                .with_context(|| format!("Extraction failed for source '{}'", source.name))?;
            produced.extend(datasets);
        }

        enforce_contracts(
            self.config.contracts_path.as_deref(),
            &self.config.local_path,
            &produced,
        )?;
        Ok(summarize("landed", &produced))
    }
}

/// Refinement or aggregation: runs the stage's configured transformations
/// through the transform registry against explicit input and output
/// directories.
pub struct TransformTask {
    pipeline: String,
    transformations: Vec<String>,
    transforms: TransformRegistry,
    input_path: PathBuf,
    output_path: PathBuf,
    contracts_path: Option<PathBuf>,
}

impl TransformTask {
    #[must_use]
    pub fn new(
        pipeline: String,
        transformations: Vec<String>,
        transforms: TransformRegistry,
        input_path: PathBuf,
        output_path: PathBuf,
        contracts_path: Option<PathBuf>,
    ) -> Self {
        Self {
            pipeline,
            transformations,
            transforms,
            input_path,
            output_path,
            contracts_path,
        }
    }
}

impl StageTask for TransformTask {
    fn run(&self) -> Result<String> {
        std::fs::create_dir_all(&self.output_path).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.output_path.display()
            )
        })?;

        let mut produced = Vec::new();
        for name in &self.transformations {
            let Some(transform) = self.transforms.get(name) else {
                bail!("no transformation registered under '{name}'");
            };
            tracing::info!(pipeline = self.pipeline, transformation = name, "Applying transformation");
            let ctx = TransformContext {
                name,
                input_path: &self.input_path,
                output_path: &self.output_path,
            };
            let datasets = transform
                .apply(&ctx)
                .with_context(|| format!("Transformation '{name}' failed"))?;
            produced.extend(datasets);
        }

        enforce_contracts(self.contracts_path.as_deref(), &self.output_path, &produced)?;
        Ok(summarize("produced", &produced))
    }
}

/// Validate every produced dataset that has a contract in the stage's
/// contracts directory. Datasets without a contract pass through
/// unchecked; a failing verdict fails the stage.
fn enforce_contracts(
    contracts_path: Option<&Path>,
    stage_dir: &Path,
    datasets: &[String],
) -> Result<()> {
    let Some(contracts_path) = contracts_path else {
        return Ok(());
    };
    let loader = ContractLoader::new(contracts_path);
    let known = loader.list_contracts()?;
    let validator = ContractValidator::new(loader);
    for name in datasets {
        if !known.iter().any(|k| k == name) {
            continue;
        }
        let artifact = stage_dir.join(format!("{name}.ndjson"));
        let dataset = Dataset::from_ndjson(&artifact, name)
            .with_context(|| format!("Failed to load dataset '{name}' for validation"))?;
        validator.validate_and_report(name, &dataset, true)?;
    }
    Ok(())
}

fn summarize(verb: &str, datasets: &[String]) -> String {
    if datasets.is_empty() {
        format!("{verb} 0 datasets")
    } else {
        format!("{verb} {} dataset(s): {}", datasets.len(), datasets.join(", "))
    }
}

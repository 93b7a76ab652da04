//! Built-in extractors and transformations.
//!
//! The engine resolves extractors and transformations from registries the
//! host populates; the CLI ships two file-based implementations so a
//! pipeline over local artifacts runs end to end without custom code.
//! Integrations register their own implementations alongside these.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use strata_engine::config::types::SourceConfig;
use strata_engine::registry::{Extractor, Transform, TransformContext};
use strata_engine::runner::Registries;
use strata_state::CheckpointStore;

/// Source type `local`: copies `<connection.path>/<table>.ndjson` into the
/// landing directory and checkpoints each table's source modification
/// time.
pub struct LocalFileExtractor;

impl Extractor for LocalFileExtractor {
    fn extract(
        &self,
        source: &SourceConfig,
        landing: &Path,
        checkpoints: &CheckpointStore,
    ) -> Result<Vec<String>> {
        let Some(base) = source.connection.get("path").and_then(|v| v.as_str()) else {
            bail!("local source '{}' requires connection.path", source.name);
        };
        let base = Path::new(base);

        let mut produced = Vec::new();
        for table in &source.tables {
            let artifact = format!("{}.ndjson", table.name);
            let src = base.join(&artifact);
            let dst = landing.join(&artifact);
            fs::copy(&src, &dst)
                .with_context(|| format!("Failed to copy {} to landing", src.display()))?;

            let modified: DateTime<Utc> = fs::metadata(&src)?.modified()?.into();
            checkpoints.update(
                &source.checkpoint_key_for(&table.name),
                serde_json::json!(modified.to_rfc3339()),
            )?;
            produced.push(table.name.clone());
        }
        Ok(produced)
    }
}

/// Transformation `passthrough`: copies every `*.ndjson` artifact from the
/// input directory to the output directory unchanged.
pub struct PassthroughTransform;

impl Transform for PassthroughTransform {
    fn apply(&self, ctx: &TransformContext<'_>) -> Result<Vec<String>> {
        let mut produced = Vec::new();
        for entry in fs::read_dir(ctx.input_path)
            .with_context(|| format!("Failed to read {}", ctx.input_path.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("ndjson") {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            fs::copy(&path, ctx.output_path.join(name))?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                produced.push(stem.to_string());
            }
        }
        produced.sort();
        Ok(produced)
    }
}

/// The registries the CLI wires drivers with.
#[must_use]
pub fn registries() -> Registries {
    let mut registries = Registries::default();
    registries
        .extractors
        .register("local", std::sync::Arc::new(LocalFileExtractor));
    registries
        .transforms
        .register("passthrough", std::sync::Arc::new(PassthroughTransform));
    registries
}

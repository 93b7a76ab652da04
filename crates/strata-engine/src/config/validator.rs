//! Semantic validation for parsed pipeline configuration values.

use anyhow::{bail, Result};

use crate::config::types::PipelineConfig;

/// Validate a parsed pipeline configuration.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the pipeline
/// config.
pub fn validate_pipeline(config: &PipelineConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.pipeline.trim().is_empty() {
        errors.push("Pipeline name must not be empty".to_string());
    }

    if config.sources.is_empty() {
        errors.push("Pipeline must define at least one source".to_string());
    }

    for (i, source) in config.sources.iter().enumerate() {
        if source.name.trim().is_empty() {
            errors.push(format!("Source {i} has an empty name"));
        }
        if source.source_type.trim().is_empty() {
            errors.push(format!("Source '{}' has an empty type", source.name));
        }
        if source.tables.is_empty() {
            errors.push(format!("Source '{}' defines no tables", source.name));
        }
        for table in &source.tables {
            if table.name.trim().is_empty() {
                errors.push(format!("Source '{}' has a table with an empty name", source.name));
            }
        }
    }

    for (stage, transformations) in [
        ("silver", &config.stages.silver.transformations),
        ("gold", &config.stages.gold.transformations),
    ] {
        for (i, name) in transformations.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(format!("{stage}: transformations[{i}] has an empty name"));
            }
        }
    }

    if config.queue.visibility_timeout_secs == 0 {
        errors.push("queue.visibility_timeout_secs must be > 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Pipeline validation failed:\n  - {}", errors.join("\n  - "));
    }
}

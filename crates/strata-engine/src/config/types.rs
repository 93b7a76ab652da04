//! Typed pipeline configuration structs.
//!
//! Stage configuration is deliberately explicit: one immutable struct per
//! stage, populated once at load time. Derived values (one stage's output
//! path feeding the next stage's input) are passed as constructor
//! parameters when stage tasks are built, never injected back into these
//! structs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default queue visibility timeout, matching the hosted-queue default.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: u64 = 300;

/// One table to extract from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    /// Column used as the incremental high-water mark. Absent means full
    /// reloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_column: Option<String>,
}

/// A logical source system feeding the bronze stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Extractor registry key (e.g. `"postgres"`, `"azure_sql"`).
    #[serde(rename = "type")]
    pub source_type: String,
    /// Opaque connection parameters, interpreted by the extractor.
    #[serde(default)]
    pub connection: serde_json::Value,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    /// Override for the checkpoint key prefix; defaults to the source name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_key: Option<String>,
}

impl SourceConfig {
    /// Checkpoint key scoping a table's watermark to this source.
    #[must_use]
    pub fn checkpoint_key_for(&self, table: &str) -> String {
        let prefix = self.checkpoint_key.as_deref().unwrap_or(&self.name);
        format!("{prefix}.{table}")
    }
}

/// Bronze (raw extraction) stage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BronzeStageConfig {
    /// Landing directory for extracted datasets.
    pub local_path: PathBuf,
    /// Checkpoint document location.
    pub checkpoint_path: PathBuf,
    /// Directory of data contracts gating this stage's outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts_path: Option<PathBuf>,
}

/// Silver (refinement) stage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilverStageConfig {
    pub local_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts_path: Option<PathBuf>,
    /// Transform registry keys to run, in order.
    #[serde(default)]
    pub transformations: Vec<String>,
}

/// Gold (aggregation) stage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldStageConfig {
    pub local_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts_path: Option<PathBuf>,
    #[serde(default)]
    pub transformations: Vec<String>,
}

/// Per-stage configuration blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagesConfig {
    pub bronze: BronzeStageConfig,
    pub silver: SilverStageConfig,
    pub gold: GoldStageConfig,
}

/// Monitoring sink locations.
///
/// The engine resolves these paths but never writes them itself; they are
/// reserved for whatever host-side monitor tails a run's logs and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_path: PathBuf,
    pub metrics_path: PathBuf,
}

/// Continuation queue parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue document location (file-backed queue).
    pub path: PathBuf,
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_secs: u64,
}

fn default_visibility_timeout() -> u64 {
    DEFAULT_VISIBILITY_TIMEOUT_SECS
}

/// Resolved pipeline configuration.
///
/// Owned by the process for the lifetime of one invocation; never mutated
/// after load except for the one-time path normalization performed by the
/// parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub pipeline: String,
    pub sources: Vec<SourceConfig>,
    pub stages: StagesConfig,
    pub monitoring: MonitoringConfig,
    pub queue: QueueConfig,
}

impl PipelineConfig {
    /// Resolve all relative paths against `base` (the config file's
    /// directory). Called exactly once by the parser.
    pub(crate) fn normalize_paths(&mut self, base: &Path) {
        resolve(&mut self.stages.bronze.local_path, base);
        resolve(&mut self.stages.bronze.checkpoint_path, base);
        resolve_opt(&mut self.stages.bronze.contracts_path, base);
        resolve(&mut self.stages.silver.local_path, base);
        resolve_opt(&mut self.stages.silver.contracts_path, base);
        resolve(&mut self.stages.gold.local_path, base);
        resolve_opt(&mut self.stages.gold.contracts_path, base);
        resolve(&mut self.monitoring.log_path, base);
        resolve(&mut self.monitoring.metrics_path, base);
        resolve(&mut self.queue.path, base);
    }
}

fn resolve(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&path);
    }
}

fn resolve_opt(path: &mut Option<PathBuf>, base: &Path) {
    if let Some(p) = path {
        resolve(p, base);
    }
}

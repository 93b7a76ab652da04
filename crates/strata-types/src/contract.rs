//! Data contract document model.
//!
//! A contract is a versioned YAML document declaring a dataset's expected
//! schema, quality rules, and service-level expectations. Contracts are
//! immutable once loaded; the engine's `contracts` module owns parsing and
//! enforcement.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Per-rule classification controlling whether a violation fails validation
/// or is merely reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Error
    }
}

impl Severity {
    /// Bucket a violation message by declared severity.
    ///
    /// Shared by the schema-constraint and quality-rule validators so the
    /// error-vs-warning decision lives in exactly one place.
    pub fn bucket(self, message: String, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
        match self {
            Self::Error => errors.push(message),
            Self::Warning => warnings.push(message),
        }
    }
}

/// A single column constraint, written in contracts as a one-key mapping
/// (`- not_null: true`, `- min_value: 0`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnConstraint {
    NotNull(bool),
    Unique(bool),
    MinValue(f64),
    MaxValue(f64),
    AllowedValues(Vec<serde_json::Value>),
    Pattern(String),
}

/// Declared shape of one dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ColumnConstraint>,
}

fn default_nullable() -> bool {
    true
}

/// Recognized quality rule kinds. Contracts carry the raw string so an
/// unknown kind degrades to a warning instead of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Uniqueness,
    NotNull,
    Volume,
    CustomSql,
    Unknown,
}

/// A contract-declared quality rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRule {
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rows: Option<i64>,
}

impl QualityRule {
    /// Classify the raw rule type string.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self.rule_type.as_str() {
            "uniqueness" => RuleKind::Uniqueness,
            "not_null" => RuleKind::NotNull,
            "volume" => RuleKind::Volume,
            "custom_sql" => RuleKind::CustomSql,
            _ => RuleKind::Unknown,
        }
    }
}

/// Freshness expectation: the dataset's backing artifact must be no older
/// than `max_age_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    pub max_age_hours: f64,
}

/// Completeness expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completeness {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_row_count: Option<i64>,
    /// Recognized but not evaluated: there is no historical baseline to
    /// compare against, so the SLA validator reports it as an
    /// unimplemented warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_growth_rate: Option<f64>,
}

/// Service-level expectations for a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sla {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<Freshness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness: Option<Completeness>,
}

/// Contract evolution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPolicy {
    #[serde(default = "default_true")]
    pub backward_compatible: bool,
    #[serde(default)]
    pub breaking_changes_allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_notice_days: Option<u32>,
}

fn default_true() -> bool {
    true
}

/// Declared schema: an ordered list of column definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

/// A complete, versioned data contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContract {
    pub version: String,
    pub dataset: String,
    pub stage: Stage,
    pub owner: String,
    pub description: String,
    pub schema: SchemaDefinition,
    pub quality_rules: Vec<QualityRule>,
    pub sla: Sla,
    pub evolution: EvolutionPolicy,
}

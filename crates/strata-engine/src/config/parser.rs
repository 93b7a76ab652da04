//! Pipeline YAML parsing with environment variable substitution.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::types::PipelineConfig;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex"));

/// Substitute `${VAR_NAME}` patterns with environment variable values.
///
/// # Errors
///
/// Returns an error naming every referenced environment variable that is
/// not set.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();
    let mut missing = Vec::new();

    for cap in ENV_VAR_RE.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(val) => {
                result = result.replace(&cap[0], &val);
            }
            Err(_) => {
                missing.push(var_name.to_string());
            }
        }
    }

    if !missing.is_empty() {
        anyhow::bail!("Missing environment variable(s): {}", missing.join(", "));
    }

    Ok(result)
}

/// Parse a pipeline YAML string (after env var substitution). Paths stay
/// as written; callers that know the config file location should prefer
/// [`parse_pipeline`].
///
/// # Errors
///
/// Returns an error if env var substitution fails or the YAML is invalid.
pub fn parse_pipeline_str(yaml_str: &str) -> Result<PipelineConfig> {
    let substituted = substitute_env_vars(yaml_str)?;
    let config: PipelineConfig =
        serde_yaml::from_str(&substituted).context("Failed to parse pipeline YAML")?;
    Ok(config)
}

/// Parse a pipeline YAML file and normalize its relative paths against the
/// file's directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the YAML is invalid.
pub fn parse_pipeline(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline file: {}", path.display()))?;
    let mut config = parse_pipeline_str(&content)?;
    if let Some(base) = path.parent() {
        config.normalize_paths(base);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
pipeline: sales
sources:
  - name: crm
    type: postgres
    connection:
      host: ${STRATA_TEST_HOST}
    tables:
      - name: customers
        cursor_column: updated_at
stages:
  bronze:
    local_path: data/bronze
    checkpoint_path: state/checkpoints.json
  silver:
    local_path: data/silver
    transformations: [clean_customers]
  gold:
    local_path: data/gold
monitoring:
  log_path: logs/run.log
  metrics_path: logs/metrics.json
queue:
  path: state/queue.json
  visibility_timeout_secs: 60
"#
    }

    #[test]
    fn env_var_substitution_replaces_all_occurrences() {
        std::env::set_var("STRATA_TEST_A", "alpha");
        std::env::set_var("STRATA_TEST_B", "beta");
        let result = substitute_env_vars("${STRATA_TEST_A} and ${STRATA_TEST_B}").unwrap();
        assert_eq!(result, "alpha and beta");
        std::env::remove_var("STRATA_TEST_A");
        std::env::remove_var("STRATA_TEST_B");
    }

    #[test]
    fn no_env_vars_passthrough() {
        let input = "host: localhost\nport: 5432";
        assert_eq!(substitute_env_vars(input).unwrap(), input);
    }

    #[test]
    fn missing_env_vars_all_reported() {
        let result = substitute_env_vars("${STRATA_MISSING_X} and ${STRATA_MISSING_Y}");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("STRATA_MISSING_X"));
        assert!(err.contains("STRATA_MISSING_Y"));
    }

    #[test]
    fn parse_pipeline_from_string() {
        std::env::set_var("STRATA_TEST_HOST", "db.internal");
        let config = parse_pipeline_str(minimal_yaml()).unwrap();
        assert_eq!(config.pipeline, "sales");
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].connection["host"], "db.internal");
        assert_eq!(config.sources[0].tables[0].cursor_column.as_deref(), Some("updated_at"));
        assert_eq!(config.stages.silver.transformations, vec!["clean_customers"]);
        assert_eq!(config.queue.visibility_timeout_secs, 60);
    }

    #[test]
    fn parse_invalid_yaml_errors() {
        let result = parse_pipeline_str("this is not: [valid: yaml: {{{}}}");
        assert!(result.is_err());
    }

    #[test]
    fn parse_pipeline_file_not_found() {
        let result = parse_pipeline(Path::new("/nonexistent/pipeline.yaml"));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read pipeline file"));
    }

    #[test]
    fn parse_pipeline_file_normalizes_paths() {
        std::env::set_var("STRATA_TEST_HOST", "db.internal");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yml");
        std::fs::write(&path, minimal_yaml()).unwrap();

        let config = parse_pipeline(&path).unwrap();
        assert_eq!(config.stages.bronze.local_path, dir.path().join("data/bronze"));
        assert_eq!(config.queue.path, dir.path().join("state/queue.json"));
    }
}

//! SLA validation pass.

use std::time::SystemTime;

use strata_types::{DataContract, ValidationPhase, ValidationReport};

use crate::contracts::dataset::Dataset;

/// Check freshness and completeness expectations.
///
/// Freshness is judged from the backing artifact's modification time; an
/// artifact that cannot be inspected fails the check rather than passing
/// silently.
#[must_use]
pub fn validate_sla(contract: &DataContract, dataset: &Dataset) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(freshness) = &contract.sla.freshness {
        check_freshness(dataset, freshness.max_age_hours, &mut errors);
    }

    if let Some(completeness) = &contract.sla.completeness {
        if let Some(min_rows) = completeness.min_row_count {
            match dataset.row_count() {
                Ok(rows) if rows < min_rows => errors.push(format!(
                    "Row count {rows} below completeness minimum {min_rows}"
                )),
                Ok(_) => {}
                Err(err) => errors.push(format!("Completeness check failed: {err}")),
            }
        }
        if completeness.expected_growth_rate.is_some() {
            warnings.push(
                "expected_growth_rate is not implemented (no historical baseline), skipped"
                    .to_string(),
            );
        }
    }

    ValidationReport::new(ValidationPhase::Sla, errors, warnings)
}

fn check_freshness(dataset: &Dataset, max_age_hours: f64, errors: &mut Vec<String>) {
    let artifact = dataset.artifact_path();
    let modified = match std::fs::metadata(artifact).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(err) => {
            errors.push(format!(
                "Freshness check failed: cannot inspect artifact '{}': {err}",
                artifact.display()
            ));
            return;
        }
    };
    let age_hours = SystemTime::now()
        .duration_since(modified)
        .map_or(0.0, |age| age.as_secs_f64() / 3600.0);
    if age_hours > max_age_hours {
        errors.push(format!(
            "Artifact is {age_hours:.1}h old, exceeding freshness SLA of {max_age_hours}h"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn dataset(rows: usize) -> (tempfile::TempDir, Dataset) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let content: String = (0..rows).map(|i| format!("{{\"id\": {i}}}\n")).collect();
        fs::write(&path, content).unwrap();
        let dataset = Dataset::from_ndjson(&path, "events").unwrap();
        (dir, dataset)
    }

    fn contract(sla_yaml: &str) -> DataContract {
        serde_yaml::from_str(&format!(
            r"
version: 1.0.0
dataset: events
stage: bronze
owner: data-eng
description: test
schema:
  columns: []
quality_rules: []
sla:
{sla_yaml}
evolution: {{}}
"
        ))
        .unwrap()
    }

    #[test]
    fn fresh_artifact_within_window_passes() {
        let (_dir, data) = dataset(5);
        let c = contract("  freshness:\n    max_age_hours: 24\n");
        assert!(validate_sla(&c, &data).passed);
    }

    #[test]
    fn missing_artifact_fails_freshness() {
        let (dir, data) = dataset(5);
        fs::remove_file(dir.path().join("events.ndjson")).unwrap();
        let c = contract("  freshness:\n    max_age_hours: 24\n");
        let report = validate_sla(&c, &data);
        assert!(!report.passed);
        assert!(report.errors[0].starts_with("Freshness check failed"));
    }

    #[test]
    fn stale_artifact_fails_freshness() {
        let (_dir, data) = dataset(5);
        // A zero-hour window makes any existing artifact stale.
        let c = contract("  freshness:\n    max_age_hours: 0\n");
        std::thread::sleep(std::time::Duration::from_millis(20));
        let report = validate_sla(&c, &data);
        assert!(!report.passed);
        assert!(report.errors[0].contains("freshness SLA"));
    }

    #[test]
    fn completeness_minimum_enforced() {
        let (_dir, data) = dataset(3);
        let c = contract("  completeness:\n    min_row_count: 10\n");
        let report = validate_sla(&c, &data);
        assert_eq!(
            report.errors,
            vec!["Row count 3 below completeness minimum 10"]
        );

        let (_dir, data) = dataset(10);
        assert!(validate_sla(&c, &data).passed);
    }

    #[test]
    fn growth_rate_is_an_explicit_unimplemented_warning() {
        let (_dir, data) = dataset(3);
        let c = contract("  completeness:\n    expected_growth_rate: 0.1\n");
        let report = validate_sla(&c, &data);
        assert!(report.passed);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("not implemented"));
    }

    #[test]
    fn empty_sla_passes_vacuously() {
        let (_dir, data) = dataset(0);
        let c = contract("  {}");
        let report = validate_sla(&c, &data);
        assert!(report.passed);
        assert!(report.warnings.is_empty());
    }
}

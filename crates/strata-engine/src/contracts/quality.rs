//! Quality rule validation pass.

use strata_types::{DataContract, QualityRule, RuleKind, ValidationPhase, ValidationReport};

use crate::contracts::dataset::{Dataset, DatasetError};

/// Run every quality rule of the contract against the dataset.
///
/// Each violation is bucketed by the rule's declared severity. The pass
/// always completes: a misconfigured rule or one whose query faults
/// becomes an error entry, never an abort, and an unrecognized rule type
/// degrades to a warning.
#[must_use]
pub fn validate_quality(contract: &DataContract, dataset: &Dataset) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for rule in &contract.quality_rules {
        match run_rule(rule, dataset) {
            Ok(RuleOutcome::Pass) => {}
            Ok(RuleOutcome::Violation(message)) => {
                rule.severity.bucket(message, &mut errors, &mut warnings);
            }
            Ok(RuleOutcome::Skipped(message)) => warnings.push(message),
            Ok(RuleOutcome::Misconfigured(message)) => errors.push(message),
            Err(err) => errors.push(format!("Rule '{}' failed to execute: {err}", rule.name)),
        }
    }

    ValidationReport::new(ValidationPhase::Quality, errors, warnings)
}

enum RuleOutcome {
    Pass,
    Violation(String),
    Skipped(String),
    Misconfigured(String),
}

fn run_rule(rule: &QualityRule, dataset: &Dataset) -> Result<RuleOutcome, DatasetError> {
    match rule.kind() {
        RuleKind::Uniqueness => {
            let Some(column) = rule.column.as_deref() else {
                return Ok(missing_field(rule, "column"));
            };
            let groups = dataset.duplicate_group_count(column)?;
            Ok(if groups > 0 {
                RuleOutcome::Violation(format!(
                    "Rule '{}': column '{column}' has {groups} duplicate value group(s)",
                    rule.name
                ))
            } else {
                RuleOutcome::Pass
            })
        }
        RuleKind::NotNull => {
            let Some(column) = rule.column.as_deref() else {
                return Ok(missing_field(rule, "column"));
            };
            let nulls = dataset.null_count(column)?;
            Ok(if nulls > 0 {
                RuleOutcome::Violation(format!(
                    "Rule '{}': column '{column}' has {nulls} null value(s)",
                    rule.name
                ))
            } else {
                RuleOutcome::Pass
            })
        }
        RuleKind::Volume => {
            let Some(min_rows) = rule.min_rows else {
                return Ok(missing_field(rule, "min_rows"));
            };
            let rows = dataset.row_count()?;
            Ok(if rows < min_rows {
                RuleOutcome::Violation(format!(
                    "Rule '{}': row count {rows} below minimum {min_rows}",
                    rule.name
                ))
            } else {
                RuleOutcome::Pass
            })
        }
        RuleKind::CustomSql => {
            let Some(query) = rule.query.as_deref() else {
                return Ok(missing_field(rule, "query"));
            };
            let sql = dataset.render_sql(query);
            let Some(actual) = dataset.query_scalar(&sql)? else {
                return Ok(RuleOutcome::Misconfigured(format!(
                    "Rule '{}': query returned no rows",
                    rule.name
                )));
            };
            Ok(match &rule.expected {
                Some(expected) if values_match(&actual, expected) => RuleOutcome::Pass,
                Some(expected) => RuleOutcome::Violation(format!(
                    "Rule '{}': query returned {actual}, expected {expected}",
                    rule.name
                )),
                // No expectation: the scalar is a violation count.
                None => match actual.as_i64() {
                    Some(0) => RuleOutcome::Pass,
                    Some(n) => RuleOutcome::Violation(format!(
                        "Rule '{}': query found {n} violation(s)",
                        rule.name
                    )),
                    None => RuleOutcome::Misconfigured(format!(
                        "Rule '{}': query returned non-integer {actual} with no expected value",
                        rule.name
                    )),
                },
            })
        }
        RuleKind::Unknown => Ok(RuleOutcome::Skipped(format!(
            "Rule '{}' has unknown type '{}', skipped",
            rule.name, rule.rule_type
        ))),
    }
}

fn missing_field(rule: &QualityRule, field: &str) -> RuleOutcome {
    RuleOutcome::Misconfigured(format!(
        "Rule '{}' ({}) is missing '{field}'",
        rule.name, rule.rule_type
    ))
}

// SQLite hands back integers where a contract may say 3.0; compare
// numerics numerically, everything else structurally.
fn values_match(actual: &serde_json::Value, expected: &serde_json::Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(e)) => (a - e).abs() < f64::EPSILON,
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use strata_types::Severity;

    fn dataset() -> (tempfile::TempDir, Dataset) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.ndjson");
        let mut file = std::fs::File::create(&path).unwrap();
        for line in [
            r#"{"id": 1, "amount": 10, "region": "eu"}"#,
            r#"{"id": 2, "amount": -5, "region": null}"#,
            r#"{"id": 2, "amount": 30, "region": "us"}"#,
        ] {
            writeln!(file, "{line}").unwrap();
        }
        let dataset = Dataset::from_ndjson(&path, "orders").unwrap();
        (dir, dataset)
    }

    fn contract(rules_yaml: &str) -> DataContract {
        serde_yaml::from_str(&format!(
            r"
version: 1.0.0
dataset: orders
stage: gold
owner: data-eng
description: test
schema:
  columns: []
quality_rules:
{rules_yaml}
sla: {{}}
evolution: {{}}
"
        ))
        .unwrap()
    }

    #[test]
    fn uniqueness_violation_is_bucketed_by_severity() {
        let (_dir, data) = dataset();
        let c = contract("  - name: ids_unique\n    type: uniqueness\n    column: id\n");
        let report = validate_quality(&c, &data);
        assert!(!report.passed);
        assert_eq!(
            report.errors,
            vec!["Rule 'ids_unique': column 'id' has 1 duplicate value group(s)"]
        );
    }

    #[test]
    fn warning_severity_never_lands_in_errors() {
        let (_dir, data) = dataset();
        let c = contract(
            "  - name: ids_unique\n    type: uniqueness\n    severity: warning\n    column: id\n",
        );
        assert_eq!(c.quality_rules[0].severity, Severity::Warning);
        let report = validate_quality(&c, &data);
        assert!(report.passed);
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn not_null_and_volume_rules() {
        let (_dir, data) = dataset();
        let c = contract(
            "  - name: region_present\n    type: not_null\n    column: region\n  - name: enough_rows\n    type: volume\n    min_rows: 10\n",
        );
        let report = validate_quality(&c, &data);
        assert_eq!(
            report.errors,
            vec![
                "Rule 'region_present': column 'region' has 1 null value(s)",
                "Rule 'enough_rows': row count 3 below minimum 10",
            ]
        );
    }

    #[test]
    fn custom_sql_with_expected_scalar() {
        let (_dir, data) = dataset();
        let c = contract(
            "  - name: total_amount\n    type: custom_sql\n    query: SELECT SUM(amount) FROM {dataset}\n    expected: 35\n",
        );
        assert!(validate_quality(&c, &data).passed);

        let c = contract(
            "  - name: total_amount\n    type: custom_sql\n    query: SELECT SUM(amount) FROM {dataset}\n    expected: 99\n",
        );
        let report = validate_quality(&c, &data);
        assert_eq!(
            report.errors,
            vec!["Rule 'total_amount': query returned 35, expected 99"]
        );
    }

    #[test]
    fn custom_sql_without_expected_counts_violations() {
        let (_dir, data) = dataset();
        let c = contract(
            "  - name: no_negative_amounts\n    type: custom_sql\n    query: SELECT COUNT(*) FROM {dataset} WHERE amount < 0\n",
        );
        let report = validate_quality(&c, &data);
        assert_eq!(
            report.errors,
            vec!["Rule 'no_negative_amounts': query found 1 violation(s)"]
        );
    }

    #[test]
    fn unknown_rule_type_is_a_warning() {
        let (_dir, data) = dataset();
        let c = contract("  - name: entropy_check\n    type: entropy\n");
        let report = validate_quality(&c, &data);
        assert!(report.passed);
        assert_eq!(
            report.warnings,
            vec!["Rule 'entropy_check' has unknown type 'entropy', skipped"]
        );
    }

    #[test]
    fn misconfigured_rule_is_an_error() {
        let (_dir, data) = dataset();
        let c = contract("  - name: ids_unique\n    type: uniqueness\n");
        let report = validate_quality(&c, &data);
        assert_eq!(
            report.errors,
            vec!["Rule 'ids_unique' (uniqueness) is missing 'column'"]
        );
    }

    #[test]
    fn faulting_rule_does_not_abort_the_pass() {
        let (_dir, data) = dataset();
        let c = contract(
            "  - name: broken\n    type: custom_sql\n    query: SELECT nope FROM {dataset}\n  - name: enough_rows\n    type: volume\n    min_rows: 1\n",
        );
        let report = validate_quality(&c, &data);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Rule 'broken' failed to execute"));
    }
}

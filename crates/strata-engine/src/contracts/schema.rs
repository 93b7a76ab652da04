//! Schema validation pass.

use std::collections::HashSet;

use strata_types::{
    ColumnConstraint, ColumnDefinition, DataContract, Severity, ValidationPhase, ValidationReport,
};

use crate::contracts::dataset::Dataset;

/// Check the dataset's observed columns against the contract's declared
/// schema.
///
/// Columns the contract declares but the data lacks are errors; columns
/// the data carries beyond the contract are warnings only, so additive
/// evolution does not fail downstream consumers. Constraint checks
/// accumulate independently; a check that itself fails to execute becomes
/// an error entry rather than aborting the pass.
#[must_use]
pub fn validate_schema(contract: &DataContract, dataset: &Dataset) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let declared: HashSet<&str> = contract
        .schema
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();

    for column in &contract.schema.columns {
        if !dataset.has_column(&column.name) {
            errors.push(format!("Missing column '{}'", column.name));
            continue;
        }
        check_nullability(column, dataset, &mut errors);
        for constraint in &column.constraints {
            check_constraint(&column.name, constraint, dataset, &mut errors, &mut warnings);
        }
    }

    for column in dataset.columns() {
        if !declared.contains(column.name.as_str()) {
            warnings.push(format!(
                "Unexpected column '{}' not declared in contract",
                column.name
            ));
        }
    }

    ValidationReport::new(ValidationPhase::Schema, errors, warnings)
}

fn check_nullability(column: &ColumnDefinition, dataset: &Dataset, errors: &mut Vec<String>) {
    if column.nullable {
        return;
    }
    match dataset.null_count(&column.name) {
        Ok(0) => {}
        Ok(nulls) => errors.push(format!(
            "Column '{}' is non-nullable but has {nulls} null value(s)",
            column.name
        )),
        Err(err) => errors.push(format!(
            "Nullability check failed for column '{}': {err}",
            column.name
        )),
    }
}

fn check_constraint(
    column: &str,
    constraint: &ColumnConstraint,
    dataset: &Dataset,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let outcome = match constraint {
        ColumnConstraint::NotNull(true) => dataset.null_count(column).map(|n| {
            (n > 0).then(|| {
                (
                    Severity::Error,
                    format!("Column '{column}' has {n} null value(s)"),
                )
            })
        }),
        ColumnConstraint::Unique(true) => dataset.duplicate_group_count(column).map(|n| {
            (n > 0).then(|| {
                (
                    Severity::Error,
                    format!("Column '{column}' has {n} duplicate value group(s)"),
                )
            })
        }),
        ColumnConstraint::MinValue(min) => dataset.count_below(column, *min).map(|n| {
            (n > 0).then(|| {
                (
                    Severity::Error,
                    format!("Column '{column}' has {n} value(s) below minimum {min}"),
                )
            })
        }),
        ColumnConstraint::MaxValue(max) => dataset.count_above(column, *max).map(|n| {
            (n > 0).then(|| {
                (
                    Severity::Error,
                    format!("Column '{column}' has {n} value(s) above maximum {max}"),
                )
            })
        }),
        ColumnConstraint::AllowedValues(allowed) => dataset.count_not_in(column, allowed).map(|n| {
            (n > 0).then(|| {
                (
                    Severity::Error,
                    format!("Column '{column}' has {n} value(s) outside the allowed set"),
                )
            })
        }),
        // Substring heuristic, not a regex engine; advisory only.
        ColumnConstraint::Pattern(pattern) => {
            dataset.count_without_substring(column, pattern).map(|n| {
                (n > 0).then(|| {
                    (
                        Severity::Warning,
                        format!(
                            "Column '{column}' has {n} value(s) not containing '{pattern}'"
                        ),
                    )
                })
            })
        }
        ColumnConstraint::NotNull(false) | ColumnConstraint::Unique(false) => Ok(None),
    };

    match outcome {
        Ok(Some((severity, message))) => severity.bucket(message, errors, warnings),
        Ok(None) => {}
        Err(err) => errors.push(format!(
            "Constraint check failed for column '{column}': {err}"
        )),
    }
}

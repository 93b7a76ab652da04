//! Validation report types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which validation pass produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPhase {
    Schema,
    Quality,
    Sla,
}

impl fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Schema => "Schema",
            Self::Quality => "Quality",
            Self::Sla => "SLA",
        })
    }
}

/// Outcome of one validation pass.
///
/// Invariant: `passed == errors.is_empty()`, maintained by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub phase: ValidationPhase,
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Build a report; `passed` is derived from `errors`.
    #[must_use]
    pub fn new(phase: ValidationPhase, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            phase,
            passed: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASSED" } else { "FAILED" };
        write!(f, "{} validation: {status}", self.phase)?;
        if !self.errors.is_empty() {
            write!(f, " ({} errors)", self.errors.len())?;
        }
        if !self.warnings.is_empty() {
            write!(f, " ({} warnings)", self.warnings.len())?;
        }
        Ok(())
    }
}

/// Aggregate verdict over the schema, quality, and SLA passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractValidationResult {
    /// Dataset the contract covers.
    pub dataset: String,
    /// Contract version validated against.
    pub version: String,
    pub schema: ValidationReport,
    pub quality: ValidationReport,
    /// Absent when the caller skipped SLA checks.
    pub sla: Option<ValidationReport>,
}

impl ContractValidationResult {
    /// Logical AND of all executed passes.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.schema.passed
            && self.quality.passed
            && self.sla.as_ref().map_or(true, |r| r.passed)
    }

    /// All errors, concatenated schema → quality → SLA.
    #[must_use]
    pub fn all_errors(&self) -> Vec<&str> {
        self.reports()
            .flat_map(|r| r.errors.iter().map(String::as_str))
            .collect()
    }

    /// All warnings, concatenated schema → quality → SLA.
    #[must_use]
    pub fn all_warnings(&self) -> Vec<&str> {
        self.reports()
            .flat_map(|r| r.warnings.iter().map(String::as_str))
            .collect()
    }

    /// Bounded, human-scannable error summary: the first `limit` errors plus
    /// a count of the remainder.
    #[must_use]
    pub fn error_summary(&self, limit: usize) -> String {
        let errors = self.all_errors();
        let mut shown: Vec<&str> = errors.iter().copied().take(limit).collect();
        if errors.len() > limit {
            return format!(
                "{} (+{} more)",
                shown.join("; "),
                errors.len() - limit
            );
        }
        if shown.is_empty() {
            shown.push("no errors");
        }
        shown.join("; ")
    }

    fn reports(&self) -> impl Iterator<Item = &ValidationReport> {
        [Some(&self.schema), Some(&self.quality), self.sla.as_ref()]
            .into_iter()
            .flatten()
    }
}

impl fmt::Display for ContractValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed() { "PASSED" } else { "FAILED" };
        write!(f, "Contract validation for {}: {status}", self.dataset)?;
        let errors = self.all_errors().len();
        let warnings = self.all_warnings().len();
        if errors > 0 {
            write!(f, " ({errors} errors)")?;
        }
        if warnings > 0 {
            write!(f, " ({warnings} warnings)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(phase: ValidationPhase, errors: &[&str], warnings: &[&str]) -> ValidationReport {
        ValidationReport::new(
            phase,
            errors.iter().map(|s| (*s).to_string()).collect(),
            warnings.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    fn result(
        schema: ValidationReport,
        quality: ValidationReport,
        sla: Option<ValidationReport>,
    ) -> ContractValidationResult {
        ContractValidationResult {
            dataset: "users".into(),
            version: "1.0.0".into(),
            schema,
            quality,
            sla,
        }
    }

    #[test]
    fn passed_is_derived_from_errors() {
        let clean = report(ValidationPhase::Schema, &[], &["extra column"]);
        assert!(clean.passed);
        let broken = report(ValidationPhase::Schema, &["missing id"], &[]);
        assert!(!broken.passed);
    }

    #[test]
    fn aggregate_passed_is_and_of_passes() {
        let ok = result(
            report(ValidationPhase::Schema, &[], &[]),
            report(ValidationPhase::Quality, &[], &[]),
            Some(report(ValidationPhase::Sla, &[], &[])),
        );
        assert!(ok.passed());

        let sla_failed = result(
            report(ValidationPhase::Schema, &[], &[]),
            report(ValidationPhase::Quality, &[], &[]),
            Some(report(ValidationPhase::Sla, &["stale"], &[])),
        );
        assert!(!sla_failed.passed());
    }

    #[test]
    fn skipped_sla_does_not_affect_verdict() {
        let ok = result(
            report(ValidationPhase::Schema, &[], &[]),
            report(ValidationPhase::Quality, &[], &[]),
            None,
        );
        assert!(ok.passed());
    }

    #[test]
    fn errors_concatenate_in_pass_order() {
        let res = result(
            report(ValidationPhase::Schema, &["s1"], &["sw"]),
            report(ValidationPhase::Quality, &["q1", "q2"], &[]),
            Some(report(ValidationPhase::Sla, &["l1"], &["lw"])),
        );
        assert_eq!(res.all_errors(), vec!["s1", "q1", "q2", "l1"]);
        assert_eq!(res.all_warnings(), vec!["sw", "lw"]);
    }

    #[test]
    fn summary_truncates_with_remainder_count() {
        let res = result(
            report(ValidationPhase::Schema, &["a", "b", "c"], &[]),
            report(ValidationPhase::Quality, &["d"], &[]),
            None,
        );
        assert_eq!(res.error_summary(2), "a; b (+2 more)");
        assert_eq!(res.error_summary(10), "a; b; c; d");
    }

    #[test]
    fn display_mentions_counts() {
        let res = result(
            report(ValidationPhase::Schema, &["missing id"], &[]),
            report(ValidationPhase::Quality, &[], &["dup"]),
            None,
        );
        let rendered = res.to_string();
        assert!(rendered.contains("FAILED"));
        assert!(rendered.contains("1 errors"));
        assert!(rendered.contains("1 warnings"));
    }
}

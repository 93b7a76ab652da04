//! Contract validation orchestration.

use anyhow::bail;
use strata_types::{ContractValidationResult, DataContract};

use crate::contracts::dataset::Dataset;
use crate::contracts::loader::{ContractError, ContractLoader};
use crate::contracts::{quality, schema, sla};

/// Number of errors shown verbatim in a logged summary.
const SUMMARY_ERROR_LIMIT: usize = 5;

/// Runs the schema, quality, and SLA passes for a dataset and aggregates
/// their reports into one verdict.
pub struct ContractValidator {
    loader: ContractLoader,
}

impl ContractValidator {
    #[must_use]
    pub fn new(loader: ContractLoader) -> Self {
        Self { loader }
    }

    /// Validate `dataset` against the named contract.
    ///
    /// All passes run to completion regardless of earlier failures; the
    /// aggregate verdict is the AND of the executed passes. `check_sla`
    /// false skips the SLA pass entirely (its report is absent, not
    /// empty).
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the contract itself cannot be
    /// loaded. A failing validation is a result, not an error.
    pub fn validate(
        &self,
        contract_name: &str,
        dataset: &Dataset,
        check_sla: bool,
    ) -> Result<ContractValidationResult, ContractError> {
        let contract = self.loader.load(contract_name)?;
        Ok(self.validate_loaded(&contract, dataset, check_sla))
    }

    /// Validate against an already-loaded contract.
    #[must_use]
    pub fn validate_loaded(
        &self,
        contract: &DataContract,
        dataset: &Dataset,
        check_sla: bool,
    ) -> ContractValidationResult {
        let schema_report = schema::validate_schema(contract, dataset);
        let quality_report = quality::validate_quality(contract, dataset);
        let sla_report = check_sla.then(|| sla::validate_sla(contract, dataset));

        ContractValidationResult {
            dataset: contract.dataset.clone(),
            version: contract.version.clone(),
            schema: schema_report,
            quality: quality_report,
            sla: sla_report,
        }
    }

    /// Validate, log the outcome, and turn a failing verdict into a
    /// terminal error carrying a bounded summary of the first
    /// [`SUMMARY_ERROR_LIMIT`] errors.
    ///
    /// # Errors
    ///
    /// Returns an error when the contract cannot be loaded or the verdict
    /// is failing.
    pub fn validate_and_report(
        &self,
        contract_name: &str,
        dataset: &Dataset,
        check_sla: bool,
    ) -> anyhow::Result<ContractValidationResult> {
        let result = self.validate(contract_name, dataset, check_sla)?;

        for warning in result.all_warnings() {
            tracing::warn!(dataset = result.dataset, warning, "Contract warning");
        }
        if result.passed() {
            tracing::info!(
                dataset = result.dataset,
                version = result.version,
                warnings = result.all_warnings().len(),
                "Contract validation passed"
            );
            Ok(result)
        } else {
            let summary = result.error_summary(SUMMARY_ERROR_LIMIT);
            tracing::error!(
                dataset = result.dataset,
                version = result.version,
                errors = result.all_errors().len(),
                summary,
                "Contract validation failed"
            );
            bail!(
                "Contract validation failed for '{}': {summary}",
                result.dataset
            );
        }
    }
}

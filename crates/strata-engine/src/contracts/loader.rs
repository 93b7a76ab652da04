//! Contract document loading.

use std::fs;
use std::path::{Path, PathBuf};

use strata_types::DataContract;

/// Required top-level keys of a contract document.
const REQUIRED_FIELDS: [&str; 9] = [
    "version",
    "dataset",
    "stage",
    "owner",
    "description",
    "schema",
    "quality_rules",
    "sla",
    "evolution",
];

/// Errors from contract loading.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("no contract found for dataset '{dataset}' under {}", path.display())]
    NotFound { dataset: String, path: PathBuf },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid contract YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document parsed to nothing (empty file or bare `---`).
    #[error("contract document '{0}' is empty")]
    EmptyDocument(String),

    /// Names every absent required key, not just the first.
    #[error("contract '{dataset}' is missing required field(s): {}", fields.join(", "))]
    MissingFields {
        dataset: String,
        fields: Vec<String>,
    },
}

/// Loads contract documents from a directory, one `<dataset>.yml` per
/// dataset.
#[derive(Debug, Clone)]
pub struct ContractLoader {
    contracts_path: PathBuf,
}

impl ContractLoader {
    #[must_use]
    pub fn new(contracts_path: impl Into<PathBuf>) -> Self {
        Self {
            contracts_path: contracts_path.into(),
        }
    }

    /// Directory this loader reads from.
    #[must_use]
    pub fn contracts_path(&self) -> &Path {
        &self.contracts_path
    }

    /// Load and structurally check the contract for `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::NotFound`] when neither `<dataset>.yml` nor
    /// `<dataset>.yaml` exists, [`ContractError::EmptyDocument`] for a
    /// document that parses to nothing, and [`ContractError::MissingFields`]
    /// listing every absent required key before full deserialization is
    /// attempted.
    pub fn load(&self, dataset: &str) -> Result<DataContract, ContractError> {
        let path = self.resolve(dataset).ok_or_else(|| ContractError::NotFound {
            dataset: dataset.to_string(),
            path: self.contracts_path.clone(),
        })?;
        let content = fs::read_to_string(&path)?;
        let doc: serde_yaml::Value = serde_yaml::from_str(&content)?;

        if doc.is_null() {
            return Err(ContractError::EmptyDocument(dataset.to_string()));
        }
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| doc.get(field).is_none())
            .map(|field| (*field).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ContractError::MissingFields {
                dataset: dataset.to_string(),
                fields: missing,
            });
        }

        let contract: DataContract = serde_yaml::from_value(doc)?;
        tracing::debug!(
            dataset = contract.dataset,
            version = contract.version,
            "Loaded data contract"
        );
        Ok(contract)
    }

    /// Dataset names with a contract document present, sorted.
    ///
    /// A missing contracts directory is an empty listing, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Io`] when the directory cannot be read.
    pub fn list_contracts(&self) -> Result<Vec<String>, ContractError> {
        if !self.contracts_path.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.contracts_path)? {
            let path = entry?.path();
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml" | "yaml")
            );
            if is_yaml {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn resolve(&self, dataset: &str) -> Option<PathBuf> {
        for ext in ["yml", "yaml"] {
            let candidate = self.contracts_path.join(format!("{dataset}.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}

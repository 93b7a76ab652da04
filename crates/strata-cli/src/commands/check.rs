use std::path::Path;

use anyhow::{Context, Result};
use strata_engine::config::parser;
use strata_engine::config::types::PipelineConfig;
use strata_engine::config::validator;
use strata_engine::contracts::ContractLoader;
use strata_types::Stage;

/// Execute the `check` command: validate configuration and list the
/// contracts each stage would enforce.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = parser::parse_pipeline(config_path)
        .with_context(|| format!("Failed to parse pipeline: {}", config_path.display()))?;

    validator::validate_pipeline(&config)?;
    println!("Pipeline structure: OK");
    println!(
        "Sources:            {}",
        config
            .sources
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    for stage in Stage::ORDER {
        print_contracts(stage, &config)?;
    }

    println!("\nAll checks passed.");
    Ok(())
}

fn print_contracts(stage: Stage, config: &PipelineConfig) -> Result<()> {
    let contracts_path = match stage {
        Stage::Bronze => config.stages.bronze.contracts_path.as_ref(),
        Stage::Silver => config.stages.silver.contracts_path.as_ref(),
        Stage::Gold => config.stages.gold.contracts_path.as_ref(),
    };
    let label = format!("{stage} contracts:");
    match contracts_path {
        Some(path) => {
            let names = ContractLoader::new(path).list_contracts()?;
            if names.is_empty() {
                println!("{label:19} (none found)");
            } else {
                println!("{label:19} {}", names.join(", "));
            }
        }
        None => println!("{label:19} (not configured)"),
    }
    Ok(())
}

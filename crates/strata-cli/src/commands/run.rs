use std::path::Path;

use anyhow::Result;
use strata_engine::runner;

use crate::builtins;

/// Execute the `run` command: run the selected stages in-process.
pub fn execute(stage: Option<&str>, config_path: &Path) -> Result<()> {
    let driver = runner::create_driver(config_path, &builtins::registries())?;
    let results = driver.run(stage)?;

    for (stage, summary) in &results {
        println!("{stage:8} {summary}");
    }
    println!("\nPipeline '{}' complete.", driver.config().pipeline);
    Ok(())
}

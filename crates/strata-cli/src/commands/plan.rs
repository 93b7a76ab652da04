use std::path::Path;

use anyhow::Result;
use strata_engine::runner;

use crate::builtins;

/// Execute the `plan` command: print the stages a run would execute.
pub fn execute(stage: Option<&str>, config_path: &Path) -> Result<()> {
    let driver = runner::create_driver(config_path, &builtins::registries())?;
    let order = driver.plan(stage)?;

    println!("Pipeline '{}' would run:", driver.config().pipeline);
    for (i, stage) in order.iter().enumerate() {
        println!("  {}. {stage}", i + 1);
    }
    Ok(())
}

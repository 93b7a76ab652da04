use std::path::Path;

use anyhow::Result;
use strata_engine::{dispatch, runner};

use crate::builtins;

/// Execute the `schedule` command: enqueue the first stage of a run onto
/// the continuation queue for workers to pick up.
pub fn execute(stage: Option<&str>, config_path: &Path) -> Result<()> {
    let driver = runner::create_driver(config_path, &builtins::registries())?;
    let queue = runner::open_queue(driver.config())?;

    match dispatch::schedule(&queue, &driver, config_path, stage)? {
        Some(message) => {
            println!(
                "Scheduled '{}' starting at {} ({} stage(s) after it)",
                driver.config().pipeline,
                message.stage,
                message.remaining.len()
            );
        }
        None => println!("Nothing to schedule."),
    }
    Ok(())
}

use std::path::Path;

use anyhow::Result;
use strata_engine::{dispatch, runner};

use crate::builtins;

/// Execute the `work` command: process continuation messages. One message
/// by default; `--drain` keeps going until the queue is empty.
pub fn execute(config_path: &Path, drain: bool) -> Result<()> {
    let driver = runner::create_driver(config_path, &builtins::registries())?;
    let queue = runner::open_queue(driver.config())?;
    let registries = builtins::registries();

    let mut processed = 0usize;
    loop {
        let outcome =
            dispatch::process_one(&queue, |path| runner::create_driver(path, &registries))?;
        match outcome {
            Some(stage) => {
                processed += 1;
                println!("{:8} {}", stage.stage, stage.summary);
                if !drain {
                    break;
                }
            }
            None => break,
        }
    }

    if processed == 0 {
        println!("Queue is empty.");
    } else {
        println!("\nProcessed {processed} message(s).");
    }
    Ok(())
}

mod builtins;
mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Medallion pipeline orchestrator with data contract enforcement"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline in-process, from the given stage to the end
    Run {
        /// Stage to start from (bronze, silver, gold, or "all")
        stage: Option<String>,
        /// Path to pipeline YAML file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the stages a run would execute, without executing anything
    Plan {
        /// Stage to start from (bronze, silver, gold, or "all")
        stage: Option<String>,
        /// Path to pipeline YAML file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate pipeline configuration and list available contracts
    Check {
        /// Path to pipeline YAML file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Enqueue the first stage of a run onto the continuation queue
    Schedule {
        /// Stage to start from (bronze, silver, gold, or "all")
        stage: Option<String>,
        /// Path to pipeline YAML file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Process messages from the continuation queue
    Work {
        /// Path to pipeline YAML file
        #[arg(short, long)]
        config: PathBuf,
        /// Keep processing until the queue is empty
        #[arg(long)]
        drain: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run { stage, config } => commands::run::execute(stage.as_deref(), &config),
        Commands::Plan { stage, config } => commands::plan::execute(stage.as_deref(), &config),
        Commands::Check { config } => commands::check::execute(&config),
        Commands::Schedule { stage, config } => {
            commands::schedule::execute(stage.as_deref(), &config)
        }
        Commands::Work { config, drain } => commands::work::execute(&config, drain),
    }
}

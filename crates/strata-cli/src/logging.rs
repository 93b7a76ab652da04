use tracing_subscriber::EnvFilter;

/// Default filter directives: the requested level for the strata crates,
/// warn for everything else so dependency noise stays out of pipeline
/// output.
fn default_directives(log_level: &str) -> String {
    format!(
        "warn,strata_cli={log_level},strata_engine={log_level},strata_state={log_level},strata_types={log_level}"
    )
}

/// Initialize structured logging for the `strata` binary.
///
/// `RUST_LOG` takes precedence when set; otherwise the given level applies
/// to the strata crates only.
pub fn init(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

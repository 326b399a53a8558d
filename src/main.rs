//! FileTree admin CLI.
//!
//! Loads configuration, initializes logging, and dispatches one subcommand
//! against the configured node store and blob store.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use filetree_core::config::{AppConfig, LogFormat, LoggingConfig};

mod app;
mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {e}"));
            std::process::exit(2);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = cli.execute(config).await {
        if e.is_integrity_failure() {
            tracing::error!(error = %e, "Tree integrity failure");
        }
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initialize tracing. Logs go to stderr so command output stays parseable.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

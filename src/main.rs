//! StudyHub command-line entry point.
//!
//! Opens the local workspace (entity data file and blob directory), runs
//! one command against it, and saves the data file again.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use studyhub_core::config::AppConfig;
use studyhub_core::error::AppError;

mod commands;
mod output;
mod workspace;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = cli.execute(&config).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Load configuration from the base file, the `STUDYHUB_ENV` overlay, and
/// `STUDYHUB__*` environment variables.
fn load_configuration(config_path: &str) -> Result<AppConfig, AppError> {
    let env = std::env::var("STUDYHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

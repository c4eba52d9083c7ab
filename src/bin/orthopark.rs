//! Orthopark CLI - drone imagery to orthophoto and parking occupancy
//!
//! Exit codes: 0 on success, 1 when the pipeline aborted with a pipeline
//! error, 2 for any other failure.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use orthopark::core::config::LoggingConfig;
use orthopark::{LoggingContext, OrthoparkError};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut logging = LoggingContext::new();

    // Execute command
    let outcome = match cli.command {
        Commands::Run(args) => cli::run_command(*args, cli.verbose, &mut logging).await,
        Commands::Preflight(args) => {
            cli::preflight_command(*args, cli.verbose, &mut logging).await
        }
        Commands::PrintDefaultConfig => cli::print_default_config().await,
        Commands::InitConfig(args) => cli::init_config(args).await,
        Commands::ValidateConfig(args) => cli::validate_config(args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(&mut logging, &err),
    }
}

fn report_failure(logging: &mut LoggingContext, err: &anyhow::Error) -> ExitCode {
    if !logging.is_initialized() {
        let console = LoggingConfig {
            log_to_file: false,
            ..LoggingConfig::default()
        };
        if logging.configure(&console, None).is_err() {
            eprintln!("Error: {err:#}");
        }
    }

    if let Some(pipeline_err) = err.downcast_ref::<OrthoparkError>() {
        error!("CRITICAL pipeline error: {}", pipeline_err);
        ExitCode::from(1)
    } else {
        error!("Unexpected fatal error: {:#}", err);
        ExitCode::from(2)
    }
}

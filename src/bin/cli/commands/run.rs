//! The `run` command.

use tracing::info;

use orthopark::{LoggingContext, Pipeline};

use crate::cli::args::RunArgs;
use crate::cli::config_layer::build_layered_config;
use crate::cli::output::display_run_summary;

/// Run the pipeline with the layered configuration.
pub async fn run_command(
    args: RunArgs,
    verbose: bool,
    logging: &mut LoggingContext,
) -> anyhow::Result<()> {
    let mut config = build_layered_config(&args)?;
    if verbose {
        config.logging.level = "DEBUG".to_string();
    }

    let paths = config.paths.resolve()?;
    logging.configure(&config.logging, Some(&paths.output_dir))?;
    info!("orthopark {}", orthopark::VERSION);

    let mut pipeline = Pipeline::from_config(config)?;
    let stats = pipeline.run().await?;

    display_run_summary(&stats);
    Ok(())
}

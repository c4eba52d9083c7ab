//! The `preflight` command: environment checks without running ODM.

use owo_colors::OwoColorize;

use orthopark::core::config::{LoggingConfig, RunMethod};
use orthopark::core::file_utils::list_images;
use orthopark::odm::{CommandRunner, SystemCommandRunner};
use orthopark::LoggingContext;

use crate::cli::args::RunArgs;
use crate::cli::config_layer::build_layered_config;
use crate::cli::output::{summary_table, SummaryRow};

/// Probe Docker and the GPU and count the input images.
pub async fn preflight_command(
    args: RunArgs,
    verbose: bool,
    logging: &mut LoggingContext,
) -> anyhow::Result<()> {
    let config = build_layered_config(&args)?;
    let paths = config.paths.resolve()?;

    let console = LoggingConfig {
        level: if verbose { "DEBUG" } else { "WARNING" }.to_string(),
        log_to_file: false,
        ..config.logging.clone()
    };
    logging.configure(&console, None)?;

    println!("{}", "🔍 Preflight checks".bright_blue().bold());
    println!();

    let runner = SystemCommandRunner;
    let docker_ok = runner.probe("docker", &["--version"]).await;
    let gpu_ok = runner.probe("nvidia-smi", &[]).await;
    let image_count = list_images(&paths.input_image_dir).len();

    let status = |ok: bool| {
        if ok {
            "ok".green().to_string()
        } else {
            "missing".red().to_string()
        }
    };
    let rows = vec![
        SummaryRow::new("Run method", config.odm.run_method),
        SummaryRow::new("Docker", status(docker_ok)),
        SummaryRow::new("GPU (nvidia-smi)", status(gpu_ok)),
        SummaryRow::new("Input directory", paths.input_image_dir.display()),
        SummaryRow::new("Input images", image_count),
    ];
    println!("{}", summary_table(rows));

    let mut problems = Vec::new();
    if config.odm.run_method == RunMethod::Docker && !docker_ok {
        problems.push("Docker is not available");
    }
    if image_count == 0 {
        problems.push("no input images found");
    }

    if problems.is_empty() {
        println!("{}", "✅ Ready to run".bright_green().bold());
        Ok(())
    } else {
        Err(anyhow::anyhow!("Preflight failed: {}", problems.join(", ")))
    }
}

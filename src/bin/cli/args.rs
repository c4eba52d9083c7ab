//! CLI Argument Structures
//!
//! This module contains all CLI argument definitions and command structures
//! used by the orthopark binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use orthopark::core::config::RunMethod;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Drone imagery to parking occupancy
#[derive(Parser)]
#[command(name = "orthopark")]
#[command(version = VERSION)]
#[command(about = "🛰️  Orthopark - Drone imagery to orthophoto and parking occupancy")]
#[command(long_about = "
Run OpenDroneMap over a folder of drone images, collect the orthophoto and
elevation model, analyse parking slot occupancy and write a short report.

Common Usage:

  # Run the pipeline with .orthopark.yml from the current directory
  orthopark run

  # Use an explicit configuration and input folder
  orthopark run --config project.yml --input ./flight_01

  # Check Docker, GPU and input images before a long run
  orthopark preflight

  # Write a starter configuration
  orthopark init-config
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full processing pipeline
    Run(Box<RunArgs>),

    /// Check Docker, GPU and input images without running ODM
    Preflight(Box<RunArgs>),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate an orthopark configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// ODM launch mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RunMethodArg {
    /// Run the ODM container image
    Docker,
    /// Run a local ODM install
    Native,
}

impl From<RunMethodArg> for RunMethod {
    fn from(value: RunMethodArg) -> Self {
        match value {
            RunMethodArg::Docker => RunMethod::Docker,
            RunMethodArg::Native => RunMethod::Native,
        }
    }
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to .orthopark.yml in the current directory)
    #[arg(short, long, env = "ORTHOPARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input image directory
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// ODM project name
    #[arg(long)]
    pub project_name: Option<String>,

    /// ODM launch mode
    #[arg(long, value_enum)]
    pub run_method: Option<RunMethodArg>,

    /// ODM container image
    #[arg(long)]
    pub docker_image: Option<String>,

    /// Enable parking analysis
    #[arg(long, conflicts_with = "no_analysis")]
    pub analysis: bool,

    /// Disable parking analysis
    #[arg(long)]
    pub no_analysis: bool,

    /// Enable the LLM report
    #[arg(long, conflicts_with = "no_report")]
    pub report: bool,

    /// Disable the LLM report
    #[arg(long)]
    pub no_report: bool,

    /// Seed for the placeholder slot classifier
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl RunArgs {
    /// `Some(true)` for `--analysis`, `Some(false)` for `--no-analysis`.
    pub fn analysis_override(&self) -> Option<bool> {
        flag_pair(self.analysis, self.no_analysis)
    }

    /// `Some(true)` for `--report`, `Some(false)` for `--no-report`.
    pub fn report_override(&self) -> Option<bool> {
        flag_pair(self.report, self.no_report)
    }
}

fn flag_pair(enable: bool, disable: bool) -> Option<bool> {
    match (enable, disable) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".orthopark.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(short, long, required = true)]
    pub config: PathBuf,

    /// Show detailed configuration breakdown
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "orthopark",
            "run",
            "--input",
            "flight",
            "--run-method",
            "native",
            "--no-analysis",
            "--report",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.input, Some(PathBuf::from("flight")));
        assert_eq!(args.run_method, Some(RunMethodArg::Native));
        assert_eq!(args.analysis_override(), Some(false));
        assert_eq!(args.report_override(), Some(true));
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        assert!(Cli::try_parse_from(["orthopark", "run", "--analysis", "--no-analysis"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["orthopark", "print-default-config", "--verbose"]);
        assert!(cli.verbose);
    }
}

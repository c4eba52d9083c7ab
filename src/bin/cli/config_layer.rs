//! Configuration Layer Management
//!
//! Layers are applied in order: built-in defaults, a YAML file (explicit
//! `--config`, `ORTHOPARK_CONFIG`, or an implicit `.orthopark.yml`), then CLI
//! overrides.

use std::env;
use std::path::{Path, PathBuf};

use orthopark::core::config::{OrthoparkConfig, RunMethod};

use crate::cli::args::RunArgs;

/// Config files picked up from the current directory when none is given.
pub const IMPLICIT_CONFIG_FILES: [&str; 2] = [".orthopark.yml", ".orthopark.yaml"];

/// Trait for merging configuration layers
pub trait ConfigMerge<T> {
    /// Merge another configuration into this one, with the other taking priority
    fn merge_with(&mut self, other: T);
}

/// Convert CLI arguments to partial configuration overrides
pub trait FromCliArgs<T> {
    /// Create a partial configuration from CLI arguments
    fn from_cli_args(args: &T) -> Self;
}

/// Values given on the command line; `None` leaves the lower layer untouched.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub input_image_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub project_name: Option<String>,
    pub run_method: Option<RunMethod>,
    pub docker_image: Option<String>,
    pub analysis_enabled: Option<bool>,
    pub report_enabled: Option<bool>,
    pub seed: Option<u64>,
    pub log_level: Option<String>,
}

impl FromCliArgs<RunArgs> for ConfigOverrides {
    fn from_cli_args(args: &RunArgs) -> Self {
        Self {
            input_image_dir: args.input.as_deref().map(absolute_from_cwd),
            output_dir: args.output.as_deref().map(absolute_from_cwd),
            project_name: args.project_name.clone(),
            run_method: args.run_method.map(Into::into),
            docker_image: args.docker_image.clone(),
            analysis_enabled: args.analysis_override(),
            report_enabled: args.report_override(),
            seed: args.seed,
            log_level: args.log_level.clone(),
        }
    }
}

impl ConfigMerge<ConfigOverrides> for OrthoparkConfig {
    fn merge_with(&mut self, other: ConfigOverrides) {
        if let Some(dir) = other.input_image_dir {
            self.paths.input_image_dir = dir;
        }
        if let Some(dir) = other.output_dir {
            self.paths.output_dir = dir;
        }
        if let Some(name) = other.project_name {
            self.odm.project_name = name;
        }
        if let Some(method) = other.run_method {
            self.odm.run_method = method;
        }
        if let Some(image) = other.docker_image {
            self.odm.docker_image = image;
        }
        if let Some(enabled) = other.analysis_enabled {
            self.analysis.enabled = enabled;
        }
        if let Some(enabled) = other.report_enabled {
            self.report.enabled = enabled;
        }
        if other.seed.is_some() {
            self.analysis.seed = other.seed;
        }
        if let Some(level) = other.log_level {
            self.logging.level = level;
        }
    }
}

// CLI paths are relative to where the user typed them, not to project_root.
fn absolute_from_cwd(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Explicit path if given, otherwise the first implicit config file present.
pub fn find_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => IMPLICIT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists()),
    }
}

/// Build the effective configuration for `args`.
pub fn build_layered_config(args: &RunArgs) -> anyhow::Result<OrthoparkConfig> {
    let mut config = match find_config_path(args.config.as_deref()) {
        Some(path) => OrthoparkConfig::from_yaml_file(&path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load configuration from {}: {}",
                path.display(),
                e
            )
        })?,
        None => OrthoparkConfig::default(),
    };

    config.merge_with(ConfigOverrides::from_cli_args(args));
    Ok(config)
}

//! Configuration types and management for orthopark.
//!
//! A run is driven by a single [`OrthoparkConfig`] loaded once at startup.
//! Every field carries a serde default so partial YAML files load cleanly,
//! and [`OrthoparkConfig::validate`] performs the range checks.

pub mod odm;
pub mod validation;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{OrthoparkError, Result};

pub use odm::{OdmConfig, OdmOptionValue, OdmOptions, RunMethod};
pub use validation::{
    validate_bounded_f64, validate_non_empty, validate_positive_u64, validate_positive_usize,
    validate_unit_range,
};

/// Main configuration for an orthopark run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrthoparkConfig {
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
    /// ODM invocation
    #[serde(default)]
    pub odm: OdmConfig,
    /// Parking analysis stage
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Files the pipeline writes besides the analysis results
    #[serde(default)]
    pub outputs: OutputsConfig,
    /// LLM report stage
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OrthoparkConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            OrthoparkError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            OrthoparkError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate every configuration section
    pub fn validate(&self) -> Result<()> {
        self.paths.validate()?;
        self.odm.validate()?;
        self.analysis.validate()?;
        self.outputs.validate()?;
        self.report.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Directory layout, relative entries resolve against `project_root`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for every relative path below
    #[serde(default = "PathsConfig::default_project_root")]
    pub project_root: PathBuf,
    /// Flat directory of drone images
    #[serde(default = "PathsConfig::default_input_image_dir")]
    pub input_image_dir: PathBuf,
    /// Output directory for ODM projects, logs, results and reports
    #[serde(default = "PathsConfig::default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory holding the parking slot layout
    #[serde(default = "PathsConfig::default_parking_layout_dir")]
    pub parking_layout_dir: PathBuf,
    /// Directory holding model files
    #[serde(default = "PathsConfig::default_models_dir")]
    pub models_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_root: Self::default_project_root(),
            input_image_dir: Self::default_input_image_dir(),
            output_dir: Self::default_output_dir(),
            parking_layout_dir: Self::default_parking_layout_dir(),
            models_dir: Self::default_models_dir(),
        }
    }
}

impl PathsConfig {
    fn default_project_root() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_input_image_dir() -> PathBuf {
        PathBuf::from("data/input_images")
    }

    fn default_output_dir() -> PathBuf {
        PathBuf::from("data/output")
    }

    fn default_parking_layout_dir() -> PathBuf {
        PathBuf::from("data/parking_layout")
    }

    fn default_models_dir() -> PathBuf {
        PathBuf::from("models")
    }

    /// Resolve every path to an absolute one.
    pub fn resolve(&self) -> Result<ResolvedPaths> {
        let project_root = if self.project_root.is_absolute() {
            self.project_root.clone()
        } else {
            let cwd = std::env::current_dir()
                .map_err(|e| OrthoparkError::io("Failed to read current directory", e))?;
            normalize(&cwd.join(&self.project_root))
        };

        let under_root = |p: &Path| normalize(&project_root.join(p));

        Ok(ResolvedPaths {
            input_image_dir: under_root(&self.input_image_dir),
            output_dir: under_root(&self.output_dir),
            parking_layout_dir: under_root(&self.parking_layout_dir),
            models_dir: under_root(&self.models_dir),
            project_root,
        })
    }

    /// Validate path configuration
    pub fn validate(&self) -> Result<()> {
        for (path, field) in [
            (&self.input_image_dir, "paths.input_image_dir"),
            (&self.output_dir, "paths.output_dir"),
        ] {
            if path.as_os_str().is_empty() {
                return Err(OrthoparkError::config_field(
                    format!("{field} must not be empty"),
                    field,
                ));
            }
        }
        Ok(())
    }
}

// Drops `.` components so logged paths read cleanly.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

/// Absolute directory layout for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Absolute project root
    pub project_root: PathBuf,
    /// Absolute input image directory
    pub input_image_dir: PathBuf,
    /// Absolute output directory
    pub output_dir: PathBuf,
    /// Absolute parking layout directory
    pub parking_layout_dir: PathBuf,
    /// Absolute models directory
    pub models_dir: PathBuf,
}

/// Parking analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Run the analysis stage
    #[serde(default)]
    pub enabled: bool,
    /// Model file inside `paths.models_dir`
    #[serde(default = "AnalysisConfig::default_model_filename")]
    pub model_filename: Option<String>,
    /// Slot layout file inside `paths.parking_layout_dir`
    #[serde(default = "AnalysisConfig::default_slot_filename")]
    pub slot_filename: Option<String>,
    /// Minimum confidence for a slot result to be kept
    #[serde(default = "AnalysisConfig::default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// IoU threshold for non-maximum suppression
    #[serde(default = "AnalysisConfig::default_iou_threshold")]
    pub iou_threshold: f64,
    /// Results file inside `paths.output_dir`
    #[serde(default = "AnalysisConfig::default_results_filename")]
    pub results_filename: String,
    /// Seed for the placeholder classifier, random when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_filename: Self::default_model_filename(),
            slot_filename: Self::default_slot_filename(),
            confidence_threshold: Self::default_confidence_threshold(),
            iou_threshold: Self::default_iou_threshold(),
            results_filename: Self::default_results_filename(),
            seed: None,
        }
    }
}

impl AnalysisConfig {
    fn default_model_filename() -> Option<String> {
        Some("yolov8s_parking_best.pt".to_string())
    }

    fn default_slot_filename() -> Option<String> {
        Some("parking_slots_layout.json".to_string())
    }

    fn default_confidence_threshold() -> f64 {
        0.4
    }

    fn default_iou_threshold() -> f64 {
        0.5
    }

    fn default_results_filename() -> String {
        "parking_analysis_results.json".to_string()
    }

    /// Validate analysis configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_range(self.confidence_threshold, "analysis.confidence_threshold")?;
        validate_unit_range(self.iou_threshold, "analysis.iou_threshold")?;
        validate_non_empty(&self.results_filename, "analysis.results_filename")?;
        Ok(())
    }
}

/// Names of auxiliary files written to the output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    /// File name for the copied orthophoto
    #[serde(default = "OutputsConfig::default_orthophoto_filename")]
    pub orthophoto_filename: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            orthophoto_filename: Self::default_orthophoto_filename(),
        }
    }
}

impl OutputsConfig {
    fn default_orthophoto_filename() -> String {
        "final_orthophoto.tif".to_string()
    }

    /// Validate output naming
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.orthophoto_filename, "outputs.orthophoto_filename")
    }
}

/// LLM report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Run the report stage
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the OpenAI-compatible server
    #[serde(default = "ReportConfig::default_api_base")]
    pub api_base: String,
    /// Model identifier sent with each request
    #[serde(default = "ReportConfig::default_model_name")]
    pub model_name: String,
    /// Maximum tokens to generate
    #[serde(default = "ReportConfig::default_max_tokens")]
    pub max_tokens: usize,
    /// Sampling temperature
    #[serde(default = "ReportConfig::default_temperature")]
    pub temperature: f64,
    /// Report file inside `paths.output_dir`
    #[serde(default = "ReportConfig::default_report_filename")]
    pub report_filename: String,
    /// HTTP request timeout in seconds
    #[serde(default = "ReportConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: Self::default_api_base(),
            model_name: Self::default_model_name(),
            max_tokens: Self::default_max_tokens(),
            temperature: Self::default_temperature(),
            report_filename: Self::default_report_filename(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl ReportConfig {
    fn default_api_base() -> String {
        "http://localhost:1234/v1".to_string()
    }

    fn default_model_name() -> String {
        "local-model".to_string()
    }

    fn default_max_tokens() -> usize {
        350
    }

    fn default_temperature() -> f64 {
        0.6
    }

    fn default_report_filename() -> String {
        "processing_report.txt".to_string()
    }

    fn default_timeout_secs() -> u64 {
        120
    }

    /// Validate report configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_usize(self.max_tokens, "report.max_tokens")?;
        validate_bounded_f64(self.temperature, 0.0, 2.0, "report.temperature")?;
        validate_positive_u64(self.timeout_secs, "report.timeout_secs")?;
        validate_non_empty(&self.report_filename, "report.report_filename")?;
        if self.enabled {
            validate_non_empty(&self.api_base, "report.api_base")?;
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of DEBUG, INFO, WARNING, ERROR, CRITICAL
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// Also append log lines to a file in the output directory
    #[serde(default = "LoggingConfig::default_log_to_file")]
    pub log_to_file: bool,
    /// Log file name
    #[serde(default = "LoggingConfig::default_log_filename")]
    pub log_filename: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            log_to_file: Self::default_log_to_file(),
            log_filename: Self::default_log_filename(),
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "INFO".to_string()
    }

    fn default_log_to_file() -> bool {
        true
    }

    fn default_log_filename() -> String {
        "orthophoto_analyzer.log".to_string()
    }

    /// Validate logging configuration
    pub fn validate(&self) -> Result<()> {
        if self.log_to_file {
            validate_non_empty(&self.log_filename, "logging.log_filename")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;

//! OpenDroneMap invocation settings.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::{OrthoparkError, Result};
use crate::odm::RESERVED_PROJECT_NAME;

/// Ordered mapping of ODM flag names (without the leading `--`) to values.
pub type OdmOptions = IndexMap<String, OdmOptionValue>;

/// How the ODM toolchain is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMethod {
    /// `docker run` against the configured image
    Docker,
    /// A locally installed ODM `run.py`
    Native,
}

impl fmt::Display for RunMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Native => write!(f, "native"),
        }
    }
}

/// A single ODM option value.
///
/// Booleans toggle bare flags, `Null` drops the option, everything else is
/// passed as the flag's argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OdmOptionValue {
    /// Presence/absence flag
    Bool(bool),
    /// Integer argument
    Int(i64),
    /// Floating point argument
    Float(f64),
    /// String argument
    Text(String),
    /// Explicitly unset
    Null,
}

impl OdmOptionValue {
    /// Whether this value is the boolean `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// String form used on the command line, `None` for booleans and nulls.
    pub fn as_arg(&self) -> Option<String> {
        match self {
            Self::Bool(_) | Self::Null => None,
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(format_float(*v)),
            Self::Text(v) => Some(v.clone()),
        }
    }
}

impl fmt::Display for OdmOptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => write!(f, "N/A"),
            other => write!(f, "{}", other.as_arg().unwrap_or_default()),
        }
    }
}

impl From<bool> for OdmOptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OdmOptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for OdmOptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OdmOptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

// Whole floats keep one fractional digit so `5.0` stays `5.0` on the command line.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// ODM launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdmConfig {
    /// Launch mode
    #[serde(default = "OdmConfig::default_run_method")]
    pub run_method: RunMethod,
    /// Container image used in docker mode
    #[serde(default = "OdmConfig::default_docker_image")]
    pub docker_image: String,
    /// Name of the project folder ODM creates under the output directory
    #[serde(default = "OdmConfig::default_project_name")]
    pub project_name: String,
    /// Interpreter used to start `run.py` in native mode
    #[serde(default = "OdmConfig::default_native_python")]
    pub native_python: String,
    /// Path to ODM's `run.py` in native mode
    #[serde(default = "OdmConfig::default_native_run_script")]
    pub native_run_script: String,
    /// Flags forwarded to ODM
    #[serde(default = "OdmConfig::default_options")]
    pub options: OdmOptions,
}

impl Default for OdmConfig {
    fn default() -> Self {
        Self {
            run_method: Self::default_run_method(),
            docker_image: Self::default_docker_image(),
            project_name: Self::default_project_name(),
            native_python: Self::default_native_python(),
            native_run_script: Self::default_native_run_script(),
            options: Self::default_options(),
        }
    }
}

impl OdmConfig {
    fn default_run_method() -> RunMethod {
        RunMethod::Docker
    }

    fn default_docker_image() -> String {
        "opendronemap/odm:latest".to_string()
    }

    fn default_project_name() -> String {
        "odm_processing".to_string()
    }

    fn default_native_python() -> String {
        "python".to_string()
    }

    fn default_native_run_script() -> String {
        "/opt/OpenDroneMap/run.py".to_string()
    }

    /// Default ODM flags: DSM on, 5 cm/px, medium quality, half the CPUs.
    pub fn default_options() -> OdmOptions {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let concurrency = (cpus / 2).max(1) as i64;

        let mut options = OdmOptions::new();
        options.insert("dsm".into(), true.into());
        options.insert("orthophoto-resolution".into(), 5.0.into());
        options.insert("feature-quality".into(), "medium".into());
        options.insert("pc-quality".into(), "medium".into());
        options.insert("use-gpu".into(), true.into());
        options.insert("max-concurrency".into(), concurrency.into());
        options.insert("fast-orthophoto".into(), false.into());
        options.insert("matcher-type".into(), "flann".into());
        options
    }

    /// Configured orthophoto resolution (cm/pixel), if set.
    pub fn resolution(&self) -> Option<&OdmOptionValue> {
        self.options
            .get("orthophoto-resolution")
            .filter(|v| !matches!(v, OdmOptionValue::Null))
    }

    /// Validate ODM configuration
    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(OrthoparkError::config_field(
                "project_name must not be empty",
                "odm.project_name",
            ));
        }
        if self
            .project_name
            .trim()
            .eq_ignore_ascii_case(RESERVED_PROJECT_NAME)
        {
            return Err(OrthoparkError::config_field(
                format!("ODM project name cannot be '{RESERVED_PROJECT_NAME}'"),
                "odm.project_name",
            ));
        }
        if self.run_method == RunMethod::Docker && self.docker_image.trim().is_empty() {
            return Err(OrthoparkError::config_field(
                "docker_image must be set when run_method is docker",
                "odm.docker_image",
            ));
        }
        if self.options.keys().any(|k| k.starts_with('-')) {
            return Err(OrthoparkError::config_field(
                "option names must not include the leading '--'",
                "odm.options",
            ));
        }
        Ok(())
    }
}

//! Error types for the orthopark library.
//!
//! Every fatal pipeline condition is represented by [`OrthoparkError`]. Stages
//! that are best-effort log their failures and never surface them here, so an
//! `Err` returned from the pipeline always means the run was aborted.

use std::fmt;
use std::io;

use thiserror::Error;

/// Main result type for orthopark operations.
pub type Result<T> = std::result::Result<T, OrthoparkError>;

/// Failure classes of an external photogrammetry tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// The tool binary, interpreter or run script could not be found.
    BinaryNotFound,
    /// The container runtime is not installed or not responding.
    RuntimeUnavailable,
    /// The tool exited with a non-zero status (`None` when killed by a signal).
    NonZeroExit(Option<i32>),
    /// The tool exited successfully but produced no project directory.
    MissingOutput,
    /// The process could not be spawned or its output could not be read.
    Launch,
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinaryNotFound => write!(f, "binary not found"),
            Self::RuntimeUnavailable => write!(f, "runtime unavailable"),
            Self::NonZeroExit(Some(code)) => write!(f, "exit code {code}"),
            Self::NonZeroExit(None) => write!(f, "terminated by signal"),
            Self::MissingOutput => write!(f, "missing output"),
            Self::Launch => write!(f, "launch failure"),
        }
    }
}

/// Error type for all orthopark operations.
#[derive(Error, Debug)]
pub enum OrthoparkError {
    /// I/O related errors (file operations, directories)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Pipeline errors raised before or between stages
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// External photogrammetry tool failures
    #[error("ODM error ({kind}): {message}")]
    Tool {
        /// Failure class
        kind: ToolErrorKind,
        /// Error description
        message: String,
        /// Underlying cause, when one exists
        #[source]
        source: Option<io::Error>,
    },

    /// Parking analysis errors
    #[error("Analysis error: {message}")]
    Analysis {
        /// Error description
        message: String,
    },

    /// Report generation errors
    #[error("Report error: {message}")]
    Report {
        /// Error description
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl OrthoparkError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new tool error
    pub fn tool(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self::Tool {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new tool error caused by an I/O failure
    pub fn tool_with_source(
        kind: ToolErrorKind,
        message: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self::Tool {
            kind,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a new analysis error
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a new report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        if let Self::Internal { context: ctx, .. } = &mut self {
            *ctx = Some(context.into());
        }
        self
    }

    /// The tool failure class, if this is a tool error.
    pub fn tool_kind(&self) -> Option<ToolErrorKind> {
        match self {
            Self::Tool { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<io::Error> for OrthoparkError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for OrthoparkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for OrthoparkError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension for converting foreign errors with a short context label.
pub trait OrthoparkResultExt<T> {
    /// Map any displayable error into an internal error tagged with `context`.
    fn map_generic_err(self, context: &str) -> Result<T>;

    /// Map a JSON error into a serialization error mentioning `context`.
    fn map_json_err(self, context: &str) -> Result<T>;
}

impl<T, E> OrthoparkResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn map_generic_err(self, context: &str) -> Result<T> {
        self.map_err(|e| OrthoparkError::internal(format!("Failed {context}: {e}")))
    }

    fn map_json_err(self, context: &str) -> Result<T> {
        self.map_err(|e| OrthoparkError::Serialization {
            message: format!("Invalid JSON in {context}: {e}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(e)),
        })
    }
}

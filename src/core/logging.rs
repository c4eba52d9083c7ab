//! Logging setup.
//!
//! [`LoggingContext`] owns the reload handle of the installed subscriber. The
//! first `configure` call installs a console layer (and optionally a file
//! layer); later calls on the same context only swap the level filter.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::core::config::LoggingConfig;
use crate::core::errors::{OrthoparkError, Result};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Map a level name onto a tracing filter directive.
///
/// Accepts DEBUG, INFO, WARNING, ERROR and CRITICAL in any case, plus the
/// tracing spellings. Returns `None` for anything else.
pub fn level_directive(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARNING" | "WARN" => Some("warn"),
        "ERROR" | "CRITICAL" | "FATAL" => Some("error"),
        _ => None,
    }
}

/// Handle to the process logging configuration
#[derive(Default)]
pub struct LoggingContext {
    handle: Option<FilterHandle>,
    level: Option<&'static str>,
    log_file: Option<PathBuf>,
}

impl LoggingContext {
    /// Create an unconfigured context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `configure` has installed a subscriber.
    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// Active filter directive, once configured.
    pub fn level(&self) -> Option<&'static str> {
        self.level
    }

    /// Path of the log file, when file logging is active.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Install logging, or adjust the level if already installed.
    pub fn configure(&mut self, config: &LoggingConfig, output_dir: Option<&Path>) -> Result<()> {
        if self.is_initialized() {
            return self.set_level(&config.level);
        }

        let directive = level_directive(&config.level);
        let effective = directive.unwrap_or("info");
        let (filter, handle) = reload::Layer::new(EnvFilter::new(effective));

        let mut dir_error = None;
        let file_layer = if config.log_to_file {
            let path = match output_dir {
                Some(dir) => match std::fs::create_dir_all(dir) {
                    Ok(()) => dir.join(&config.log_filename),
                    Err(e) => {
                        dir_error = Some(format!("{}: {e}", dir.display()));
                        PathBuf::from(&config.log_filename)
                    }
                },
                None => PathBuf::from(&config.log_filename),
            };
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    OrthoparkError::io(format!("Failed to open log file {}", path.display()), e)
                })?;
            self.log_file = Some(path);
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .with(file_layer)
            .try_init()
            .map_err(|e| OrthoparkError::config(format!("Failed to install logger: {e}")))?;

        self.handle = Some(handle);
        self.level = Some(effective);

        if let Some(err) = dir_error {
            warn!("Could not create log directory {err}; logging to the current directory");
        }
        if directive.is_none() {
            warn!("Unknown log level '{}', using INFO", config.level);
        }
        if let Some(path) = &self.log_file {
            info!("Logging to file: {}", path.display());
        }
        info!("Logging configured. Level: {}", effective);
        Ok(())
    }

    /// Change the level of an installed subscriber; unknown names fall back to INFO.
    pub fn set_level(&mut self, level: &str) -> Result<()> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| OrthoparkError::config("Logging has not been configured"))?;
        let directive = level_directive(level).unwrap_or_else(|| {
            warn!("Unknown log level '{}', using INFO", level);
            "info"
        });
        handle
            .reload(EnvFilter::new(directive))
            .map_err(|e| OrthoparkError::internal(format!("Failed to change log level: {e}")))?;
        self.level = Some(directive);
        info!("Log level changed to: {}", level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_style_levels_map_to_tracing() {
        assert_eq!(level_directive("DEBUG"), Some("debug"));
        assert_eq!(level_directive("info"), Some("info"));
        assert_eq!(level_directive("Warning"), Some("warn"));
        assert_eq!(level_directive("CRITICAL"), Some("error"));
        assert_eq!(level_directive("verbose"), None);
    }

    #[test]
    fn set_level_requires_configuration() {
        let mut ctx = LoggingContext::new();
        assert!(!ctx.is_initialized());
        assert!(ctx.set_level("DEBUG").is_err());
        assert_eq!(ctx.level(), None);
        assert!(ctx.log_file().is_none());
    }

    // The only test in this binary that installs the global subscriber.
    #[test]
    fn configure_twice_only_adjusts_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = LoggingConfig {
            level: "INFO".into(),
            log_to_file: true,
            log_filename: "test.log".into(),
        };

        let mut ctx = LoggingContext::new();
        ctx.configure(&config, Some(dir.path())).expect("first configure");
        assert!(ctx.is_initialized());
        assert_eq!(ctx.level(), Some("info"));
        assert_eq!(ctx.log_file(), Some(dir.path().join("test.log").as_path()));

        let quieter = LoggingConfig {
            level: "ERROR".into(),
            ..config
        };
        ctx.configure(&quieter, Some(dir.path())).expect("second configure");
        assert_eq!(ctx.level(), Some("error"));
        assert!(dir.path().join("test.log").exists());

        let unknown = LoggingConfig {
            level: "LOUD".into(),
            ..quieter
        };
        ctx.configure(&unknown, Some(dir.path()))
            .expect("unknown level falls back");
        assert_eq!(ctx.level(), Some("info"));

        ctx.set_level("DEBUG").expect("known level");
        ctx.set_level("verbose").expect("unknown level falls back");
        assert_eq!(ctx.level(), Some("info"));
    }
}

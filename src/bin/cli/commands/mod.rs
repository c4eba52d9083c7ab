//! CLI Command Implementations
//!
//! - config: Configuration management commands
//! - preflight: Environment checks
//! - run: The processing pipeline

pub mod config;
pub mod preflight;
pub mod run;

pub use config::{init_config, print_default_config, validate_config};
pub use preflight::preflight_command;
pub use run::run_command;

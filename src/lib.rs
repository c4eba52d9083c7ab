//! # Orthopark: Drone Imagery to Parking Occupancy
//!
//! Orchestrates an OpenDroneMap photogrammetry run over a folder of drone
//! images, collects the produced orthophoto and elevation rasters, runs a
//! parking slot occupancy analysis on the orthophoto and optionally asks a
//! local LLM for a short processing report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Pipeline                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Core          │  ODM             │  Analysis   │  Report     │
//! │ • Config       │ • Command line   │ • Layout    │ • Prompt    │
//! │ • Errors       │ • Process runner │ • Classifier│ • LM Studio │
//! │ • Logging      │ • Result lookup  │ • Results   │ • Report    │
//! │ • Timer        │                  │             │   file      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orthopark::{OrthoparkConfig, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OrthoparkConfig::from_yaml_file(".orthopark.yml")?;
//!     let mut pipeline = Pipeline::from_config(config)?;
//!     let stats = pipeline.run().await?;
//!
//!     println!("Processed {} images", stats.image_count);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

// Configuration, errors and shared helpers
pub mod core {
    //! Configuration, error types, logging and shared helpers.

    pub mod config;
    pub mod errors;
    pub mod file_utils;
    pub mod logging;
    pub mod timer;
}

// OpenDroneMap invocation
pub mod odm;

// Parking slot analysis
pub mod analysis;

// LLM processing report
pub mod report;

// Stage orchestration
pub mod pipeline;

// Re-export primary types for convenience
pub use crate::core::config::OrthoparkConfig;
pub use crate::core::errors::{OrthoparkError, OrthoparkResultExt, Result, ToolErrorKind};
pub use crate::core::logging::LoggingContext;
pub use pipeline::{Pipeline, PipelineStats};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

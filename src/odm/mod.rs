//! OpenDroneMap integration.
//!
//! - `command`: option translation and command-line construction
//! - `process`: the [`CommandRunner`] seam and its `tokio::process` implementation
//! - `runner`: precondition checks, launch and output verification
//! - `results`: locating the orthophoto and elevation rasters of a project

pub mod command;
pub mod process;
pub mod results;
pub mod runner;

pub use command::{build_option_flags, ToolCommand, RESERVED_PROJECT_NAME};
pub use process::{CommandRunner, LineSink, SystemCommandRunner};
pub use results::{find_odm_results, ElevationKind, ElevationRaster, OdmOutputs};
pub use runner::{OdmInvocation, OdmRun, OdmRunner};

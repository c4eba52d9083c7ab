//! OpenDroneMap invocation.
//!
//! [`OdmRunner::run`] checks preconditions, builds the docker or native
//! command line, streams the tool's output into the log and verifies that the
//! expected project directory exists afterwards.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::command::{
    build_option_flags, ToolCommand, CONTAINER_IMAGE_MOUNT, CONTAINER_OUTPUT_MOUNT,
    DOCKER_EXCLUDED_OPTIONS, NATIVE_EXCLUDED_OPTIONS, RESERVED_PROJECT_NAME,
};
use super::process::{CommandRunner, SystemCommandRunner};
use crate::core::config::{OdmConfig, OdmOptions, ResolvedPaths, RunMethod};
use crate::core::errors::{OrthoparkError, Result, ToolErrorKind};

const STAGE: &str = "odm";

/// Parameters of one ODM run
#[derive(Debug, Clone)]
pub struct OdmInvocation {
    /// Absolute input image directory
    pub image_dir: PathBuf,
    /// Absolute directory ODM writes `<project_name>/` into
    pub output_base_dir: PathBuf,
    /// Project folder name
    pub project_name: String,
    /// Flags forwarded to ODM
    pub options: OdmOptions,
    /// Launch mode
    pub run_method: RunMethod,
    /// Container image, docker mode
    pub docker_image: String,
    /// Interpreter for `run.py`, native mode
    pub native_python: String,
    /// Path to `run.py`, native mode
    pub native_run_script: PathBuf,
    /// Working directory of a native run
    pub working_dir: Option<PathBuf>,
}

impl OdmInvocation {
    /// Build an invocation from configuration and resolved paths.
    pub fn from_config(config: &OdmConfig, paths: &ResolvedPaths) -> Self {
        Self {
            image_dir: paths.input_image_dir.clone(),
            output_base_dir: paths.output_dir.clone(),
            project_name: config.project_name.clone(),
            options: config.options.clone(),
            run_method: config.run_method,
            docker_image: config.docker_image.clone(),
            native_python: config.native_python.clone(),
            native_run_script: PathBuf::from(&config.native_run_script),
            working_dir: Some(paths.project_root.clone()),
        }
    }

    /// Directory ODM is expected to create.
    pub fn project_output_dir(&self) -> PathBuf {
        self.output_base_dir.join(&self.project_name)
    }

    fn gpu_requested(&self) -> bool {
        self.options
            .get("use-gpu")
            .map(|v| v.is_true())
            .unwrap_or(false)
    }
}

/// Outcome of a successful ODM run
#[derive(Debug, Clone)]
pub struct OdmRun {
    /// Project directory that ODM produced
    pub project_dir: PathBuf,
    /// Command that was executed
    pub command: ToolCommand,
}

/// Launches ODM through a [`CommandRunner`]
#[derive(Clone)]
pub struct OdmRunner {
    runner: Arc<dyn CommandRunner>,
}

impl Default for OdmRunner {
    fn default() -> Self {
        Self::new(Arc::new(SystemCommandRunner))
    }
}

impl OdmRunner {
    /// Create a runner using `runner` to spawn processes.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Check the invocation before anything is spawned.
    pub fn validate(invocation: &OdmInvocation) -> Result<()> {
        let image_dir = &invocation.image_dir;
        if !image_dir.is_dir() {
            error!("Input image directory not found: {}", image_dir.display());
            return Err(OrthoparkError::pipeline(
                STAGE,
                format!("Input image directory not found: {}", image_dir.display()),
            ));
        }
        if is_empty_dir(image_dir)? {
            error!("Input image directory is empty: {}", image_dir.display());
            return Err(OrthoparkError::pipeline(
                STAGE,
                format!("Input image directory is empty: {}", image_dir.display()),
            ));
        }
        if invocation
            .project_name
            .eq_ignore_ascii_case(RESERVED_PROJECT_NAME)
        {
            error!("ODM project name cannot be '{}'", RESERVED_PROJECT_NAME);
            return Err(OrthoparkError::config_field(
                format!("ODM project name cannot be '{RESERVED_PROJECT_NAME}'"),
                "odm.project_name",
            ));
        }
        Ok(())
    }

    /// Build the command line, probing the container runtime and GPU as needed.
    pub async fn build_command(&self, invocation: &OdmInvocation) -> Result<ToolCommand> {
        match invocation.run_method {
            RunMethod::Docker => self.build_docker_command(invocation).await,
            RunMethod::Native => Self::build_native_command(invocation),
        }
    }

    async fn build_docker_command(&self, invocation: &OdmInvocation) -> Result<ToolCommand> {
        debug!("Using Docker image: {}", invocation.docker_image);
        if !self.runner.probe("docker", &["--version"]).await {
            error!("Docker not found or not running. Install and start Docker.");
            return Err(OrthoparkError::tool(
                ToolErrorKind::RuntimeUnavailable,
                "Docker is not available",
            ));
        }
        info!("Docker is available");

        let host_images = docker_path(&invocation.image_dir);
        let host_output = docker_path(&invocation.output_base_dir);

        let mut cmd = ToolCommand::new("docker");
        cmd.args(["run", "--rm"]);
        cmd.arg("-v")
            .arg(format!("{host_images}:{CONTAINER_IMAGE_MOUNT}:ro"));
        info!(
            "Volume (input):  host='{}' -> container='{}'",
            invocation.image_dir.display(),
            CONTAINER_IMAGE_MOUNT
        );
        cmd.arg("-v")
            .arg(format!("{host_output}:{CONTAINER_OUTPUT_MOUNT}"));
        info!(
            "Volume (output): host='{}' -> container='{}'",
            invocation.output_base_dir.display(),
            CONTAINER_OUTPUT_MOUNT
        );

        if invocation.gpu_requested() {
            info!("GPU requested for ODM in Docker");
            if self.runner.probe("nvidia-smi", &[]).await {
                cmd.args(["--gpus", "all"]);
                info!("Added --gpus all");
            } else {
                warn!("'nvidia-smi' not found or failed; Docker will run ODM without GPU");
            }
        }

        cmd.arg(&invocation.docker_image);
        cmd.args(["--project-path", CONTAINER_OUTPUT_MOUNT]);
        cmd.args(build_option_flags(
            &invocation.options,
            DOCKER_EXCLUDED_OPTIONS,
        ));
        cmd.arg(&invocation.project_name);
        Ok(cmd)
    }

    fn build_native_command(invocation: &OdmInvocation) -> Result<ToolCommand> {
        let script = &invocation.native_run_script;
        warn!(
            "Native ODM run: make sure ODM is installed locally at '{}'",
            script.display()
        );
        if !script.is_file() {
            error!("ODM run script not found: {}", script.display());
            return Err(OrthoparkError::tool(
                ToolErrorKind::BinaryNotFound,
                format!("ODM run script not found: {}", script.display()),
            ));
        }

        let mut cmd = ToolCommand::new(&invocation.native_python);
        cmd.arg(script.display().to_string());
        cmd.arg("--project-path")
            .arg(invocation.output_base_dir.display().to_string());
        cmd.args(build_option_flags(
            &invocation.options,
            NATIVE_EXCLUDED_OPTIONS,
        ));
        cmd.arg(&invocation.project_name);
        cmd.working_dir = invocation.working_dir.clone();
        warn!("Native run: ODM must be able to find the image folder on its own");
        Ok(cmd)
    }

    /// Run ODM and verify its output.
    pub async fn run(&self, invocation: &OdmInvocation) -> Result<OdmRun> {
        info!(
            "--- Starting OpenDroneMap for project '{}' (method: {}) ---",
            invocation.project_name, invocation.run_method
        );
        Self::validate(invocation)?;

        fs::create_dir_all(&invocation.output_base_dir).map_err(|e| {
            OrthoparkError::io(
                format!(
                    "Could not create output base directory: {}",
                    invocation.output_base_dir.display()
                ),
                e,
            )
        })?;

        let command = self.build_command(invocation).await?;
        info!("ODM command:\n{}", command);
        info!("Launching ODM process...");

        let code = self
            .runner
            .run_streaming(&command, &mut |line| info!("[ODM] {}", line.trim()))
            .await
            .map_err(|e| launch_error(&command, e))?;

        let project_dir = invocation.project_output_dir();
        match code {
            Some(0) if project_dir.is_dir() => {
                info!(
                    "--- ODM for project '{}' finished successfully ---",
                    invocation.project_name
                );
                Ok(OdmRun {
                    project_dir,
                    command,
                })
            }
            Some(0) => {
                error!(
                    "ODM exited with code 0 but the project folder is missing: {}",
                    project_dir.display()
                );
                Err(OrthoparkError::tool(
                    ToolErrorKind::MissingOutput,
                    format!(
                        "ODM finished with code 0 but output project folder was not found: {}",
                        project_dir.display()
                    ),
                ))
            }
            other => {
                error!(
                    "--- ODM for project '{}' failed ({}) ---",
                    invocation.project_name,
                    ToolErrorKind::NonZeroExit(other)
                );
                Err(OrthoparkError::tool(
                    ToolErrorKind::NonZeroExit(other),
                    format!(
                        "ODM process for project '{}' failed",
                        invocation.project_name
                    ),
                ))
            }
        }
    }
}

fn launch_error(command: &ToolCommand, err: io::Error) -> OrthoparkError {
    if err.kind() == io::ErrorKind::NotFound {
        error!(
            "Command '{}' not found. Make sure it is installed and on PATH.",
            command.program
        );
        let message = if command.program == "docker" {
            "Docker command not found. Is Docker installed and running?".to_string()
        } else {
            format!("Command '{}' or script not found", command.program)
        };
        OrthoparkError::tool_with_source(ToolErrorKind::BinaryNotFound, message, err)
    } else {
        error!("Failed to run ODM: {}", err);
        OrthoparkError::tool_with_source(
            ToolErrorKind::Launch,
            format!("Failed to run ODM: {err}"),
            err,
        )
    }
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| OrthoparkError::io(format!("Failed to read {}", dir.display()), e))?;
    Ok(entries.next().is_none())
}

// Docker expects forward slashes in bind-mount specs, also on Windows hosts.
fn docker_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

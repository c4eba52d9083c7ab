//! Child process execution behind the [`CommandRunner`] seam.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::command::ToolCommand;

/// Line callback receiving each output line of a running child.
pub type LineSink<'a> = dyn FnMut(&str) + Send + 'a;

/// Spawns external commands for the ODM runner.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a short availability check, `true` when it exits successfully.
    async fn probe(&self, program: &str, args: &[&str]) -> bool;

    /// Run `command` to completion, passing every stdout/stderr line to
    /// `on_line` as it arrives. Returns the exit code, `None` if the child
    /// was terminated by a signal.
    async fn run_streaming(
        &self,
        command: &ToolCommand,
        on_line: &mut LineSink<'_>,
    ) -> io::Result<Option<i32>>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn probe(&self, program: &str, args: &[&str]) -> bool {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) => {
                debug!("Probe '{}' exited with {}", program, status);
                status.success()
            }
            Err(e) => {
                debug!("Probe '{}' failed to start: {}", program, e);
                false
            }
        }
    }

    async fn run_streaming(
        &self,
        command: &ToolCommand,
        on_line: &mut LineSink<'_>,
    ) -> io::Result<Option<i32>> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "child stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "child stderr not captured"))?;

        // Both pipes are drained until EOF so the child never blocks on a full buffer.
        let mut out = BufReader::new(stdout);
        let mut err = BufReader::new(stderr);
        let mut out_buf = Vec::new();
        let mut err_buf = Vec::new();
        let (mut out_open, mut err_open) = (true, true);

        while out_open || err_open {
            tokio::select! {
                read = out.read_until(b'\n', &mut out_buf), if out_open => {
                    if read? == 0 {
                        out_open = false;
                    }
                    emit_line(&mut out_buf, on_line);
                }
                read = err.read_until(b'\n', &mut err_buf), if err_open => {
                    if read? == 0 {
                        err_open = false;
                    }
                    emit_line(&mut err_buf, on_line);
                }
            }
        }

        let status = child.wait().await?;
        Ok(status.code())
    }
}

fn emit_line(buf: &mut Vec<u8>, on_line: &mut LineSink<'_>) {
    if buf.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(&buf[..]);
    let line = text.trim_end_matches(['\n', '\r']);
    if !line.trim().is_empty() {
        on_line(line);
    }
    buf.clear();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[tokio::test]
    async fn streams_stdout_and_stderr_lines() {
        let runner = SystemCommandRunner;
        let mut lines = Vec::new();
        let code = runner
            .run_streaming(&sh("echo one; echo two >&2; printf three"), &mut |l| {
                lines.push(l.to_string())
            })
            .await
            .expect("run");

        assert_eq!(code, Some(0));
        lines.sort();
        assert_eq!(lines, vec!["one", "three", "two"]);
    }

    #[tokio::test]
    async fn reports_non_zero_exit_and_drains_large_output() {
        let runner = SystemCommandRunner;
        let mut count = 0usize;
        let code = runner
            .run_streaming(
                &sh("i=0; while [ $i -lt 20000 ]; do echo line $i; echo err $i >&2; i=$((i+1)); done; exit 3"),
                &mut |_| count += 1,
            )
            .await
            .expect("run");

        assert_eq!(code, Some(3));
        assert_eq!(count, 40_000);
    }

    #[tokio::test]
    async fn replaces_invalid_utf8() {
        let runner = SystemCommandRunner;
        let mut lines = Vec::new();
        runner
            .run_streaming(&sh(r"printf 'bad \377 byte\n'"), &mut |l| {
                lines.push(l.to_string())
            })
            .await
            .expect("run");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let runner = SystemCommandRunner;
        let cmd = ToolCommand::new("orthopark-no-such-binary");
        let err = runner.run_streaming(&cmd, &mut |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!runner.probe("orthopark-no-such-binary", &[]).await);
    }

    #[tokio::test]
    async fn probe_reflects_exit_status() {
        let runner = SystemCommandRunner;
        assert!(runner.probe("sh", &["-c", "exit 0"]).await);
        assert!(!runner.probe("sh", &["-c", "exit 1"]).await);
    }
}

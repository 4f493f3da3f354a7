//! Child-process execution with a frozen environment snapshot.
//!
//! Every invocation is an explicit argument vector — no shell is ever
//! involved, so there is no metacharacter interpretation. Processes
//! run to completion and both streams are captured as text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{OpsError, OpsResult};
use crate::types::CommandOutput;

/// Runs one external program with a fixed working directory and
/// environment snapshot captured at startup.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    workdir: PathBuf,
    env: HashMap<String, String>,
}

impl CommandRunner {
    pub fn new(
        program: impl Into<String>,
        workdir: impl Into<PathBuf>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
            env,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run to completion and require a zero exit status.
    ///
    /// Non-zero exit becomes `OpsError::CommandFailed` carrying the
    /// captured stderr (falling back to stdout, then the exit code,
    /// so the failure text is never silently empty).
    pub async fn run(&self, args: &[&str]) -> OpsResult<CommandOutput> {
        let output = self.run_unchecked(args).await?;
        if !output.success() {
            return Err(OpsError::CommandFailed {
                stderr: failure_text(&output),
            });
        }
        Ok(output)
    }

    /// Run to completion and return the output regardless of exit
    /// status. Used where a non-zero exit is meaningful
    /// (`plan -detailed-exitcode` reports drift via exit 2).
    pub async fn run_unchecked(&self, args: &[&str]) -> OpsResult<CommandOutput> {
        tracing::debug!(program = %self.program, ?args, "spawning");
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.workdir)
            .env_clear()
            .envs(&self.env)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        Ok(CommandOutput::from(output))
    }

    /// Run with `input` fed to the child's stdin, requiring zero exit.
    ///
    /// This is the second stage of piped pipelines (feeding a graph
    /// into `dot`) and the `terraform console` value probe.
    pub async fn run_with_stdin(&self, args: &[&str], input: &str) -> OpsResult<CommandOutput> {
        tracing::debug!(program = %self.program, ?args, "spawning with piped stdin");
        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(&self.workdir)
            .env_clear()
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Abandoned probes must not leave the child running.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| OpsError::Io(format!("{}: stdin: {e}", self.program)))?;
            // Dropping closes the pipe so the child sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OpsError::Io(format!("{}: {e}", self.program)))?;
        let output = CommandOutput::from(output);
        if !output.success() {
            return Err(OpsError::CommandFailed {
                stderr: failure_text(&output),
            });
        }
        Ok(output)
    }

    /// Like `run_with_stdin` but bounded by `timeout`.
    ///
    /// On expiry the child is killed and the probe is abandoned — no
    /// retry. Only speculative probes use this; lifecycle operations
    /// are allowed to block indefinitely.
    pub async fn run_with_stdin_timeout(
        &self,
        args: &[&str],
        input: &str,
        timeout: Duration,
    ) -> OpsResult<CommandOutput> {
        match tokio::time::timeout(timeout, self.run_with_stdin(args, input)).await {
            Ok(result) => result,
            Err(_) => Err(OpsError::ProbeTimeout(timeout.as_secs())),
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> OpsError {
        if e.kind() == std::io::ErrorKind::NotFound {
            OpsError::ToolNotFound(self.program.clone())
        } else {
            OpsError::Io(format!("{}: {e}", self.program))
        }
    }
}

/// Pick the most informative failure text from a non-zero exit.
fn failure_text(output: &CommandOutput) -> String {
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = output.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("exit code {:?}", output.exit_code)
}

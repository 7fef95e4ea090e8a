//! CommandRunner - shell commands with a fixed timeout
//!
//! Used by `exec` enabled checks, `exec`/`exec-file` value specs and the
//! `exec` task executor.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{KilnError, Result};
use crate::util::EXEC_TIMEOUT;

#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    timeout: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(EXEC_TIMEOUT)
    }
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command` through `sh -c` and return trimmed stdout
    ///
    /// Non-zero exit fails with `CommandFailed` carrying stderr.
    #[instrument(skip(self), fields(timeout_secs = self.timeout.as_secs()))]
    pub async fn run(&self, command: &str, cwd: Option<&Path>) -> Result<String> {
        let output = self.output(shell(command, cwd), command).await?;
        stdout_or_error(output, command)
    }

    /// Execute a file directly (no shell) and return trimmed stdout
    #[instrument(skip(self))]
    pub async fn run_file(&self, path: &Path, cwd: Option<&Path>) -> Result<String> {
        let label = path.display().to_string();
        let mut cmd = Command::new(path);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let output = self.output(cmd, &label).await?;
        stdout_or_error(output, &label)
    }

    /// Whether `command` exits with status 0
    pub async fn succeeds(&self, command: &str, cwd: Option<&Path>) -> Result<bool> {
        let output = self.output(shell(command, cwd), command).await?;
        debug!(status = ?output.status.code(), "Check command finished");
        Ok(output.status.success())
    }

    async fn output(&self, mut cmd: Command, label: &str) -> Result<Output> {
        cmd.kill_on_drop(true);
        tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| KilnError::CommandFailed {
                command: label.to_string(),
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| KilnError::CommandFailed {
                command: label.to_string(),
                reason: format!("failed to start: {}", e),
            })
    }
}

fn shell(command: &str, cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

fn stdout_or_error(output: Output, label: &str) -> Result<String> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match output.status.code() {
            Some(code) => format!("exit code {}: {}", code, stderr.trim()),
            None => format!("terminated by signal: {}", stderr.trim()),
        };
        return Err(KilnError::CommandFailed {
            command: label.to_string(),
            reason,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

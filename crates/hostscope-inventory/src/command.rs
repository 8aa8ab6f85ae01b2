//! Local command execution using `tokio::process`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::error::CommandError;

/// Exit status reported by `sh` when the command does not exist
pub const STATUS_NOT_FOUND: i32 = 127;

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status code (0 for success, -1 when killed by a signal)
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Whether the shell could not find the program
    #[must_use]
    pub fn not_found(&self) -> bool {
        self.status == STATUS_NOT_FOUND
    }
}

/// Runs shell commands on behalf of command-backed readers
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &str) -> Result<CommandOutput, CommandError>;

    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Runs commands on the local machine through `sh -c`
#[derive(Debug, Clone, Default)]
pub struct LocalCommandRunner;

impl LocalCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self), level = "debug")]
    async fn execute(&self, cmd: &str) -> Result<CommandOutput, CommandError> {
        let start = Instant::now();

        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Spawn(e.to_string()))?
            .wait_with_output()
            .await
            .map_err(|e| CommandError::Io(e.to_string()))?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        };

        debug!(
            command = %cmd,
            status = result.status,
            duration = ?result.duration,
            "command completed"
        );

        Ok(result)
    }
}

#[async_trait]
impl CommandRunner for LocalCommandRunner {
    async fn run(&self, cmd: &str) -> Result<CommandOutput, CommandError> {
        self.execute(cmd).await
    }

    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout_duration: Duration,
    ) -> Result<CommandOutput, CommandError> {
        timeout(timeout_duration, self.execute(cmd))
            .await
            .map_err(|_| CommandError::Timeout {
                timeout: timeout_duration,
            })?
    }
}

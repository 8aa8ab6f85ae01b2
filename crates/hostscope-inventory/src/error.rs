//! Error types for hostscope-inventory

use std::time::Duration;

use hostscope_core::ReaderError;
use thiserror::Error;

/// Errors that can occur while running a local command
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    /// Process could not be started
    #[error("failed to spawn process: {0}")]
    Spawn(String),

    /// I/O error while collecting output
    #[error("I/O error: {0}")]
    Io(String),

    /// Command did not finish in time
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },
}

impl From<CommandError> for ReaderError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Spawn(msg) => ReaderError::Unavailable(msg),
            CommandError::Io(msg) => ReaderError::Io(msg),
            timeout @ CommandError::Timeout { .. } => ReaderError::QueryFailed(timeout.to_string()),
        }
    }
}

//! Core error types for hostscope-core

use thiserror::Error;

/// Errors raised while building the runner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Runner was built without any analyzer module
    #[error("no analyzer modules registered")]
    NoModules,

    /// Two modules claim the same area key
    #[error("area registered twice: {0}")]
    DuplicateArea(String),
}

/// Errors returned by collaborator readers
#[derive(Error, Debug, Clone)]
pub enum ReaderError {
    /// Data source does not exist on this system
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// I/O failure while reading the source
    #[error("I/O error: {0}")]
    Io(String),

    /// Query or command failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Source returned data that could not be parsed
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::Io(err.to_string())
    }
}

/// Errors returned by analyzer modules
#[derive(Error, Debug, Clone)]
pub enum ModuleError {
    /// Module observed cancellation and stopped
    #[error("analysis canceled")]
    Canceled,

    /// Collaborator read failed
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Module received an argument it cannot work with
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other collection failure
    #[error("{0}")]
    Failed(String),
}

impl ModuleError {
    /// Check if the error represents cancellation rather than a failure
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, ModuleError::Canceled)
    }
}

//! Error types for report export

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export canceled")]
    Canceled,

    #[error("invalid export target: {0}")]
    InvalidTarget(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("write task failed: {0}")]
    Task(String),
}

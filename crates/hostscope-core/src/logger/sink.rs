//! Sink trait for the action logger

use hostscope_api::ActionLogEntry;
use thiserror::Error;
use uuid::Uuid;

/// Errors a sink may report; the logger swallows all of them
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Per-entry metadata computed by the logger under its gate
#[derive(Debug, Clone, Copy)]
pub struct SinkMeta {
    /// Correlation id of the session
    pub session_id: Uuid,
    /// Rolling per-area sequence number (0..=99)
    pub sequence: u8,
}

/// Destination for action log entries
///
/// Sinks are called with the logger's lock held, in a fixed order. They must
/// tolerate being called from any thread.
pub trait LogSink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Write one entry
    ///
    /// # Errors
    /// Any error is logged at debug level and otherwise ignored.
    fn write(&self, entry: &ActionLogEntry, meta: &SinkMeta) -> Result<(), SinkError>;
}

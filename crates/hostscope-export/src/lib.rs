//! hostscope-export: Report persistence
//!
//! Renders an [`AnalyzerResult`] as JSON or HTML and writes it atomically:
//! the target is either the previous file or the complete new one, never a
//! partial write.

pub mod atomic;
pub mod error;
pub mod format;
pub mod html;
pub mod json;

use std::path::Path;

use async_trait::async_trait;
use hostscope_api::AnalyzerResult;
use tokio_util::sync::CancellationToken;

pub use atomic::atomic_write;
pub use error::ExportError;
pub use format::Format;
pub use html::HtmlExporter;
pub use json::JsonExporter;

/// Writes an aggregate to a file
#[async_trait]
pub trait Exporter: Send + Sync {
    fn format(&self) -> Format;

    /// Export `result` to `target`, creating missing parent directories
    ///
    /// # Errors
    /// [`ExportError::Canceled`] if `cancel` fired before writing, otherwise
    /// serialization or I/O failures.
    async fn export(
        &self,
        result: &AnalyzerResult,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ExportError>;
}

/// Exporter for `format`
#[must_use]
pub fn exporter_for(format: Format) -> Box<dyn Exporter> {
    match format {
        Format::Json => Box::new(JsonExporter),
        Format::Html => Box::new(HtmlExporter),
    }
}

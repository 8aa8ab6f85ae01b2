//! JSON report

use std::path::Path;

use async_trait::async_trait;
use hostscope_api::AnalyzerResult;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::atomic::atomic_write;
use crate::error::ExportError;
use crate::format::Format;
use crate::Exporter;

/// Pretty-printed JSON; absent optional fields are omitted
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl JsonExporter {
    /// # Errors
    /// Serialization failure.
    pub fn render(result: &AnalyzerResult) -> Result<Vec<u8>, ExportError> {
        let mut bytes = serde_json::to_vec_pretty(result)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[async_trait]
impl Exporter for JsonExporter {
    fn format(&self) -> Format {
        Format::Json
    }

    #[instrument(skip(self, result, cancel), fields(path = %target.display()))]
    async fn export(
        &self,
        result: &AnalyzerResult,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ExportError> {
        let bytes = Self::render(result)?;
        if cancel.is_cancelled() {
            return Err(ExportError::Canceled);
        }
        atomic_write(target, bytes).await
    }
}

//! Structured `tracing` sink

use hostscope_api::{ActionLogEntry, LogLevel};
use tracing::{error, info, warn};

use super::sink::{LogSink, SinkError, SinkMeta};

/// Re-emits every entry as a `tracing` event on target `hostscope::action`
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceSink;

impl LogSink for TraceSink {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn write(&self, entry: &ActionLogEntry, meta: &SinkMeta) -> Result<(), SinkError> {
        match entry.level {
            LogLevel::Information => info!(
                target: "hostscope::action",
                session = %meta.session_id,
                area = %entry.area,
                action = %entry.action,
                seq = meta.sequence,
                "{}",
                entry.message
            ),
            LogLevel::Warning => warn!(
                target: "hostscope::action",
                session = %meta.session_id,
                area = %entry.area,
                action = %entry.action,
                seq = meta.sequence,
                "{}",
                entry.message
            ),
            LogLevel::Error => error!(
                target: "hostscope::action",
                session = %meta.session_id,
                area = %entry.area,
                action = %entry.action,
                seq = meta.sequence,
                exception = entry.exception.as_deref().unwrap_or_default(),
                "{}",
                entry.message
            ),
        }
        Ok(())
    }
}

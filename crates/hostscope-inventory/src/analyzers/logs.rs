//! Logs area: record counts and last write times of system logs

use async_trait::async_trait;
use hostscope_api::{AreaResult, Details};
use hostscope_core::{
    AnalyzerContext, AnalyzerModule, CancellationToken, ModuleError, check_canceled,
};
use serde_json::json;

use super::areas::LOGS;

/// Logs summarized when none are configured
pub const DEFAULT_LOGS: &[&str] = &["syslog", "auth.log", "kern.log", "dpkg.log"];

/// Record counts and last write time of the configured system logs
#[derive(Debug, Clone)]
pub struct LogsAnalyzer {
    log_names: Vec<String>,
}

impl LogsAnalyzer {
    /// An empty list falls back to [`DEFAULT_LOGS`]
    pub fn new(log_names: Vec<String>) -> Self {
        let log_names = if log_names.is_empty() {
            DEFAULT_LOGS.iter().map(|s| (*s).to_string()).collect()
        } else {
            log_names
        };
        Self { log_names }
    }

    #[must_use]
    pub fn log_names(&self) -> &[String] {
        &self.log_names
    }
}

#[async_trait]
impl AnalyzerModule for LogsAnalyzer {
    fn name(&self) -> &str {
        "System logs"
    }

    fn area(&self) -> &str {
        LOGS
    }

    async fn analyze(
        &self,
        ctx: &AnalyzerContext,
        cancel: &CancellationToken,
    ) -> Result<AreaResult, ModuleError> {
        let mut result = AreaResult::new(LOGS);
        let mut logs = Vec::new();
        let mut total = 0u64;

        for name in &self.log_names {
            check_canceled(cancel)?;
            match ctx.logs.summary(name).await {
                Ok(Some(summary)) => {
                    total += summary.count;
                    logs.push(json!({
                        "name": name,
                        "count": summary.count,
                        "last_write_time_utc": summary.last_write_time_utc,
                    }));
                }
                Ok(None) => {
                    result = result.with_warning(format!("log {name} not found"));
                }
                Err(e) => {
                    ctx.logger.error(LOGS, "Read", format!("cannot read {name}"), &e);
                    result = result.with_error(format!("{name}: {e}"));
                }
            }
        }
        ctx.logger.info(
            LOGS,
            "Collect",
            format!("{} of {} logs summarized", logs.len(), self.log_names.len()),
        );

        let details = Details::new()
            .with("logs", json!(logs))
            .with("total_records", total);

        Ok(result
            .with_summary(json!({ "logs": logs.len(), "total_records": total }))
            .with_details(details))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use hostscope_api::AreaOutcome;
    use hostscope_core::LogSummary;

    use super::*;
    use crate::analyzers::testing::{self, MapLogs};

    #[tokio::test]
    async fn test_missing_log_warns() {
        let mut logs = MapLogs::default();
        logs.0.insert(
            "syslog".to_string(),
            LogSummary {
                count: 1200,
                last_write_time_utc: Some(Utc::now()),
            },
        );
        let ctx = testing::context().logs(Arc::new(logs)).build();
        let analyzer = LogsAnalyzer::new(vec!["syslog".to_string(), "auth.log".to_string()]);

        let result = analyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.warnings, vec!["log auth.log not found".to_string()]);
        assert_eq!(result.details.get_u64("total_records").unwrap(), 1200);
        assert_eq!(result.outcome, AreaOutcome::Completed);
    }

    #[tokio::test]
    async fn test_reader_errors_are_recorded() {
        let ctx = testing::context().build();
        let analyzer = LogsAnalyzer::new(vec!["syslog".to_string()]);

        let result = analyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.errors.len(), 1);
        assert!(ctx.logger.snapshot().iter().any(|e| e.exception.is_some()));
    }

    #[test]
    fn test_default_names() {
        assert_eq!(LogsAnalyzer::new(Vec::new()).log_names().len(), DEFAULT_LOGS.len());
    }
}

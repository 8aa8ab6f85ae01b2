//! Aggregate report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::details::Details;
use crate::finding::{Finding, Severity};
use crate::log::ActionLogEntry;

/// How an analyzer module invocation ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaOutcome {
    /// Module returned a result
    #[default]
    Completed,
    /// Module returned an error or panicked
    Failed,
    /// Module observed cancellation or was stopped by the runner
    Canceled,
}

impl AreaOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AreaOutcome::Completed => "completed",
            AreaOutcome::Failed => "failed",
            AreaOutcome::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for AreaOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome bundle of one analyzer module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    /// Area key, unique within a run
    pub area: String,
    /// Compact overview value
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub summary: Value,
    /// Full collected payload
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub anomalies: Vec<Finding>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub outcome: AreaOutcome,
}

impl AreaResult {
    /// Start a completed result for `area`
    pub fn new(area: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            summary: Value::Null,
            details: Details::new(),
            anomalies: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            outcome: AreaOutcome::Completed,
        }
    }

    /// Result for a module that failed with `error`
    pub fn failed(area: impl Into<String>, error: impl Into<String>) -> Self {
        let mut result = Self::new(area);
        result.errors.push(error.into());
        result.outcome = AreaOutcome::Failed;
        result
    }

    /// Result for a module that was canceled
    pub fn canceled(area: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut result = Self::new(area);
        result.warnings.push(reason.into());
        result.outcome = AreaOutcome::Canceled;
        result
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<Value>) -> Self {
        self.summary = summary.into();
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    #[must_use]
    pub fn with_anomaly(mut self, finding: Finding) -> Self {
        self.anomalies.push(finding);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.outcome == AreaOutcome::Canceled
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.outcome == AreaOutcome::Failed
    }
}

/// Aggregate of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub computer_name: String,
    pub export_timestamp: DateTime<Utc>,
    /// Correlation id shared by every diagnostic event of the run
    pub session_id: Uuid,
    pub areas: Vec<AreaResult>,
    #[serde(default)]
    pub global_findings: Vec<Finding>,
    #[serde(default)]
    pub action_log: Vec<ActionLogEntry>,
}

impl AnalyzerResult {
    /// Return the aggregate with `findings` appended to the global findings
    #[must_use]
    pub fn with_global_findings(mut self, findings: impl IntoIterator<Item = Finding>) -> Self {
        self.global_findings.extend(findings);
        self
    }

    /// Look up an area by key (case-insensitive)
    #[must_use]
    pub fn area(&self, area: &str) -> Option<&AreaResult> {
        self.areas.iter().find(|a| a.area.eq_ignore_ascii_case(area))
    }

    /// Every finding, module anomalies first, then global findings
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.areas
            .iter()
            .flat_map(|a| a.anomalies.iter())
            .chain(self.global_findings.iter())
    }

    /// Count of findings with the given severity across areas and rules
    #[must_use]
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.all_findings()
            .filter(|f| f.severity == severity)
            .count()
    }

    #[must_use]
    pub fn total_warnings(&self) -> usize {
        self.areas.iter().map(|a| a.warnings.len()).sum()
    }

    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.areas.iter().map(|a| a.errors.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate() -> AnalyzerResult {
        AnalyzerResult {
            computer_name: "node-1".to_string(),
            export_timestamp: Utc::now(),
            session_id: Uuid::new_v4(),
            areas: vec![
                AreaResult::new("System")
                    .with_anomaly(Finding::critical("root login enabled"))
                    .with_warning("slow query"),
                AreaResult::failed("Network", "timed out"),
                AreaResult::canceled("Logs", "stopped"),
            ],
            global_findings: vec![Finding::warning("one area failed")],
            action_log: Vec::new(),
        }
    }

    #[test]
    fn test_counts() {
        let result = aggregate();
        assert_eq!(result.count_severity(Severity::Critical), 1);
        assert_eq!(result.count_severity(Severity::Warning), 1);
        assert_eq!(result.total_errors(), 1);
        // one explicit warning plus the cancellation note
        assert_eq!(result.total_warnings(), 2);
    }

    #[test]
    fn test_outcome_constructors() {
        let failed = AreaResult::failed("Network", "timed out");
        assert!(failed.is_failed());
        assert_eq!(failed.errors, vec!["timed out"]);

        let canceled = AreaResult::canceled("Logs", "stopped");
        assert!(canceled.is_canceled());
        assert!(canceled.errors.is_empty());
    }

    #[test]
    fn test_with_global_findings_appends() {
        let result = aggregate().with_global_findings(vec![Finding::info("extra")]);
        assert_eq!(result.global_findings.len(), 2);
        assert_eq!(result.global_findings[1].message, "extra");
    }

    #[test]
    fn test_area_lookup_is_case_insensitive() {
        let result = aggregate();
        assert!(result.area("network").is_some());
        assert!(result.area("Firewall").is_none());
    }

    #[test]
    fn test_null_summary_omitted() {
        let json = serde_json::to_value(AreaResult::new("System")).unwrap();
        assert!(json.get("summary").is_none());
        assert_eq!(json["outcome"], "completed");
    }
}

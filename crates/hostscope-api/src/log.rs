//! Action log entry types

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Level of an action log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Information,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Information => write!(f, "Information"),
            LogLevel::Warning => write!(f, "Warning"),
            LogLevel::Error => write!(f, "Error"),
        }
    }
}

/// One diagnostic event recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub timestamp_utc: DateTime<Utc>,
    pub area: String,
    pub action: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl ActionLogEntry {
    /// Render the entry as one tab-separated line (without trailing newline)
    ///
    /// Tabs and line breaks inside fields are replaced by spaces so that a
    /// line always holds exactly one entry.
    #[must_use]
    pub fn to_tsv_line(&self) -> String {
        let mut line = format!(
            "{}\t{}\t{}\t{}\t{}",
            self.timestamp_utc.to_rfc3339_opts(SecondsFormat::Millis, true),
            flatten(&self.area),
            flatten(&self.action),
            self.level,
            flatten(&self.message),
        );
        if let Some(ref exception) = self.exception {
            line.push('\t');
            line.push_str(&flatten(exception));
        }
        line
    }
}

fn flatten(field: &str) -> String {
    field.replace(['\t', '\r', '\n'], " ")
}

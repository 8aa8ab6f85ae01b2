//! Configuration types for the runner and the action log sinks

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How long the runner keeps waiting for modules after the stop signal
    /// fired before aborting them
    pub cancel_grace: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cancel_grace: Duration::from_secs(5),
        }
    }
}

/// Which action log sinks to attach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Emit entries as `tracing` events on `hostscope::action`
    #[serde(default = "default_true")]
    pub trace: bool,
    /// Emit numbered low-level events on `hostscope::events`
    #[serde(default = "default_true")]
    pub events: bool,
    /// Append entries to this tab-separated file
    pub action_log_file: Option<PathBuf>,
    /// Forward entries to the local syslog socket
    #[serde(default = "default_true")]
    pub syslog: bool,
    /// Syslog socket path
    #[serde(default = "default_syslog_socket")]
    pub syslog_socket: PathBuf,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            trace: true,
            events: true,
            action_log_file: None,
            syslog: true,
            syslog_socket: default_syslog_socket(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_syslog_socket() -> PathBuf {
    PathBuf::from("/dev/log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_config_defaults_from_empty_table() {
        let config: SinkConfig = serde_json::from_str("{}").unwrap();
        assert!(config.trace);
        assert!(config.events);
        assert!(config.syslog);
        assert!(config.action_log_file.is_none());
        assert_eq!(config.syslog_socket, PathBuf::from("/dev/log"));
    }
}

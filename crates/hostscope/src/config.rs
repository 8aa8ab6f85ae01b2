//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use hostscope_core::{RunnerConfig, SinkConfig};
use hostscope_export::Format;
use hostscope_inventory::rules::DEFAULT_PORT_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Top-level configuration for a collection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Where and how reports are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for report files (created if missing)
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_formats")]
    pub formats: Vec<Format>,
    /// File name prefix; the machine name and a timestamp are appended
    #[serde(default = "default_file_stem")]
    pub file_stem: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            formats: default_formats(),
            file_stem: default_file_stem(),
        }
    }
}

/// Diagnostics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit diagnostics as JSON lines
    #[serde(default)]
    pub json: bool,
    /// Action log sinks
    #[serde(flatten)]
    pub sinks: SinkConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            sinks: SinkConfig::default(),
        }
    }
}

/// Collection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seconds to wait for modules after a stop before abandoning them
    #[serde(default = "default_cancel_grace_secs")]
    pub cancel_grace_secs: u64,
    /// Stop the collection after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Log names summarized by the Logs area (empty: built-in list)
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default = "default_port_threshold")]
    pub listening_port_threshold: u64,
    /// Area keys to skip
    #[serde(default)]
    pub disabled: Vec<String>,
    /// How long osquery results are reused within a run
    #[serde(default = "default_osquery_cache_secs")]
    pub osquery_cache_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cancel_grace_secs: default_cancel_grace_secs(),
            timeout_secs: None,
            logs: Vec::new(),
            listening_port_threshold: default_port_threshold(),
            disabled: Vec::new(),
            osquery_cache_secs: default_osquery_cache_secs(),
        }
    }
}

impl RunConfig {
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            cancel_grace: Duration::from_secs(self.cancel_grace_secs),
        }
    }

    #[must_use]
    pub fn is_disabled(&self, area: &str) -> bool {
        self.disabled.iter().any(|d| d.eq_ignore_ascii_case(area))
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("reports")
}

fn default_formats() -> Vec<Format> {
    vec![Format::Json, Format::Html]
}

fn default_file_stem() -> String {
    "hostscope".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cancel_grace_secs() -> u64 {
    5
}

fn default_port_threshold() -> u64 {
    DEFAULT_PORT_THRESHOLD
}

fn default_osquery_cache_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("cannot read {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be parsed
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("HOSTSCOPE_CONFIG") {
            return Self::load(Path::new(&path));
        }

        for path in Self::search_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "using config file");
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("hostscope.toml"),
            PathBuf::from("/etc/hostscope/hostscope.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("hostscope/hostscope.toml"));
        }
        paths
    }

    /// Default configuration as TOML, for `init-config`
    ///
    /// # Errors
    /// Serialization failure.
    pub fn template() -> eyre::Result<String> {
        Ok(toml::to_string_pretty(&Config::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.output.formats, vec![Format::Json, Format::Html]);
        assert_eq!(config.run.cancel_grace_secs, 5);
        assert!(config.logging.sinks.trace);
    }

    #[test]
    fn test_sections_are_parsed() {
        let config: Config = toml::from_str(
            r#"
            [output]
            directory = "/var/lib/hostscope"
            formats = ["json"]

            [logging]
            level = "debug"
            json = true
            action_log_file = "/var/log/hostscope/actions.log"
            syslog = false

            [run]
            timeout_secs = 120
            logs = ["syslog", "auth.log"]
            disabled = ["packages"]
            "#,
        )
        .unwrap();

        assert_eq!(config.output.formats, vec![Format::Json]);
        assert!(config.logging.json);
        assert!(!config.logging.sinks.syslog);
        assert_eq!(
            config.logging.sinks.action_log_file,
            Some(PathBuf::from("/var/log/hostscope/actions.log"))
        );
        assert_eq!(config.run.timeout_secs, Some(120));
        assert!(config.run.is_disabled("Packages"));
        assert!(!config.run.is_disabled("Kernel"));
    }

    #[test]
    fn test_template_parses_back() {
        let template = Config::template().unwrap();
        let config: Config = toml::from_str(&template).unwrap();
        assert_eq!(config.output.file_stem, "hostscope");
        assert_eq!(
            config.run.listening_port_threshold,
            DEFAULT_PORT_THRESHOLD
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostscope.toml");
        std::fs::write(&path, "[run]\ncancel_grace_secs = 1\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.run.runner_config().cancel_grace,
            Duration::from_secs(1)
        );
    }
}

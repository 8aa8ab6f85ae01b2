//! osquery-backed inventory reader

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hostscope_core::{InventoryReader, PropertyMap, ReaderError};
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, instrument};

use crate::command::CommandRunner;
use crate::query::table_of;

/// Cached query rows
#[derive(Debug, Clone)]
struct CachedRows {
    rows: Vec<PropertyMap>,
    cached_at: Instant,
}

/// Runs queries through `osqueryi --json`
///
/// Results are cached per (scope, statement) for `ttl`. osquery has a single
/// namespace, so the scope only partitions the cache.
pub struct OsqueryInventory {
    runner: Arc<dyn CommandRunner>,
    cache: RwLock<HashMap<String, CachedRows>>,
    available: OnceCell<bool>,
    ttl: Duration,
    timeout: Duration,
}

impl OsqueryInventory {
    pub fn new(runner: Arc<dyn CommandRunner>, ttl: Duration) -> Self {
        Self {
            runner,
            cache: RwLock::new(HashMap::new()),
            available: OnceCell::new(),
            ttl,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set per-query timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check once whether `osqueryi` is installed
    pub async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                self.runner
                    .run("command -v osqueryi")
                    .await
                    .map(|out| out.success())
                    .unwrap_or(false)
            })
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn execute(&self, sql: &str) -> Result<Vec<PropertyMap>, ReaderError> {
        if !self.is_available().await {
            return Err(ReaderError::Unavailable(
                "osqueryi not found on this system".to_string(),
            ));
        }

        // single quotes inside the statement are closed, escaped and reopened
        let cmd = format!("osqueryi --json '{}'", sql.replace('\'', "'\"'\"'"));
        let output = self.runner.run_with_timeout(&cmd, self.timeout).await?;

        if !output.success() {
            if output.stderr.contains("no such table") {
                let table = table_of(sql).unwrap_or_else(|| "unknown".to_string());
                return Err(ReaderError::Unavailable(format!("table not available: {table}")));
            }
            return Err(ReaderError::QueryFailed(output.stderr.trim().to_string()));
        }

        let rows = parse_rows(&output.stdout)?;
        debug!(rows = rows.len(), "query completed");
        Ok(rows)
    }
}

/// Parse osquery's JSON array output into property maps
fn parse_rows(stdout: &str) -> Result<Vec<PropertyMap>, ReaderError> {
    let values: Vec<Value> =
        serde_json::from_str(stdout).map_err(|e| ReaderError::Parse(e.to_string()))?;

    values
        .into_iter()
        .map(|value| match value {
            Value::Object(map) => Ok(map),
            other => Err(ReaderError::Parse(format!("expected object row, got {other}"))),
        })
        .collect()
}

#[async_trait]
impl InventoryReader for OsqueryInventory {
    async fn query(
        &self,
        query: &str,
        scope: Option<&str>,
    ) -> Result<Vec<PropertyMap>, ReaderError> {
        let key = format!("{}\u{1f}{query}", scope.unwrap_or_default());

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&key)
                && cached.cached_at.elapsed() <= self.ttl
            {
                debug!("cache hit");
                return Ok(cached.rows.clone());
            }
        }

        let rows = self.execute(query).await?;

        self.cache.write().await.insert(
            key,
            CachedRows {
                rows: rows.clone(),
                cached_at: Instant::now(),
            },
        );

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::command::CommandOutput;
    use crate::error::CommandError;

    /// Answers `command -v` with success and every other command with `reply`
    struct ScriptedRunner {
        reply: CommandOutput,
        queries: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(status: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                reply: CommandOutput {
                    status,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                    duration: Duration::from_millis(1),
                },
                queries: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, cmd: &str) -> Result<CommandOutput, CommandError> {
            if cmd.starts_with("command -v") {
                return Ok(CommandOutput {
                    status: 0,
                    stdout: "/usr/bin/osqueryi".to_string(),
                    stderr: String::new(),
                    duration: Duration::from_millis(1),
                });
            }
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        async fn run_with_timeout(
            &self,
            cmd: &str,
            _timeout: Duration,
        ) -> Result<CommandOutput, CommandError> {
            self.run(cmd).await
        }
    }

    #[tokio::test]
    async fn test_rows_are_parsed_and_cached() {
        let runner = Arc::new(ScriptedRunner::new(
            0,
            r#"[{"name":"curl","version":"8.5.0"},{"name":"vim","version":"9.1"}]"#,
            "",
        ));
        let osquery = OsqueryInventory::new(runner.clone(), Duration::from_secs(60));

        let rows = osquery.query("SELECT * FROM deb_packages", None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "curl");

        let again = osquery.query("SELECT * FROM deb_packages", None).await.unwrap();
        assert_eq!(again, rows);
        assert_eq!(runner.queries.load(Ordering::SeqCst), 1);

        // a different scope does not share the cache entry
        osquery
            .query("SELECT * FROM deb_packages", Some("other"))
            .await
            .unwrap();
        assert_eq!(runner.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_table_is_unavailable() {
        let runner = Arc::new(ScriptedRunner::new(1, "", "Error: no such table: rpm_packages"));
        let osquery = OsqueryInventory::new(runner, Duration::ZERO);

        let err = osquery
            .query("SELECT name FROM rpm_packages", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::Unavailable(msg) if msg.contains("rpm_packages")));
    }

    #[tokio::test]
    async fn test_malformed_output_is_parse_error() {
        let runner = Arc::new(ScriptedRunner::new(0, "[1, 2]", ""));
        let osquery = OsqueryInventory::new(runner, Duration::ZERO);

        let err = osquery.query("SELECT 1", None).await.unwrap_err();
        assert!(matches!(err, ReaderError::Parse(_)));
    }
}

//! The `run` command: collect, evaluate rules, export

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hostscope_api::{AnalyzerResult, Severity};
use hostscope_core::{CancellationToken, Runner};
use hostscope_export::{Format, exporter_for};
use hostscope_inventory::default_engine;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::factory;

const SESSION_AREA: &str = "Session";
const EXPORT_AREA: &str = "Export";

/// Command-line overrides for one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub formats: Vec<Format>,
    pub timeout: Option<Duration>,
}

/// What a run produced
#[derive(Debug)]
pub struct RunSummary {
    pub result: AnalyzerResult,
    pub reports: Vec<PathBuf>,
}

/// Report file path: `<dir>/<stem>-<machine>-<timestamp>.<ext>`
pub fn report_path(
    directory: &Path,
    stem: &str,
    machine: &str,
    timestamp: DateTime<Utc>,
    format: Format,
) -> PathBuf {
    let machine: String = machine
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    directory.join(format!(
        "{stem}-{machine}-{}.{}",
        timestamp.format("%Y%m%dT%H%M%SZ"),
        format.extension()
    ))
}

/// First Ctrl-C stops the collection, a second one abandons the export
async fn watch_interrupts(stop: CancellationToken, export: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    warn!("interrupt received, stopping collection");
    stop.cancel();
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("second interrupt, abandoning export");
        export.cancel();
    }
}

/// Run every enabled module and write the configured reports
///
/// # Errors
/// Returns an error if no module is enabled or any report fails to export.
#[instrument(skip_all)]
pub async fn execute(config: &Config, options: RunOptions) -> eyre::Result<RunSummary> {
    let modules = factory::modules(config);
    let runner = Runner::new(modules.clone())?.with_config(config.run.runner_config());
    let ctx = Arc::new(factory::local_context(config, &modules));
    let logger = ctx.logger.clone();

    let stop = CancellationToken::new();
    let export_cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_interrupts(stop.clone(), export_cancel.clone()));

    let timeout = options
        .timeout
        .or(config.run.timeout_secs.map(Duration::from_secs));
    if let Some(timeout) = timeout {
        let stop = stop.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => {
                    warn!(timeout_secs = timeout.as_secs(), "collection timed out");
                    stop.cancel();
                }
                () = stop.cancelled() => {}
            }
        });
    }

    let result = runner.run_all(ctx, stop.clone()).await;

    let engine = default_engine(config.run.listening_port_threshold);
    let mut result = engine.apply(result);
    logger.info(
        SESSION_AREA,
        "Rules",
        format!(
            "{} rules produced {} global findings",
            engine.len(),
            result.global_findings.len()
        ),
    );

    let directory = options
        .output
        .unwrap_or_else(|| config.output.directory.clone());
    let formats = if options.formats.is_empty() {
        config.output.formats.clone()
    } else {
        options.formats
    };
    let targets: Vec<(Format, PathBuf)> = formats
        .into_iter()
        .map(|format| {
            let path = report_path(
                &directory,
                &config.output.file_stem,
                &result.computer_name,
                result.export_timestamp,
                format,
            );
            (format, path)
        })
        .collect();
    for (format, path) in &targets {
        logger.info(
            EXPORT_AREA,
            "Write",
            format!("{format} report to {}", path.display()),
        );
    }
    result.action_log = logger.snapshot();

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (format, path) in targets {
        match exporter_for(format)
            .export(&result, &path, &export_cancel)
            .await
        {
            Ok(()) => {
                info!(path = %path.display(), "report written");
                reports.push(path);
            }
            Err(e) => {
                logger.error(EXPORT_AREA, "Write", format!("{format} report failed"), &e);
                failures.push(format!("{}: {e}", path.display()));
            }
        }
    }
    watcher.abort();

    if !failures.is_empty() {
        eyre::bail!("export failed: {}", failures.join("; "));
    }

    info!(
        areas = result.areas.len(),
        critical = result.count_severity(Severity::Critical),
        warnings = result.count_severity(Severity::Warning),
        "run finished"
    );
    Ok(RunSummary { result, reports })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_report_path() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        let path = report_path(Path::new("out"), "hostscope", "web01.lan", ts, Format::Html);
        assert_eq!(
            path,
            PathBuf::from("out/hostscope-web01_lan-20260301T123005Z.html")
        );
    }
}

//! Self-contained HTML report

use std::fmt::Write as _;
use std::path::Path;

use async_trait::async_trait;
use hostscope_api::{AnalyzerResult, AreaResult, Finding, Severity};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::atomic::atomic_write;
use crate::error::ExportError;
use crate::format::Format;
use crate::Exporter;

/// Self-contained HTML report
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExporter;

impl HtmlExporter {
    #[must_use]
    pub fn render(result: &AnalyzerResult) -> String {
        let critical = result.count_severity(Severity::Critical);
        let warnings = result.count_severity(Severity::Warning);

        let areas_html: String = result.areas.iter().map(render_area).collect();

        let global_html = if result.global_findings.is_empty() {
            r#"<p class="empty">No global findings.</p>"#.to_string()
        } else {
            render_findings(&result.global_findings)
        };

        let mut log_rows = String::new();
        for entry in &result.action_log {
            let _ = write!(
                log_rows,
                r#"
                <tr class="level-{}">
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                </tr>"#,
                entry.level.to_string().to_lowercase(),
                entry.timestamp_utc.format("%Y-%m-%d %H:%M:%S%.3fZ"),
                html_escape(&entry.area),
                html_escape(&entry.action),
                entry.level,
                html_escape(&entry.message),
                html_escape(entry.exception.as_deref().unwrap_or_default()),
            );
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>hostscope report: {computer}</title>
    <style>
        :root {{
            --critical: #dc2626;
            --warning: #ca8a04;
            --info: #2563eb;
            --completed: #16a34a;
            --failed: #dc2626;
            --canceled: #6b7280;
        }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #1f2937;
            background: #f3f4f6;
            padding: 2rem;
        }}
        .container {{ max-width: 1200px; margin: 0 auto; }}
        .header, .area, .section {{
            background: white;
            border-radius: 12px;
            padding: 1.5rem;
            margin-bottom: 1.5rem;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }}
        .header-meta {{ color: #6b7280; font-size: 0.9rem; }}
        .summary {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 1rem;
            margin-bottom: 1.5rem;
        }}
        .summary-card {{
            background: white;
            border-radius: 12px;
            padding: 1.5rem;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }}
        .summary-card h3 {{ font-size: 0.875rem; color: #6b7280; text-transform: uppercase; }}
        .summary-value {{ font-size: 2rem; font-weight: 700; }}
        .summary-value.critical {{ color: var(--critical); }}
        .summary-value.warning {{ color: var(--warning); }}
        .area-header {{ display: flex; gap: 0.75rem; align-items: center; margin-bottom: 0.5rem; }}
        .badge {{
            padding: 0.125rem 0.625rem;
            border-radius: 9999px;
            font-size: 0.75rem;
            font-weight: 600;
            text-transform: uppercase;
            color: white;
        }}
        .badge.completed {{ background: var(--completed); }}
        .badge.failed {{ background: var(--failed); }}
        .badge.canceled {{ background: var(--canceled); }}
        .counts {{ color: #6b7280; font-size: 0.875rem; }}
        .finding {{ border-left: 4px solid; padding: 0.5rem 1rem; margin: 0.5rem 0; }}
        .finding.severity-critical {{ border-color: var(--critical); background: #fef2f2; }}
        .finding.severity-warning {{ border-color: var(--warning); background: #fefce8; }}
        .finding.severity-info {{ border-color: var(--info); background: #eff6ff; }}
        .finding-context {{ color: #6b7280; font-size: 0.875rem; }}
        ul.messages {{ margin: 0.5rem 0 0.5rem 1.5rem; }}
        pre {{ background: #1f2937; color: #e5e7eb; padding: 1rem; border-radius: 8px; overflow-x: auto; }}
        table {{ width: 100%; border-collapse: collapse; font-size: 0.8rem; }}
        th, td {{ text-align: left; padding: 0.25rem 0.5rem; border-bottom: 1px solid #e5e7eb; }}
        tr.level-warning td {{ color: var(--warning); }}
        tr.level-error td {{ color: var(--critical); }}
        .empty {{ color: #6b7280; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>hostscope report</h1>
            <div class="header-meta">
                {computer} &middot; exported {timestamp} &middot; session {session}
            </div>
        </div>
        <div class="summary">
            <div class="summary-card"><h3>Critical</h3><div class="summary-value critical">{critical}</div></div>
            <div class="summary-card"><h3>Warnings</h3><div class="summary-value warning">{warnings}</div></div>
            <div class="summary-card"><h3>Areas</h3><div class="summary-value">{area_count}</div></div>
        </div>
        <div class="section">
            <h2>Global findings</h2>
            {global_html}
        </div>
        {areas_html}
        <div class="section">
            <h2>Action log</h2>
            <table>
                <thead>
                    <tr><th>Time (UTC)</th><th>Area</th><th>Action</th><th>Level</th><th>Message</th><th>Exception</th></tr>
                </thead>
                <tbody>{log_rows}
                </tbody>
            </table>
        </div>
    </div>
</body>
</html>
"#,
            computer = html_escape(&result.computer_name),
            timestamp = result.export_timestamp.to_rfc3339(),
            session = result.session_id,
            area_count = result.areas.len(),
        )
    }
}

fn render_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| {
            let context = f
                .context
                .as_deref()
                .map(|c| format!(r#"<div class="finding-context">{}</div>"#, html_escape(c)))
                .unwrap_or_default();
            format!(
                r#"
            <div class="finding severity-{}">
                <strong>{}</strong> {}
                {}
            </div>"#,
                f.severity.as_str(),
                f.severity,
                html_escape(&f.message),
                context,
            )
        })
        .collect()
}

fn render_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", html_escape(m)))
        .collect();
    format!(r#"<ul class="messages">{items}</ul>"#)
}

fn render_area(area: &AreaResult) -> String {
    let details = serde_json::to_string_pretty(&area.details).unwrap_or_default();
    format!(
        r#"
        <div class="area" id="area-{id}">
            <div class="area-header">
                <h2>{name}</h2>
                <span class="badge {outcome}">{outcome}</span>
                <span class="counts">{warning_count} warnings, {error_count} errors</span>
            </div>
            {findings}
            {warnings}
            {errors}
            <details>
                <summary>Details</summary>
                <pre><code>{details}</code></pre>
            </details>
        </div>"#,
        id = html_escape(&area.area.to_lowercase()),
        name = html_escape(&area.area),
        outcome = area.outcome.as_str(),
        warning_count = area.warnings.len(),
        error_count = area.errors.len(),
        findings = render_findings(&area.anomalies),
        warnings = render_messages(&area.warnings),
        errors = render_messages(&area.errors),
        details = html_escape(&details),
    )
}

/// Escape text for HTML element and attribute content
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[async_trait]
impl Exporter for HtmlExporter {
    fn format(&self) -> Format {
        Format::Html
    }

    #[instrument(skip(self, result, cancel), fields(path = %target.display()))]
    async fn export(
        &self,
        result: &AnalyzerResult,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ExportError> {
        let html = Self::render(result);
        if cancel.is_cancelled() {
            return Err(ExportError::Canceled);
        }
        atomic_write(target, html.into_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }
}

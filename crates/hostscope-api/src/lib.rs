//! hostscope-api: Shared report types
//!
//! Contains the aggregate report model, per-area results, findings and action
//! log entries used across the runner, the rule engine and the exporters.

pub mod details;
pub mod finding;
pub mod log;
pub mod report;

pub use details::{DetailError, Details};
pub use finding::{Finding, Severity};
pub use log::{ActionLogEntry, LogLevel};
pub use report::{AnalyzerResult, AreaOutcome, AreaResult};

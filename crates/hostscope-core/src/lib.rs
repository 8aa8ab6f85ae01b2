//! hostscope-core: Collection orchestration
//!
//! Runs every analyzer module concurrently with per-module failure isolation,
//! funnels diagnostics through the multi-sink [`ActionLogger`] and evaluates
//! rules over the assembled aggregate.

pub mod config;
pub mod context;
pub mod error;
pub mod logger;
pub mod module;
pub mod readers;
pub mod rules;
pub mod runner;

pub use config::{RunnerConfig, SinkConfig};
pub use context::{AnalyzerContext, AnalyzerContextBuilder};
pub use error::{CoreError, ModuleError, ReaderError};
pub use logger::{ActionLogger, AreaCodes, LogSink, SinkError, SinkMeta};
pub use module::{AnalyzerModule, check_canceled};
pub use readers::{
    FirewallReader, FirewallRule, FirewallSnapshot, HostReader, InventoryReader, LogReader,
    LogSummary, PropertyMap, RegistryReader, UnavailableReader,
};
pub use rules::{Rule, RuleEngine};
pub use runner::Runner;

pub use tokio_util::sync::CancellationToken;

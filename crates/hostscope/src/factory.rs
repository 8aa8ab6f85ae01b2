//! Composition of modules, collaborators and the action logger

use std::sync::Arc;
use std::time::Duration;

use hostscope_core::{ActionLogger, AnalyzerContext, AnalyzerModule, AreaCodes};
use hostscope_inventory::analyzers;
use hostscope_inventory::{
    CommandRunner, IptablesFirewall, LocalCommandRunner, LocalHost, OsqueryInventory,
    SysctlRegistry, VarLogReader,
};

use crate::config::Config;

/// Enabled analyzer modules in registration order
pub fn modules(config: &Config) -> Vec<Arc<dyn AnalyzerModule>> {
    analyzers::all(config.run.logs.clone())
        .into_iter()
        .filter(|m| !config.run.is_disabled(m.area()))
        .collect()
}

/// Context backed by the local host
pub fn local_context(config: &Config, modules: &[Arc<dyn AnalyzerModule>]) -> AnalyzerContext {
    let codes = AreaCodes::from_areas(modules.iter().map(|m| m.area()));
    let logger = Arc::new(ActionLogger::from_config(&config.logging.sinks, codes));
    let runner: Arc<dyn CommandRunner> = Arc::new(LocalCommandRunner::new());
    let cache_ttl = Duration::from_secs(config.run.osquery_cache_secs);

    AnalyzerContext::builder(logger)
        .registry(Arc::new(SysctlRegistry::default()))
        .inventory(Arc::new(OsqueryInventory::new(runner.clone(), cache_ttl)))
        .logs(Arc::new(VarLogReader::default()))
        .firewall(Arc::new(IptablesFirewall::new(runner)))
        .host(Arc::new(LocalHost::detect()))
        .build()
}

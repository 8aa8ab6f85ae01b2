//! Shared, read-only context handed to every analyzer module

use std::sync::Arc;

use crate::logger::ActionLogger;
use crate::readers::{
    FirewallReader, HostReader, InventoryReader, LogReader, RegistryReader, UnavailableReader,
};

/// Collaborators available to analyzer modules during one run
///
/// The context is shared by all modules through an `Arc`; modules only read
/// from it. The logger is the one component that accepts concurrent writes.
pub struct AnalyzerContext {
    pub logger: Arc<ActionLogger>,
    pub registry: Arc<dyn RegistryReader>,
    pub inventory: Arc<dyn InventoryReader>,
    pub logs: Arc<dyn LogReader>,
    pub firewall: Arc<dyn FirewallReader>,
    pub host: Arc<dyn HostReader>,
}

impl AnalyzerContext {
    /// Start building a context around `logger`
    ///
    /// Readers that are not set explicitly default to [`UnavailableReader`].
    #[must_use]
    pub fn builder(logger: Arc<ActionLogger>) -> AnalyzerContextBuilder {
        AnalyzerContextBuilder::new(logger)
    }
}

/// Builder for [`AnalyzerContext`]
pub struct AnalyzerContextBuilder {
    logger: Arc<ActionLogger>,
    registry: Option<Arc<dyn RegistryReader>>,
    inventory: Option<Arc<dyn InventoryReader>>,
    logs: Option<Arc<dyn LogReader>>,
    firewall: Option<Arc<dyn FirewallReader>>,
    host: Option<Arc<dyn HostReader>>,
}

impl AnalyzerContextBuilder {
    fn new(logger: Arc<ActionLogger>) -> Self {
        Self {
            logger,
            registry: None,
            inventory: None,
            logs: None,
            firewall: None,
            host: None,
        }
    }

    #[must_use]
    pub fn registry(mut self, reader: Arc<dyn RegistryReader>) -> Self {
        self.registry = Some(reader);
        self
    }

    #[must_use]
    pub fn inventory(mut self, reader: Arc<dyn InventoryReader>) -> Self {
        self.inventory = Some(reader);
        self
    }

    #[must_use]
    pub fn logs(mut self, reader: Arc<dyn LogReader>) -> Self {
        self.logs = Some(reader);
        self
    }

    #[must_use]
    pub fn firewall(mut self, reader: Arc<dyn FirewallReader>) -> Self {
        self.firewall = Some(reader);
        self
    }

    #[must_use]
    pub fn host(mut self, reader: Arc<dyn HostReader>) -> Self {
        self.host = Some(reader);
        self
    }

    #[must_use]
    pub fn build(self) -> AnalyzerContext {
        let unavailable = Arc::new(UnavailableReader);
        AnalyzerContext {
            logger: self.logger,
            registry: self.registry.unwrap_or_else(|| unavailable.clone()),
            inventory: self.inventory.unwrap_or_else(|| unavailable.clone()),
            logs: self.logs.unwrap_or_else(|| unavailable.clone()),
            firewall: self.firewall.unwrap_or_else(|| unavailable.clone()),
            host: self.host.unwrap_or(unavailable),
        }
    }
}

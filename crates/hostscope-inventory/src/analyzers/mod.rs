//! Analyzer modules, one per inventory area

mod firewall;
mod kernel;
mod logs;
mod network;
mod packages;
mod system;

use std::sync::Arc;

use hostscope_core::{AnalyzerModule, PropertyMap, ReaderError};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use firewall::FirewallAnalyzer;
pub use kernel::KernelAnalyzer;
pub use logs::LogsAnalyzer;
pub use network::NetworkAnalyzer;
pub use packages::PackagesAnalyzer;
pub use system::SystemAnalyzer;

/// Area keys, also used by the inventory rules
pub mod areas {
    pub const SYSTEM: &str = "System";
    pub const KERNEL: &str = "Kernel";
    pub const PACKAGES: &str = "Packages";
    pub const NETWORK: &str = "Network";
    pub const LOGS: &str = "Logs";
    pub const FIREWALL: &str = "Firewall";
}

/// Every built-in analyzer in registration order
#[must_use]
pub fn all(log_names: Vec<String>) -> Vec<Arc<dyn AnalyzerModule>> {
    vec![
        Arc::new(SystemAnalyzer) as Arc<dyn AnalyzerModule>,
        Arc::new(KernelAnalyzer::default()),
        Arc::new(PackagesAnalyzer),
        Arc::new(NetworkAnalyzer),
        Arc::new(LogsAnalyzer::new(log_names)),
        Arc::new(FirewallAnalyzer),
    ]
}

/// Deserialize inventory rows into typed records
fn typed_rows<T: DeserializeOwned>(rows: Vec<PropertyMap>) -> Result<Vec<T>, ReaderError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(Value::Object(row))
                .map_err(|e| ReaderError::Parse(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory collaborators for analyzer tests

    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use hostscope_core::{
        ActionLogger, AnalyzerContext, FirewallReader, FirewallRule, InventoryReader, LogReader,
        LogSummary, PropertyMap, ReaderError, RegistryReader,
    };
    use serde_json::Value;

    use crate::query::table_of;

    pub fn context() -> hostscope_core::AnalyzerContextBuilder {
        AnalyzerContext::builder(Arc::new(ActionLogger::in_memory()))
    }

    /// Registry keyed by `path/name`
    #[derive(Default)]
    pub struct MapRegistry(pub HashMap<String, String>);

    impl MapRegistry {
        pub fn with(mut self, path: &str, name: &str, value: &str) -> Self {
            self.0.insert(format!("{path}/{name}"), value.to_string());
            self
        }
    }

    #[async_trait]
    impl RegistryReader for MapRegistry {
        async fn get_value(&self, path: &str, name: &str) -> Result<Option<String>, ReaderError> {
            Ok(self.0.get(&format!("{path}/{name}")).cloned())
        }

        async fn enumerate_sub_keys(&self, _path: &str) -> Result<Vec<String>, ReaderError> {
            Ok(Vec::new())
        }

        async fn enumerate_value_names(&self, _path: &str) -> Result<Vec<String>, ReaderError> {
            Ok(Vec::new())
        }
    }

    /// Inventory answering by table name; unknown tables are unavailable
    #[derive(Default)]
    pub struct TableInventory(pub HashMap<String, Vec<PropertyMap>>);

    impl TableInventory {
        pub fn with(mut self, table: &str, rows: Value) -> Self {
            let rows = rows
                .as_array()
                .map(|rows| {
                    rows.iter()
                        .filter_map(|r| r.as_object().cloned())
                        .collect()
                })
                .unwrap_or_default();
            self.0.insert(table.to_string(), rows);
            self
        }
    }

    #[async_trait]
    impl InventoryReader for TableInventory {
        async fn query(
            &self,
            query: &str,
            _scope: Option<&str>,
        ) -> Result<Vec<PropertyMap>, ReaderError> {
            let table = table_of(query).unwrap_or_default();
            self.0
                .get(&table)
                .cloned()
                .ok_or_else(|| ReaderError::Unavailable(format!("table not available: {table}")))
        }
    }

    #[derive(Default)]
    pub struct MapLogs(pub HashMap<String, LogSummary>);

    #[async_trait]
    impl LogReader for MapLogs {
        async fn summary(&self, log_name: &str) -> Result<Option<LogSummary>, ReaderError> {
            Ok(self.0.get(log_name).cloned())
        }
    }

    pub struct StaticFirewall {
        pub profiles: Vec<String>,
        pub rules: Vec<FirewallRule>,
    }

    impl StaticFirewall {
        pub fn new(listing: &[(&str, &str, &str)]) -> Self {
            let rules: Vec<FirewallRule> = listing
                .iter()
                .map(|(profile, action, spec)| FirewallRule {
                    profile: (*profile).to_string(),
                    action: (*action).to_string(),
                    spec: (*spec).to_string(),
                })
                .collect();
            let mut profiles: Vec<String> = rules.iter().map(|r| r.profile.clone()).collect();
            profiles.dedup();
            Self { profiles, rules }
        }
    }

    #[async_trait]
    impl FirewallReader for StaticFirewall {
        async fn profiles(&self) -> Result<Vec<String>, ReaderError> {
            Ok(self.profiles.clone())
        }

        async fn rules(&self) -> Result<Vec<FirewallRule>, ReaderError> {
            Ok(self.rules.clone())
        }
    }
}

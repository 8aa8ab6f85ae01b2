//! Collaborator reader traits
//!
//! Analyzer modules only ever talk to the host through these traits. Concrete
//! backends live in `hostscope-inventory`; [`UnavailableReader`] stands in for
//! any source that is not wired.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReaderError;

/// One row returned by an inventory query
pub type PropertyMap = Map<String, Value>;

/// Hierarchical key/value store (registry-like)
#[async_trait]
pub trait RegistryReader: Send + Sync {
    /// Read a single value; `Ok(None)` when the value does not exist
    async fn get_value(&self, path: &str, name: &str) -> Result<Option<String>, ReaderError>;

    /// List child keys of `path`
    async fn enumerate_sub_keys(&self, path: &str) -> Result<Vec<String>, ReaderError>;

    /// List value names directly under `path`
    async fn enumerate_value_names(&self, path: &str) -> Result<Vec<String>, ReaderError>;
}

/// Management/inventory query source
#[async_trait]
pub trait InventoryReader: Send + Sync {
    /// Run `query` and return one property map per row
    ///
    /// `scope` narrows the query to a backend-specific namespace.
    async fn query(&self, query: &str, scope: Option<&str>)
    -> Result<Vec<PropertyMap>, ReaderError>;
}

/// Summary of one system log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    /// Number of records in the log
    pub count: u64,
    /// Last modification time
    pub last_write_time_utc: Option<DateTime<Utc>>,
}

/// System log source
#[async_trait]
pub trait LogReader: Send + Sync {
    /// Summarize `log_name`; `Ok(None)` when the log does not exist
    async fn summary(&self, log_name: &str) -> Result<Option<LogSummary>, ReaderError>;
}

/// Firewall rule descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Profile (table/chain) the rule belongs to
    pub profile: String,
    /// Target action (ACCEPT, DROP, ...)
    pub action: String,
    /// Raw rule text as listed by the backend
    pub spec: String,
}

/// Profiles and rules read together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallSnapshot {
    pub profiles: Vec<String>,
    pub rules: Vec<FirewallRule>,
}

/// Firewall configuration source
#[async_trait]
pub trait FirewallReader: Send + Sync {
    async fn profiles(&self) -> Result<Vec<String>, ReaderError>;

    async fn rules(&self) -> Result<Vec<FirewallRule>, ReaderError>;

    /// Profiles and rules from one look at the backend
    ///
    /// The default reads them separately; backends that list both at once
    /// should override it.
    async fn snapshot(&self) -> Result<FirewallSnapshot, ReaderError> {
        Ok(FirewallSnapshot {
            profiles: self.profiles().await?,
            rules: self.rules().await?,
        })
    }
}

/// Environment of the running host
pub trait HostReader: Send + Sync {
    fn machine_name(&self) -> String;

    fn os_version(&self) -> String;

    /// Pointer width of the running OS in bits
    fn bitness(&self) -> u32;

    /// Name of the user running the collection
    fn user_name(&self) -> String;

    /// Whether the collection runs with administrative rights
    fn is_privileged(&self) -> bool;
}

/// Reader for sources that are not wired or not supported
///
/// Every query fails with [`ReaderError::Unavailable`]; host queries return
/// placeholders.
#[derive(Debug, Clone, Default)]
pub struct UnavailableReader;

impl UnavailableReader {
    fn error() -> ReaderError {
        ReaderError::Unavailable("no reader configured".to_string())
    }
}

#[async_trait]
impl RegistryReader for UnavailableReader {
    async fn get_value(&self, _path: &str, _name: &str) -> Result<Option<String>, ReaderError> {
        Err(Self::error())
    }

    async fn enumerate_sub_keys(&self, _path: &str) -> Result<Vec<String>, ReaderError> {
        Err(Self::error())
    }

    async fn enumerate_value_names(&self, _path: &str) -> Result<Vec<String>, ReaderError> {
        Err(Self::error())
    }
}

#[async_trait]
impl InventoryReader for UnavailableReader {
    async fn query(
        &self,
        _query: &str,
        _scope: Option<&str>,
    ) -> Result<Vec<PropertyMap>, ReaderError> {
        Err(Self::error())
    }
}

#[async_trait]
impl LogReader for UnavailableReader {
    async fn summary(&self, _log_name: &str) -> Result<Option<LogSummary>, ReaderError> {
        Err(Self::error())
    }
}

#[async_trait]
impl FirewallReader for UnavailableReader {
    async fn profiles(&self) -> Result<Vec<String>, ReaderError> {
        Err(Self::error())
    }

    async fn rules(&self) -> Result<Vec<FirewallRule>, ReaderError> {
        Err(Self::error())
    }
}

impl HostReader for UnavailableReader {
    fn machine_name(&self) -> String {
        "unknown".to_string()
    }

    fn os_version(&self) -> String {
        "unknown".to_string()
    }

    fn bitness(&self) -> u32 {
        usize::BITS
    }

    fn user_name(&self) -> String {
        "unknown".to_string()
    }

    fn is_privileged(&self) -> bool {
        false
    }
}

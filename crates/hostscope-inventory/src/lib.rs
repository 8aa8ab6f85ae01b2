//! hostscope-inventory: Linux collaborators and analyzer modules
//!
//! Backs the collaborator traits of `hostscope-core` with local data sources
//! (osquery, `/proc/sys`, `/var/log`, iptables) and provides one analyzer
//! module per inventory area plus the rules that inspect their payloads.

pub mod analyzers;
pub mod command;
pub mod error;
pub mod firewall;
pub mod host;
pub mod logs;
pub mod osquery;
pub mod query;
pub mod rules;
pub mod sysctl;

pub use analyzers::{
    FirewallAnalyzer, KernelAnalyzer, LogsAnalyzer, NetworkAnalyzer, PackagesAnalyzer,
    SystemAnalyzer,
};
pub use command::{CommandOutput, CommandRunner, LocalCommandRunner};
pub use error::CommandError;
pub use firewall::IptablesFirewall;
pub use host::LocalHost;
pub use logs::VarLogReader;
pub use osquery::OsqueryInventory;
pub use rules::{FirewallDisabledRule, IpForwardingRule, ListeningPortsRule, default_engine};
pub use sysctl::SysctlRegistry;

//! Rules over the inventory areas' payloads

use hostscope_api::{AnalyzerResult, AreaOutcome, AreaResult, Finding};
use hostscope_core::{Rule, RuleEngine};

use crate::analyzers::areas::{FIREWALL, KERNEL, NETWORK};

/// Listening port count above which [`ListeningPortsRule`] warns
pub const DEFAULT_PORT_THRESHOLD: u64 = 20;

fn completed<'a>(result: &'a AnalyzerResult, area: &str) -> Option<&'a AreaResult> {
    result
        .area(area)
        .filter(|a| a.outcome == AreaOutcome::Completed)
}

/// Critical when the firewall filters nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct FirewallDisabledRule;

impl Rule for FirewallDisabledRule {
    fn id(&self) -> &str {
        "firewall-disabled"
    }

    fn evaluate(&self, result: &AnalyzerResult) -> Option<Finding> {
        let enabled = completed(result, FIREWALL)?.details.get_bool("enabled").ok()?;
        (!enabled).then(|| {
            Finding::critical("host firewall does not drop or reject any traffic")
                .with_context(FIREWALL)
        })
    }
}

/// Warns when the host routes IPv4 traffic
#[derive(Debug, Clone, Copy, Default)]
pub struct IpForwardingRule;

impl Rule for IpForwardingRule {
    fn id(&self) -> &str {
        "ip-forwarding"
    }

    fn evaluate(&self, result: &AnalyzerResult) -> Option<Finding> {
        let value = completed(result, KERNEL)?
            .details
            .get_str("sysctl.net/ipv4/ip_forward")
            .ok()?;
        (value == "1").then(|| {
            Finding::warning("IPv4 forwarding is enabled").with_context("net.ipv4.ip_forward = 1")
        })
    }
}

/// Warns when more ports are listening than expected
#[derive(Debug, Clone, Copy)]
pub struct ListeningPortsRule {
    threshold: u64,
}

impl ListeningPortsRule {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }
}

impl Default for ListeningPortsRule {
    fn default() -> Self {
        Self::new(DEFAULT_PORT_THRESHOLD)
    }
}

impl Rule for ListeningPortsRule {
    fn id(&self) -> &str {
        "listening-ports"
    }

    fn evaluate(&self, result: &AnalyzerResult) -> Option<Finding> {
        let count = completed(result, NETWORK)?
            .details
            .get_u64("listening_port_count")
            .ok()?;
        (count > self.threshold).then(|| {
            Finding::warning(format!("{count} ports are listening"))
                .with_context(format!("threshold {}", self.threshold))
        })
    }
}

/// Outcome rules plus every inventory rule
#[must_use]
pub fn default_engine(port_threshold: u64) -> RuleEngine {
    RuleEngine::with_outcome_rules()
        .with_rule(FirewallDisabledRule)
        .with_rule(IpForwardingRule)
        .with_rule(ListeningPortsRule::new(port_threshold))
}

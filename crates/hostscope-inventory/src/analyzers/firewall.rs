//! Firewall area: profiles, default policies and filtering rules

use std::collections::BTreeMap;

use async_trait::async_trait;
use hostscope_api::{AreaResult, Details};
use hostscope_core::{
    AnalyzerContext, AnalyzerModule, CancellationToken, FirewallRule, FirewallSnapshot,
    ModuleError, check_canceled,
};
use serde_json::json;

use super::areas::FIREWALL;

fn is_policy(rule: &FirewallRule) -> bool {
    rule.spec.starts_with("-P")
}

fn is_filtering(rule: &FirewallRule) -> bool {
    matches!(rule.action.to_ascii_uppercase().as_str(), "DROP" | "REJECT")
}

/// Firewall profiles, rule counts and whether anything is filtered
///
/// `enabled` is true when any rule or chain policy drops or rejects traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirewallAnalyzer;

#[async_trait]
impl AnalyzerModule for FirewallAnalyzer {
    fn name(&self) -> &str {
        "Firewall"
    }

    fn area(&self) -> &str {
        FIREWALL
    }

    async fn analyze(
        &self,
        ctx: &AnalyzerContext,
        cancel: &CancellationToken,
    ) -> Result<AreaResult, ModuleError> {
        check_canceled(cancel)?;
        let FirewallSnapshot { profiles, rules } = ctx.firewall.snapshot().await?;
        check_canceled(cancel)?;

        let policies: BTreeMap<&str, &str> = rules
            .iter()
            .filter(|r| is_policy(r))
            .map(|r| (r.profile.as_str(), r.action.as_str()))
            .collect();
        let rule_count = rules.iter().filter(|r| !is_policy(r)).count();
        let enabled = rules.iter().any(is_filtering);

        ctx.logger.info(
            FIREWALL,
            "Collect",
            format!(
                "{} profiles, {rule_count} rules, filtering {}",
                profiles.len(),
                if enabled { "enabled" } else { "disabled" }
            ),
        );

        let details = Details::new()
            .with("profiles", json!(profiles))
            .with("policies", json!(policies))
            .with("rule_count", rule_count)
            .with("enabled", enabled);

        Ok(AreaResult::new(FIREWALL)
            .with_summary(json!({ "enabled": enabled, "rule_count": rule_count }))
            .with_details(details))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use hostscope_core::{FirewallReader, ReaderError};

    use super::*;
    use crate::analyzers::testing::{self, StaticFirewall};

    /// Answers only whole snapshots
    struct SnapshotOnly;

    #[async_trait]
    impl FirewallReader for SnapshotOnly {
        async fn profiles(&self) -> Result<Vec<String>, ReaderError> {
            Err(ReaderError::QueryFailed("listed twice".to_string()))
        }

        async fn rules(&self) -> Result<Vec<FirewallRule>, ReaderError> {
            Err(ReaderError::QueryFailed("listed twice".to_string()))
        }

        async fn snapshot(&self) -> Result<FirewallSnapshot, ReaderError> {
            Ok(FirewallSnapshot {
                profiles: vec!["INPUT".to_string()],
                rules: vec![FirewallRule {
                    profile: "INPUT".to_string(),
                    action: "REJECT".to_string(),
                    spec: "-A INPUT -p tcp --dport 23 -j REJECT".to_string(),
                }],
            })
        }
    }

    #[tokio::test]
    async fn test_default_drop_policy_counts_as_enabled() {
        let firewall = StaticFirewall::new(&[
            ("INPUT", "DROP", "-P INPUT DROP"),
            ("INPUT", "ACCEPT", "-A INPUT -i lo -j ACCEPT"),
            ("OUTPUT", "ACCEPT", "-P OUTPUT ACCEPT"),
        ]);
        let ctx = testing::context().firewall(Arc::new(firewall)).build();

        let result = FirewallAnalyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.details.get_bool("enabled").unwrap());
        assert_eq!(result.details.get_u64("rule_count").unwrap(), 1);
        assert_eq!(result.details.get_str("policies.INPUT").unwrap(), "DROP");
    }

    #[tokio::test]
    async fn test_accept_everything_is_disabled() {
        let firewall = StaticFirewall::new(&[
            ("INPUT", "ACCEPT", "-P INPUT ACCEPT"),
            ("FORWARD", "ACCEPT", "-P FORWARD ACCEPT"),
        ]);
        let ctx = testing::context().firewall(Arc::new(firewall)).build();

        let result = FirewallAnalyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!result.details.get_bool("enabled").unwrap());
        assert_eq!(result.details.get_array("profiles").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reads_one_snapshot() {
        let ctx = testing::context().firewall(Arc::new(SnapshotOnly)).build();

        let result = FirewallAnalyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.details.get_bool("enabled").unwrap());
        assert_eq!(result.details.get_u64("rule_count").unwrap(), 1);
    }
}

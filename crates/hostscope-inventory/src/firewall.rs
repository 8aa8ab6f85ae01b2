//! Firewall reader backed by `iptables -S`
//!
//! Chains are reported as profiles. Chain policies (`-P INPUT DROP`) are
//! reported as rules whose `spec` starts with `-P`, so that a default-deny
//! setup without explicit rules still shows up as filtering.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hostscope_core::{FirewallReader, FirewallRule, FirewallSnapshot, ReaderError};
use tracing::debug;

use crate::command::CommandRunner;

const LIST_COMMAND: &str = "iptables -S";
const LIST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct IptablesFirewall {
    runner: Arc<dyn CommandRunner>,
}

impl IptablesFirewall {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn listing(&self) -> Result<String, ReaderError> {
        let output = self
            .runner
            .run_with_timeout(LIST_COMMAND, LIST_TIMEOUT)
            .await?;

        if output.not_found() {
            return Err(ReaderError::Unavailable(format!("{LIST_COMMAND} not installed")));
        }
        if !output.success() {
            return Err(ReaderError::QueryFailed(output.stderr.trim().to_string()));
        }

        debug!(bytes = output.stdout.len(), "firewall listing read");
        Ok(output.stdout)
    }
}

/// Chain names declared in an `iptables -S` listing, in order
fn parse_chains(listing: &str) -> Vec<String> {
    let mut chains: Vec<String> = Vec::new();
    for line in listing.lines() {
        let mut parts = line.split_whitespace();
        if let (Some("-P" | "-N"), Some(chain)) = (parts.next(), parts.next())
            && !chains.iter().any(|c| c == chain)
        {
            chains.push(chain.to_string());
        }
    }
    chains
}

/// Rules and policies of an `iptables -S` listing
fn parse_rules(listing: &str) -> Vec<FirewallRule> {
    listing
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                ["-P", chain, policy] => Some(FirewallRule {
                    profile: (*chain).to_string(),
                    action: (*policy).to_string(),
                    spec: line.trim().to_string(),
                }),
                ["-A", chain, rest @ ..] => {
                    let action = rest
                        .windows(2)
                        .find(|pair| pair[0] == "-j" || pair[0] == "--jump")
                        .map(|pair| pair[1].to_string())
                        .unwrap_or_default();
                    Some(FirewallRule {
                        profile: (*chain).to_string(),
                        action,
                        spec: line.trim().to_string(),
                    })
                }
                _ => None,
            }
        })
        .collect()
}

#[async_trait]
impl FirewallReader for IptablesFirewall {
    async fn profiles(&self) -> Result<Vec<String>, ReaderError> {
        Ok(parse_chains(&self.listing().await?))
    }

    async fn rules(&self) -> Result<Vec<FirewallRule>, ReaderError> {
        Ok(parse_rules(&self.listing().await?))
    }

    async fn snapshot(&self) -> Result<FirewallSnapshot, ReaderError> {
        let listing = self.listing().await?;
        Ok(FirewallSnapshot {
            profiles: parse_chains(&listing),
            rules: parse_rules(&listing),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::command::CommandOutput;
    use crate::error::CommandError;

    const LISTING: &str = "\
-P INPUT DROP
-P FORWARD DROP
-P OUTPUT ACCEPT
-N DOCKER
-A INPUT -i lo -j ACCEPT
-A INPUT -p tcp -m tcp --dport 22 -j ACCEPT
-A DOCKER -m comment --comment \"no target\"
";

    struct FixedRunner(CommandOutput, AtomicUsize);

    impl FixedRunner {
        fn new(output: CommandOutput) -> Self {
            Self(output, AtomicUsize::new(0))
        }
    }

    #[async_trait]
    impl CommandRunner for FixedRunner {
        async fn run(&self, _cmd: &str) -> Result<CommandOutput, CommandError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.clone())
        }

        async fn run_with_timeout(
            &self,
            cmd: &str,
            _timeout: Duration,
        ) -> Result<CommandOutput, CommandError> {
            self.run(cmd).await
        }
    }

    fn output(status: i32, stdout: &str) -> CommandOutput {
        CommandOutput {
            status,
            stdout: stdout.to_string(),
            stderr: "iptables: Permission denied".to_string(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_parse_chains() {
        assert_eq!(
            parse_chains(LISTING),
            vec!["INPUT", "FORWARD", "OUTPUT", "DOCKER"]
        );
    }

    #[test]
    fn test_parse_rules() {
        let rules = parse_rules(LISTING);
        assert_eq!(rules.len(), 6);
        assert_eq!(rules[0].action, "DROP");
        assert!(rules[0].spec.starts_with("-P"));
        assert_eq!(rules[4].profile, "INPUT");
        assert_eq!(rules[4].action, "ACCEPT");
        assert_eq!(rules[5].action, "");
    }

    #[tokio::test]
    async fn test_reader_maps_failures() {
        let missing = IptablesFirewall::new(Arc::new(FixedRunner::new(output(127, ""))));
        assert!(matches!(
            missing.rules().await,
            Err(ReaderError::Unavailable(_))
        ));

        let denied = IptablesFirewall::new(Arc::new(FixedRunner::new(output(4, ""))));
        assert!(matches!(
            denied.profiles().await,
            Err(ReaderError::QueryFailed(msg)) if msg.contains("Permission denied")
        ));
    }

    #[tokio::test]
    async fn test_reader_success() {
        let firewall = IptablesFirewall::new(Arc::new(FixedRunner::new(output(0, LISTING))));
        assert_eq!(firewall.profiles().await.unwrap().len(), 4);
        assert_eq!(firewall.rules().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_snapshot_lists_once() {
        let runner = Arc::new(FixedRunner::new(output(0, LISTING)));
        let firewall = IptablesFirewall::new(runner.clone());

        let snapshot = firewall.snapshot().await.unwrap();
        assert_eq!(snapshot.profiles, vec!["INPUT", "FORWARD", "OUTPUT", "DOCKER"]);
        assert_eq!(snapshot.rules.len(), 6);
        assert_eq!(runner.1.load(Ordering::SeqCst), 1);
    }
}

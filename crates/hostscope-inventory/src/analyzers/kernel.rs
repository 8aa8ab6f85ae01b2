//! Kernel area: hardening-relevant sysctl values

use async_trait::async_trait;
use hostscope_api::{AreaResult, Details, Finding};
use hostscope_core::{
    AnalyzerContext, AnalyzerModule, CancellationToken, ModuleError, check_canceled,
};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::areas::KERNEL;

/// Hardening-relevant sysctl keys as `(key path, value name)`
pub const HARDENING_KEYS: &[(&str, &str)] = &[
    ("kernel", "randomize_va_space"),
    ("kernel", "kptr_restrict"),
    ("kernel", "dmesg_restrict"),
    ("kernel/yama", "ptrace_scope"),
    ("fs", "protected_symlinks"),
    ("fs", "protected_hardlinks"),
    ("net/ipv4", "ip_forward"),
    ("net/ipv4", "tcp_syncookies"),
    ("net/ipv4/conf/all", "accept_redirects"),
];

/// Kernel hardening settings read through the registry reader
///
/// Values land in `details.sysctl` keyed by their slash-separated path,
/// e.g. `sysctl.net/ipv4/ip_forward`.
#[derive(Debug, Clone)]
pub struct KernelAnalyzer {
    keys: Vec<(String, String)>,
}

impl KernelAnalyzer {
    pub fn new(keys: &[(&str, &str)]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|(path, name)| ((*path).to_string(), (*name).to_string()))
                .collect(),
        }
    }
}

impl Default for KernelAnalyzer {
    fn default() -> Self {
        Self::new(HARDENING_KEYS)
    }
}

#[async_trait]
impl AnalyzerModule for KernelAnalyzer {
    fn name(&self) -> &str {
        "Kernel settings"
    }

    fn area(&self) -> &str {
        KERNEL
    }

    #[instrument(skip_all, fields(area = KERNEL))]
    async fn analyze(
        &self,
        ctx: &AnalyzerContext,
        cancel: &CancellationToken,
    ) -> Result<AreaResult, ModuleError> {
        let mut values = Map::new();
        let mut missing = Vec::new();

        for (path, name) in &self.keys {
            check_canceled(cancel)?;
            let key = format!("{path}/{name}");
            match ctx.registry.get_value(path, name).await? {
                Some(value) => {
                    debug!(key = %key, value = %value, "sysctl read");
                    values.insert(key, Value::String(value));
                }
                None => missing.push(key),
            }
        }
        ctx.logger.info(
            KERNEL,
            "Collect",
            format!("read {} of {} sysctl keys", values.len(), self.keys.len()),
        );

        let mut result = AreaResult::new(KERNEL).with_summary(json!({
            "keys_read": values.len(),
            "keys_missing": missing.len(),
        }));

        for key in missing {
            result = result.with_warning(format!("sysctl {key} not present"));
        }

        if let Some(aslr) = values.get("kernel/randomize_va_space").and_then(Value::as_str)
            && aslr != "2"
        {
            result = result.with_anomaly(
                Finding::warning("address space layout randomization is not fully enabled")
                    .with_context(format!("kernel.randomize_va_space = {aslr}")),
            );
        }
        if values.get("kernel/kptr_restrict").and_then(Value::as_str) == Some("0") {
            result = result.with_anomaly(
                Finding::warning("kernel pointers are exposed to unprivileged users")
                    .with_context("kernel.kptr_restrict = 0"),
            );
        }

        Ok(result.with_details(Details::new().with("sysctl", values)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hostscope_api::AreaOutcome;
    use hostscope_core::ReaderError;

    use super::*;
    use crate::analyzers::testing::{self, MapRegistry};

    #[tokio::test]
    async fn test_hardened_kernel() {
        let registry = MapRegistry::default()
            .with("kernel", "randomize_va_space", "2")
            .with("kernel", "kptr_restrict", "1")
            .with("net/ipv4", "ip_forward", "0");
        let ctx = testing::context().registry(Arc::new(registry)).build();

        let result = KernelAnalyzer::default()
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.anomalies.is_empty());
        assert_eq!(
            result.details.get_str("sysctl.net/ipv4/ip_forward").unwrap(),
            "0"
        );
        assert_eq!(result.warnings.len(), HARDENING_KEYS.len() - 3);
        assert_eq!(result.outcome, AreaOutcome::Completed);
    }

    #[tokio::test]
    async fn test_weak_settings_are_flagged() {
        let registry = MapRegistry::default()
            .with("kernel", "randomize_va_space", "1")
            .with("kernel", "kptr_restrict", "0");
        let ctx = testing::context().registry(Arc::new(registry)).build();

        let analyzer =
            KernelAnalyzer::new(&[("kernel", "randomize_va_space"), ("kernel", "kptr_restrict")]);
        let result = analyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.anomalies.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_registry_fails() {
        let ctx = testing::context().build();
        let err = KernelAnalyzer::default()
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::Reader(ReaderError::Unavailable(_))));
    }
}

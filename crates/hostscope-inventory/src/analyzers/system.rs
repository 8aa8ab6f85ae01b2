//! System area: host identity

use async_trait::async_trait;
use hostscope_api::{AreaResult, Details, Finding};
use hostscope_core::{
    AnalyzerContext, AnalyzerModule, CancellationToken, ModuleError, check_canceled,
};
use serde_json::json;

use super::areas::SYSTEM;

/// Host identity: machine name, OS, bitness and the collecting user
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAnalyzer;

#[async_trait]
impl AnalyzerModule for SystemAnalyzer {
    fn name(&self) -> &str {
        "System information"
    }

    fn area(&self) -> &str {
        SYSTEM
    }

    async fn analyze(
        &self,
        ctx: &AnalyzerContext,
        cancel: &CancellationToken,
    ) -> Result<AreaResult, ModuleError> {
        check_canceled(cancel)?;
        let host = &ctx.host;

        let machine_name = host.machine_name();
        let os_version = host.os_version();
        let bitness = host.bitness();
        let user_name = host.user_name();
        let privileged = host.is_privileged();
        ctx.logger
            .info(SYSTEM, "Collect", format!("{machine_name} running {os_version}"));

        let details = Details::new()
            .with("machine_name", machine_name.clone())
            .with("os_version", os_version.clone())
            .with("bitness", bitness)
            .with("user_name", user_name.clone())
            .with("is_privileged", privileged);

        let mut result = AreaResult::new(SYSTEM)
            .with_summary(json!({
                "machine_name": machine_name,
                "os_version": os_version,
                "bitness": bitness,
            }))
            .with_details(details);

        if privileged {
            result = result.with_anomaly(
                Finding::info("collection ran with administrative privileges")
                    .with_context(user_name),
            );
        }
        if bitness == 32 {
            result = result.with_anomaly(Finding::warning("32-bit operating system"));
        }

        Ok(result)
    }
}

//! Network area: interface addresses and listening ports

use async_trait::async_trait;
use hostscope_api::{AreaResult, Details};
use hostscope_core::{
    AnalyzerContext, AnalyzerModule, CancellationToken, ModuleError, check_canceled,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{instrument, warn};

use super::areas::NETWORK;
use super::typed_rows;
use crate::query::queries;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InterfaceRow {
    interface: String,
    address: String,
    #[serde(default)]
    mask: String,
}

// osquery reports every column as a string
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ListeningRow {
    #[serde(default)]
    pid: String,
    port: String,
    #[serde(default)]
    protocol: String,
    #[serde(default)]
    address: String,
}

/// Interface addresses and listening sockets
///
/// Interfaces are required. Listening ports are best effort: when the table
/// cannot be read the area completes with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkAnalyzer;

#[async_trait]
impl AnalyzerModule for NetworkAnalyzer {
    fn name(&self) -> &str {
        "Network configuration"
    }

    fn area(&self) -> &str {
        NETWORK
    }

    #[instrument(skip_all, fields(area = NETWORK))]
    async fn analyze(
        &self,
        ctx: &AnalyzerContext,
        cancel: &CancellationToken,
    ) -> Result<AreaResult, ModuleError> {
        check_canceled(cancel)?;
        let interfaces: Vec<InterfaceRow> = typed_rows(
            ctx.inventory
                .query(&queries::interface_addresses().to_sql(), None)
                .await?,
        )?;

        check_canceled(cancel)?;
        let mut result = AreaResult::new(NETWORK);
        let listening: Vec<ListeningRow> = match ctx
            .inventory
            .query(&queries::listening_ports().to_sql(), None)
            .await
        {
            Ok(rows) => typed_rows(rows)?,
            Err(e) => {
                warn!(error = %e, "listening ports unavailable");
                result = result.with_warning(format!("listening ports unavailable: {e}"));
                Vec::new()
            }
        };

        let mut ports: Vec<u16> = listening
            .iter()
            .filter_map(|row| row.port.parse().ok())
            .filter(|port| *port != 0)
            .collect();
        ports.sort_unstable();
        ports.dedup();

        ctx.logger.info(
            NETWORK,
            "Collect",
            format!(
                "{} interface addresses, {} listening ports",
                interfaces.len(),
                ports.len()
            ),
        );

        let details = Details::new()
            .with("interfaces", json!(interfaces))
            .with("listening", json!(listening))
            .with("listening_port_count", ports.len())
            .with("listening_ports", json!(ports));

        Ok(result
            .with_summary(json!({
                "interfaces": interfaces.len(),
                "listening_ports": ports.len(),
            }))
            .with_details(details))
    }
}

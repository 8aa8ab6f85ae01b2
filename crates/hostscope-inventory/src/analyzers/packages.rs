//! Packages area: installed packages from dpkg or rpm

use async_trait::async_trait;
use hostscope_api::{AreaResult, Details};
use hostscope_core::{
    AnalyzerContext, AnalyzerModule, CancellationToken, ModuleError, ReaderError, check_canceled,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::areas::PACKAGES;
use super::typed_rows;
use crate::query::queries;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PackageRow {
    name: String,
    version: String,
    #[serde(default)]
    arch: String,
}

/// Installed packages, Debian first with an RPM fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct PackagesAnalyzer;

#[async_trait]
impl AnalyzerModule for PackagesAnalyzer {
    fn name(&self) -> &str {
        "Installed packages"
    }

    fn area(&self) -> &str {
        PACKAGES
    }

    #[instrument(skip_all, fields(area = PACKAGES))]
    async fn analyze(
        &self,
        ctx: &AnalyzerContext,
        cancel: &CancellationToken,
    ) -> Result<AreaResult, ModuleError> {
        check_canceled(cancel)?;

        let (manager, rows) = match ctx
            .inventory
            .query(&queries::deb_packages().to_sql(), None)
            .await
        {
            Ok(rows) if !rows.is_empty() => ("deb", rows),
            Ok(_) | Err(ReaderError::Unavailable(_)) => {
                debug!("no deb packages, trying rpm");
                check_canceled(cancel)?;
                let rows = ctx
                    .inventory
                    .query(&queries::rpm_packages().to_sql(), None)
                    .await?;
                ("rpm", rows)
            }
            Err(e) => return Err(e.into()),
        };

        let packages: Vec<PackageRow> = typed_rows(rows)?;
        ctx.logger.info(
            PACKAGES,
            "Collect",
            format!("{} {manager} packages installed", packages.len()),
        );

        let details = Details::new()
            .with("manager", manager)
            .with("count", packages.len())
            .with("packages", json!(packages));

        Ok(AreaResult::new(PACKAGES)
            .with_summary(json!({ "manager": manager, "count": packages.len() }))
            .with_details(details))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analyzers::testing::{self, TableInventory};

    #[tokio::test]
    async fn test_deb_packages() {
        let inventory = TableInventory::default().with(
            "deb_packages",
            json!([
                {"name": "curl", "version": "8.5.0", "arch": "amd64"},
                {"name": "vim", "version": "9.1", "arch": "amd64"}
            ]),
        );
        let ctx = testing::context().inventory(Arc::new(inventory)).build();

        let result = PackagesAnalyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.details.get_str("manager").unwrap(), "deb");
        assert_eq!(result.details.get_u64("count").unwrap(), 2);
        assert_eq!(result.details.get_array("packages").unwrap()[1]["name"], "vim");
    }

    #[tokio::test]
    async fn test_rpm_fallback() {
        let inventory = TableInventory::default().with(
            "rpm_packages",
            json!([{"name": "bash", "version": "5.2.26", "arch": "x86_64"}]),
        );
        let ctx = testing::context().inventory(Arc::new(inventory)).build();

        let result = PackagesAnalyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.details.get_str("manager").unwrap(), "rpm");
        assert_eq!(result.summary["count"], 1);
    }

    #[tokio::test]
    async fn test_no_package_source_fails() {
        let ctx = testing::context()
            .inventory(Arc::new(TableInventory::default()))
            .build();

        let err = PackagesAnalyzer
            .analyze(&ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::Reader(ReaderError::Unavailable(_))));
    }
}

//! Analyzer module contract

use async_trait::async_trait;
use hostscope_api::AreaResult;
use tokio_util::sync::CancellationToken;

use crate::context::AnalyzerContext;
use crate::error::ModuleError;

/// Collection logic for exactly one inventory area
///
/// The runner calls [`AnalyzerModule::analyze`] once per run on its own task.
/// Errors and panics are caught at the task boundary, so a module never has to
/// guard against taking its siblings down. Returning
/// [`ModuleError::Canceled`] marks the area as canceled rather than failed.
#[async_trait]
pub trait AnalyzerModule: Send + Sync {
    /// Human-readable module name
    fn name(&self) -> &str;

    /// Area key, unique among the registered modules
    fn area(&self) -> &str;

    /// Collect the area
    ///
    /// `cancel` is advisory: modules should check it between collaborator
    /// calls (see [`check_canceled`]).
    async fn analyze(
        &self,
        ctx: &AnalyzerContext,
        cancel: &CancellationToken,
    ) -> Result<AreaResult, ModuleError>;
}

/// Return [`ModuleError::Canceled`] once `cancel` has fired
///
/// # Errors
/// Returns [`ModuleError::Canceled`] if the token is cancelled.
pub fn check_canceled(cancel: &CancellationToken) -> Result<(), ModuleError> {
    if cancel.is_cancelled() {
        Err(ModuleError::Canceled)
    } else {
        Ok(())
    }
}

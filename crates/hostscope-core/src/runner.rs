//! Concurrent module runner
//!
//! Spawns one task per analyzer module, joins them in registration order and
//! turns every outcome (result, error, panic, cancellation) into exactly one
//! [`AreaResult`].

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use hostscope_api::{AnalyzerResult, AreaResult};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout_at;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::RunnerConfig;
use crate::context::AnalyzerContext;
use crate::error::{CoreError, ModuleError};
use crate::logger::ActionLogger;
use crate::module::AnalyzerModule;

/// How a module task ended from the runner's point of view
enum Joined {
    Finished(Result<Result<AreaResult, ModuleError>, JoinError>),
    /// Still running when the stop grace period ran out
    Abandoned,
}

/// Runs a fixed, ordered set of analyzer modules
pub struct Runner {
    modules: Vec<Arc<dyn AnalyzerModule>>,
    config: RunnerConfig,
}

impl Runner {
    /// Create a runner over `modules`, in registration order
    ///
    /// # Errors
    /// Returns [`CoreError::NoModules`] for an empty set and
    /// [`CoreError::DuplicateArea`] if two modules share an area key.
    pub fn new(modules: Vec<Arc<dyn AnalyzerModule>>) -> Result<Self, CoreError> {
        if modules.is_empty() {
            return Err(CoreError::NoModules);
        }

        let mut seen = HashSet::new();
        for module in &modules {
            if !seen.insert(module.area().to_lowercase()) {
                return Err(CoreError::DuplicateArea(module.area().to_string()));
            }
        }

        Ok(Self {
            modules,
            config: RunnerConfig::default(),
        })
    }

    /// Override runner settings
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run every module and assemble the aggregate
    ///
    /// Never fails: module errors, panics and cancellations end up in the
    /// corresponding [`AreaResult`]. When `stop` fires, modules get
    /// `cancel_grace` to wind down before they are aborted and recorded as
    /// canceled.
    #[instrument(
        skip_all,
        fields(session = %ctx.logger.session_id(), modules = self.modules.len())
    )]
    pub async fn run_all(
        &self,
        ctx: Arc<AnalyzerContext>,
        stop: CancellationToken,
    ) -> AnalyzerResult {
        let session_id = ctx.logger.session_id();
        let started = Instant::now();

        info!(
            target: "hostscope::session",
            session_id = %session_id,
            event = "start",
            areas = self.modules.len(),
            "analysis session started"
        );

        let handles: Vec<(Arc<dyn AnalyzerModule>, JoinHandle<_>)> = self
            .modules
            .iter()
            .map(|module| {
                ctx.logger
                    .info(module.area(), "Start", format!("starting {}", module.name()));

                let task_module = Arc::clone(module);
                let task_ctx = Arc::clone(&ctx);
                let token = stop.child_token();
                let handle =
                    tokio::spawn(async move { task_module.analyze(&task_ctx, &token).await });

                (Arc::clone(module), handle)
            })
            .collect();

        let mut deadline: Option<tokio::time::Instant> = None;
        let mut areas = Vec::with_capacity(handles.len());

        for (module, mut handle) in handles {
            let joined = match deadline {
                Some(at) => wait_until(&mut handle, at).await,
                None => {
                    tokio::select! {
                        biased;
                        res = &mut handle => Joined::Finished(res),
                        () = stop.cancelled() => {
                            let at = tokio::time::Instant::now() + self.config.cancel_grace;
                            debug!(
                                grace = ?self.config.cancel_grace,
                                "stop requested, waiting for modules"
                            );
                            deadline = Some(at);
                            wait_until(&mut handle, at).await
                        }
                    }
                }
            };

            areas.push(settle(&ctx.logger, module.as_ref(), joined));
        }

        let result = AnalyzerResult {
            computer_name: ctx.host.machine_name(),
            export_timestamp: Utc::now(),
            session_id,
            areas,
            global_findings: Vec::new(),
            action_log: ctx.logger.snapshot(),
        };

        info!(
            target: "hostscope::session",
            session_id = %session_id,
            event = "stop",
            areas = result.areas.len(),
            warnings = result.total_warnings(),
            errors = result.total_errors(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "analysis session finished"
        );

        result
    }
}

/// Wait for `handle` until `at`; abort it if it is still running then
async fn wait_until(
    handle: &mut JoinHandle<Result<AreaResult, ModuleError>>,
    at: tokio::time::Instant,
) -> Joined {
    match timeout_at(at, &mut *handle).await {
        Ok(res) => Joined::Finished(res),
        Err(_) => {
            handle.abort();
            Joined::Abandoned
        }
    }
}

/// Convert a task outcome into the area's result, logging what happened
fn settle(logger: &ActionLogger, module: &dyn AnalyzerModule, joined: Joined) -> AreaResult {
    let area = module.area();

    match joined {
        Joined::Finished(Ok(Ok(mut result))) => {
            if result.area != area {
                warn!(expected = area, got = %result.area, "module reported a different area key");
                result.area = area.to_string();
            }
            logger.info(
                area,
                "Complete",
                format!(
                    "{} completed with {} warning(s), {} error(s)",
                    module.name(),
                    result.warnings.len(),
                    result.errors.len()
                ),
            );
            result
        }
        Joined::Finished(Ok(Err(ModuleError::Canceled))) => {
            logger.warn(area, "Canceled", format!("{} observed cancellation", module.name()));
            AreaResult::canceled(area, "analysis canceled")
        }
        Joined::Finished(Ok(Err(e))) => {
            warn!(area, error = %e, "module failed");
            logger.warn(area, "Failed", format!("{} failed: {e}", module.name()));
            AreaResult::failed(area, e.to_string())
        }
        Joined::Finished(Err(e)) if e.is_panic() => {
            let message = panic_message(e.into_panic());
            warn!(area, panic = %message, "module panicked");
            logger.warn(area, "Failed", format!("{} panicked: {message}", module.name()));
            AreaResult::failed(area, format!("module panicked: {message}"))
        }
        Joined::Finished(Err(_)) => {
            logger.warn(area, "Canceled", format!("{} task was cancelled", module.name()));
            AreaResult::canceled(area, "analysis task cancelled")
        }
        Joined::Abandoned => {
            logger.warn(
                area,
                "Canceled",
                format!("{} did not stop within the grace period", module.name()),
            );
            AreaResult::canceled(area, "analysis aborted after stop request")
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

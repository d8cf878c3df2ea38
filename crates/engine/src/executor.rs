//! Workflow execution lifecycle.
//!
//! `WorkflowExecutor` creates execution records and drives each one from
//! `Running` to a terminal status. Nothing is actually executed: a record
//! resolves after a delay, through one of two independent paths.
//!
//! 1. **Run** ([`WorkflowExecutor::start`]) — validates the workflow, records
//!    one pending result per task, and after `run_delay` flips the execution
//!    and every task result to completed at the same instant.
//! 2. **Deployment** ([`WorkflowExecutor::deploy`]) — ignores workflow
//!    content, waits a random delay, then completes or fails with the
//!    configured probability. Task results are never touched.
//!
//! Each execution gets its own spawned task and [`ExecutionHandle`];
//! executions of the same workflow never block or cancel one another.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::ExecutorConfig;
use crate::models::{ExecutionStatus, Workflow, WorkflowExecution};
use crate::store::ExecutionStore;
use crate::validation::validate;
use crate::EngineError;

// ---------------------------------------------------------------------------
// ExecutionHandle
// ---------------------------------------------------------------------------

/// Handle to one in-flight execution.
///
/// Dropping the handle does not stop the execution.
#[derive(Debug)]
pub struct ExecutionHandle {
    execution_id: String,
    cancel: CancellationToken,
    join: JoinHandle<Result<WorkflowExecution, EngineError>>,
}

impl ExecutionHandle {
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Resolve the execution to `Failed` now instead of waiting for its
    /// delay. No effect once it has already resolved.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the execution to resolve and return the final record.
    pub async fn wait(self) -> Result<WorkflowExecution, EngineError> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => {
                error!("execution {} task did not finish: {e}", self.execution_id);
                Err(EngineError::Interrupted(self.execution_id))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowExecutor
// ---------------------------------------------------------------------------

/// Creates executions and schedules their resolution.
pub struct WorkflowExecutor {
    store: Arc<dyn ExecutionStore>,
    config: ExecutorConfig,
}

impl WorkflowExecutor {
    pub fn new(store: Arc<dyn ExecutionStore>, config: ExecutorConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Start a task-graph run of `workflow`.
    ///
    /// # Errors
    /// Returns [`EngineError::Invalid`] (and records nothing) if the workflow
    /// has validation issues, or a database error if the record cannot be
    /// appended.
    #[instrument(skip(self, workflow), fields(workflow_id = %workflow.id))]
    pub async fn start(&self, workflow: &Workflow) -> Result<ExecutionHandle, EngineError> {
        let issues = validate(workflow);
        if !issues.is_empty() {
            warn!("refusing to run workflow with {} validation issues", issues.len());
            return Err(EngineError::Invalid(issues));
        }

        let execution = WorkflowExecution::start_run(workflow);
        info!(
            execution_id = %execution.id,
            "starting run with {} pending task results",
            execution.task_results.len()
        );
        let delay = self.config.run_delay();
        self.spawn(execution, delay, ExecutionStatus::Completed).await
    }

    /// Start a simulated deployment of the workflow with `workflow_id`.
    ///
    /// The outcome is drawn up front: `Completed` with probability
    /// `deploy_success_rate`, otherwise `Failed`, after a delay drawn
    /// uniformly from the configured bounds.
    #[instrument(skip(self))]
    pub async fn deploy(&self, workflow_id: &str) -> Result<ExecutionHandle, EngineError> {
        let (lo, hi) = self.config.deploy_delay_bounds();
        let (delay, outcome) = {
            let mut rng = rand::thread_rng();
            let delay = Duration::from_millis(rng.gen_range(lo.as_millis() as u64..=hi.as_millis() as u64));
            let outcome = if rng.gen_bool(self.config.success_rate()) {
                ExecutionStatus::Completed
            } else {
                ExecutionStatus::Failed
            };
            (delay, outcome)
        };

        let execution = WorkflowExecution::start_deployment(workflow_id);
        info!(execution_id = %execution.id, "starting deployment, resolves in {delay:?}");
        self.spawn(execution, delay, outcome).await
    }

    /// Persist `execution` and schedule it to resolve to `outcome` after
    /// `delay`, or to `Failed` if cancelled first.
    async fn spawn(
        &self,
        execution: WorkflowExecution,
        delay: Duration,
        outcome: ExecutionStatus,
    ) -> Result<ExecutionHandle, EngineError> {
        let execution_id = execution.id.clone();
        self.store.append_execution(execution).await?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let store = Arc::clone(&self.store);
        let id = execution_id.clone();

        let join = tokio::spawn(async move {
            let status = tokio::select! {
                _ = token.cancelled() => {
                    warn!("execution {id} cancelled before resolving");
                    ExecutionStatus::Failed
                }
                _ = tokio::time::sleep(delay) => outcome,
            };
            resolve(store.as_ref(), &id, status).await
        });

        Ok(ExecutionHandle { execution_id, cancel, join })
    }
}

/// Move the stored execution to `status` unless it is already terminal.
async fn resolve(
    store: &dyn ExecutionStore,
    id: &str,
    status: ExecutionStatus,
) -> Result<WorkflowExecution, EngineError> {
    let at = Utc::now();
    let record = store
        .patch_execution(
            id,
            Box::new(move |execution: &mut WorkflowExecution| {
                execution.resolve(status, at);
            }),
        )
        .await
        .map_err(|e| {
            error!("failed to resolve execution {id}: {e}");
            e
        })?;

    match record.status {
        ExecutionStatus::Failed => warn!("execution {id} failed"),
        other => info!("execution {id} {other}"),
    }
    Ok(record)
}

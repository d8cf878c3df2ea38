//! Lifecycle tests for `WorkflowExecutor`.
//!
//! These run on tokio's paused clock, so every delay resolves instantly and
//! deterministically once the runtime has nothing else to do. Storage is the
//! in-memory pool; no files are touched.

use std::sync::Arc;
use std::time::Duration;

use db::DbPool;
use nodes::{ActionType, TriggerType};
use tokio::time::Instant;

use crate::models::{ExecutionMode, ExecutionStatus, Task, TaskResultStatus, Transition, Workflow};
use crate::store::ExecutionStore;
use crate::templates::TemplateCatalog;
use crate::{EngineError, ExecutorConfig, WorkflowEditor, WorkflowExecutor};

fn config() -> ExecutorConfig {
    ExecutorConfig {
        run_delay_ms: 2000,
        deploy_min_delay_ms: 1000,
        deploy_max_delay_ms: 3000,
        deploy_success_rate: 1.0,
    }
}

fn executor(pool: &DbPool, config: ExecutorConfig) -> WorkflowExecutor {
    WorkflowExecutor::new(Arc::new(pool.clone()), config)
}

/// Trigger → a → b, valid and runnable.
fn runnable_workflow() -> Workflow {
    let trigger = Task::trigger("Start", TriggerType::UserAction);
    let a = Task::action("Notify", ActionType::Notification);
    let b = Task::action("Mail", ActionType::Email);
    let edges = vec![Transition::new(&trigger.id, &a.id), Transition::new(&a.id, &b.id)];
    Workflow::new("Runnable").with_graph(vec![trigger, a, b], edges)
}

// ============================================================
// Run path
// ============================================================

#[tokio::test(start_paused = true)]
async fn run_creates_one_running_execution_with_pending_results() {
    let pool = DbPool::in_memory();
    let wf = runnable_workflow();

    let handle = executor(&pool, config()).start(&wf).await.unwrap();

    let all = pool.list_executions().await.unwrap();
    assert_eq!(all.len(), 1);
    let record = &all[0];
    assert_eq!(record.id, handle.execution_id());
    assert_eq!(record.workflow_id, wf.id);
    assert_eq!(record.status, ExecutionStatus::Running);
    assert_eq!(record.mode, ExecutionMode::Run);
    assert!(record.end_time.is_none());
    assert_eq!(record.task_results.len(), wf.tasks.len());
    assert!(record.task_results.iter().all(|r| r.status == TaskResultStatus::Pending));
}

#[tokio::test(start_paused = true)]
async fn run_completes_every_task_result_after_the_delay() {
    let pool = DbPool::in_memory();
    let wf = runnable_workflow();
    let started = Instant::now();

    let handle = executor(&pool, config()).start(&wf).await.unwrap();
    let done = handle.wait().await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(2000));
    assert_eq!(done.status, ExecutionStatus::Completed);
    let end = done.end_time.expect("terminal record has an end time");
    assert!(done
        .task_results
        .iter()
        .all(|r| r.status == TaskResultStatus::Completed && r.end_time == Some(end)));

    let stored = pool.get_execution(&done.id).await.unwrap();
    assert_eq!(stored, done);
}

#[tokio::test(start_paused = true)]
async fn run_is_still_running_just_before_the_delay() {
    let pool = DbPool::in_memory();
    let handle = executor(&pool, config()).start(&runnable_workflow()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1999)).await;
    let record = pool.get_execution(handle.execution_id()).await.unwrap();
    assert_eq!(record.status, ExecutionStatus::Running);

    tokio::time::sleep(Duration::from_millis(2)).await;
    tokio::task::yield_now().await;
    let done = handle.wait().await.unwrap();
    assert_eq!(done.status, ExecutionStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn invalid_workflow_is_refused_and_nothing_is_recorded() {
    let pool = DbPool::in_memory();
    let wf = Workflow::new("Empty");

    let result = executor(&pool, config()).start(&wf).await;

    assert!(matches!(result, Err(EngineError::Invalid(issues)) if issues.len() == 1));
    assert!(pool.list_executions().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_runs_of_one_workflow_are_independent() {
    let pool = DbPool::in_memory();
    let wf = runnable_workflow();
    let executor = executor(&pool, config());

    let first = executor.start(&wf).await.unwrap();
    let second = executor.start(&wf).await.unwrap();
    assert_ne!(first.execution_id(), second.execution_id());

    second.cancel();
    let second = second.wait().await.unwrap();
    let first = first.wait().await.unwrap();

    assert_eq!(second.status, ExecutionStatus::Failed);
    assert_eq!(first.status, ExecutionStatus::Completed);
    assert_eq!(pool.executions_for(&wf.id).await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancelling_resolves_to_failed_without_waiting() {
    let pool = DbPool::in_memory();
    let started = Instant::now();
    let handle = executor(&pool, config()).start(&runnable_workflow()).await.unwrap();

    handle.cancel();
    let done = handle.wait().await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(2000));
    assert_eq!(done.status, ExecutionStatus::Failed);
    assert!(done.end_time.is_some());
    assert!(done.task_results.iter().all(|r| r.status == TaskResultStatus::Pending));
}

#[tokio::test(start_paused = true)]
async fn terminal_records_are_never_rewritten() {
    let pool = DbPool::in_memory();
    let handle = executor(&pool, config()).start(&runnable_workflow()).await.unwrap();
    let done = handle.wait().await.unwrap();

    let at = chrono::Utc::now();
    let patched = pool
        .patch_execution(
            &done.id,
            Box::new(move |e: &mut crate::WorkflowExecution| {
                e.resolve(ExecutionStatus::Failed, at);
            }),
        )
        .await
        .unwrap();
    assert_eq!(patched, done);
}

// ============================================================
// Deployment path
// ============================================================

#[tokio::test(start_paused = true)]
async fn deployment_succeeds_within_the_delay_bounds() {
    let pool = DbPool::in_memory();
    let started = Instant::now();

    let handle = executor(&pool, config()).deploy("wf-1").await.unwrap();
    let done = handle.wait().await.unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
    assert!(elapsed <= Duration::from_millis(3000), "{elapsed:?}");
    assert_eq!(done.status, ExecutionStatus::Completed);
    assert_eq!(done.mode, ExecutionMode::Deployment);
    assert!(done.task_results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn deployment_failure_is_a_terminal_status_not_an_error() {
    let pool = DbPool::in_memory();
    let config = ExecutorConfig { deploy_success_rate: 0.0, ..config() };

    let handle = executor(&pool, config).deploy("wf-1").await.unwrap();
    let done = handle.wait().await.unwrap();

    assert_eq!(done.status, ExecutionStatus::Failed);
    assert!(done.end_time.is_some());
}

#[tokio::test(start_paused = true)]
async fn deployment_ignores_workflow_content() {
    let pool = DbPool::in_memory();
    // No such workflow exists; deployment does not care.
    let handle = executor(&pool, config()).deploy("missing").await.unwrap();
    assert_eq!(handle.wait().await.unwrap().status, ExecutionStatus::Completed);
}

// ============================================================
// Editor → store → executor
// ============================================================

#[tokio::test(start_paused = true)]
async fn editor_run_saves_then_executes() {
    let pool = DbPool::in_memory();
    let catalog = TemplateCatalog::builtin();
    let mut editor = WorkflowEditor::from_template(catalog.get("conditional-workflow").unwrap());

    let handle = editor.run(&pool, &executor(&pool, config())).await.unwrap();
    assert!(!editor.is_dirty());

    let saved = crate::WorkflowStore::get_workflow(&pool, &editor.workflow().id).await.unwrap();
    assert_eq!(saved.tasks.len(), 4);

    let done = handle.wait().await.unwrap();
    assert_eq!(done.workflow_id, saved.id);
    assert_eq!(done.task_results.len(), 4);
    assert_eq!(done.status, ExecutionStatus::Completed);
}

//! Store boundaries the engine talks to.
//!
//! [`db::DbPool`] implements both traits by delegating to the `db`
//! repository functions, so any backend the pool accepts is a valid store.

use async_trait::async_trait;
use db::repository::{executions as exec_repo, workflows as wf_repo};
use db::{DbError, DbPool};

use crate::models::{Workflow, WorkflowExecution};
use crate::EngineError;

/// Persistence of workflow definitions.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, EngineError>;

    /// Fails with [`EngineError::WorkflowNotFound`] for an unknown id.
    async fn get_workflow(&self, id: &str) -> Result<Workflow, EngineError>;

    /// Upsert by id, refreshing `updated_at`. Returns the full collection.
    async fn save_workflow(&self, workflow: Workflow) -> Result<Vec<Workflow>, EngineError>;

    /// Remove a workflow. Its executions are left in place.
    async fn delete_workflow(&self, id: &str) -> Result<(), EngineError>;
}

/// Persistence of execution records.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn list_executions(&self) -> Result<Vec<WorkflowExecution>, EngineError>;

    /// Fails with [`EngineError::ExecutionNotFound`] for an unknown id.
    async fn get_execution(&self, id: &str) -> Result<WorkflowExecution, EngineError>;

    async fn append_execution(&self, execution: WorkflowExecution) -> Result<(), EngineError>;

    /// Apply `patch` to one record atomically and return the result.
    async fn patch_execution(
        &self,
        id: &str,
        patch: Box<dyn for<'a> FnOnce(&'a mut WorkflowExecution) + Send>,
    ) -> Result<WorkflowExecution, EngineError>;

    /// Executions referencing `workflow_id`, oldest first.
    async fn executions_for(&self, workflow_id: &str) -> Result<Vec<WorkflowExecution>, EngineError> {
        let all = self.list_executions().await?;
        Ok(all.into_iter().filter(|e| e.workflow_id == workflow_id).collect())
    }
}

fn not_found_as(err: DbError, mapped: impl FnOnce() -> EngineError) -> EngineError {
    match err {
        DbError::NotFound => mapped(),
        other => EngineError::Database(other),
    }
}

#[async_trait]
impl WorkflowStore for DbPool {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, EngineError> {
        Ok(wf_repo::list_workflows(self).await?)
    }

    async fn get_workflow(&self, id: &str) -> Result<Workflow, EngineError> {
        wf_repo::get_workflow(self, id)
            .await
            .map_err(|e| not_found_as(e, || EngineError::WorkflowNotFound(id.to_string())))
    }

    async fn save_workflow(&self, workflow: Workflow) -> Result<Vec<Workflow>, EngineError> {
        Ok(wf_repo::save_workflow(self, workflow).await?)
    }

    async fn delete_workflow(&self, id: &str) -> Result<(), EngineError> {
        wf_repo::delete_workflow::<Workflow>(self, id)
            .await
            .map_err(|e| not_found_as(e, || EngineError::WorkflowNotFound(id.to_string())))
    }
}

#[async_trait]
impl ExecutionStore for DbPool {
    async fn list_executions(&self) -> Result<Vec<WorkflowExecution>, EngineError> {
        Ok(exec_repo::list_executions(self).await?)
    }

    async fn get_execution(&self, id: &str) -> Result<WorkflowExecution, EngineError> {
        exec_repo::get_execution(self, id)
            .await
            .map_err(|e| not_found_as(e, || EngineError::ExecutionNotFound(id.to_string())))
    }

    async fn append_execution(&self, execution: WorkflowExecution) -> Result<(), EngineError> {
        Ok(exec_repo::append_execution(self, execution).await?)
    }

    async fn patch_execution(
        &self,
        id: &str,
        patch: Box<dyn for<'a> FnOnce(&'a mut WorkflowExecution) + Send>,
    ) -> Result<WorkflowExecution, EngineError> {
        exec_repo::patch_execution(self, id, patch)
            .await
            .map_err(|e| not_found_as(e, || EngineError::ExecutionNotFound(id.to_string())))
    }
}

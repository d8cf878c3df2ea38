//! `engine` crate — workflow graph model, validation, templates, the editor
//! state machine, and the execution lifecycle.

pub mod config;
pub mod editor;
pub mod error;
pub mod executor;
pub mod models;
pub mod store;
pub mod templates;
pub mod transfer;
pub mod validation;

pub use config::ExecutorConfig;
pub use editor::{Selection, WorkflowEditor};
pub use error::{EditorError, EngineError, ImportError};
pub use executor::{ExecutionHandle, WorkflowExecutor};
pub use models::{
    ExecutionMode, ExecutionStatus, Position, Task, TaskKind, TaskResult, TaskResultStatus,
    TaskUpdate, Transition, Workflow, WorkflowExecution,
};
pub use store::{ExecutionStore, WorkflowStore};
pub use templates::{TemplateCatalog, WorkflowTemplate};
pub use transfer::{export_workflow, import_workflow, ImportMode};
pub use validation::{validate, Issue, IssueCode};

#[cfg(test)]
mod executor_tests;

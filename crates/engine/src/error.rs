//! Engine-level error types.
//!
//! Validation findings are not errors: they are returned as
//! [`Issue`](crate::validation::Issue) lists. The types here cover the
//! failures a caller has to branch on.

use thiserror::Error;

use crate::validation::Issue;

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors produced by the store layer and the execution lifecycle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The workflow has validation issues and cannot be run or saved.
    #[error("workflow is not valid: {}", join_issues(.0))]
    Invalid(Vec<Issue>),

    /// No workflow with this id exists in the store.
    #[error("workflow '{0}' not found")]
    WorkflowNotFound(String),

    /// No execution with this id exists in the store.
    #[error("execution '{0}' not found")]
    ExecutionNotFound(String),

    /// The lifecycle task driving an execution panicked or was aborted.
    #[error("execution '{0}' was interrupted")]
    Interrupted(String),

    /// Persistence error from the db crate.
    #[error("database error: {0}")]
    Database(#[from] db::DbError),
}

/// User-facing rejections from the editor. None of them change editor state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("a task cannot be connected to itself")]
    SelfConnection,

    #[error("these tasks are already connected")]
    DuplicateTransition,

    #[error("task '{0}' does not exist")]
    UnknownTask(String),

    #[error("transition '{0}' does not exist")]
    UnknownTransition(String),

    #[error("no connection is in progress")]
    NotConnecting,

    #[error("template '{0}' does not exist")]
    UnknownTemplate(String),
}

/// Reasons an imported document was rejected.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("document is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("document must be a JSON object")]
    NotAnObject,

    #[error("document is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("document does not describe a workflow: {0}")]
    Shape(#[source] serde_json::Error),
}

//! Workflow import and export as JSON documents.
//!
//! Export is lossless. Import is all-or-nothing: a rejected document never
//! touches the caller's in-memory workflow.

use serde_json::Value;
use tracing::warn;

use crate::models::{new_id, Workflow};
use crate::ImportError;

/// Where an imported document is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Becomes a new workflow: the document's id is replaced with a fresh one.
    New,
    /// Replaces a draft: the document's id is kept.
    Replace,
}

/// Fields every importable document must carry at the top level.
const REQUIRED_FIELDS: [&str; 3] = ["id", "tasks", "transitions"];

/// Serialise a workflow to a pretty-printed JSON document.
pub fn export_workflow(workflow: &Workflow) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(workflow)
}

/// Parse a workflow document.
///
/// # Errors
/// - [`ImportError::Malformed`] if the text is not JSON.
/// - [`ImportError::NotAnObject`] if the top level is not an object.
/// - [`ImportError::MissingField`] if `id`, `tasks` or `transitions` is absent.
/// - [`ImportError::Shape`] if the fields do not form a workflow.
pub fn import_workflow(json: &str, mode: ImportMode) -> Result<Workflow, ImportError> {
    let document: Value = serde_json::from_str(json).map_err(|e| {
        warn!("rejected workflow import: {e}");
        ImportError::Malformed(e)
    })?;

    let Some(object) = document.as_object() else {
        return Err(ImportError::NotAnObject);
    };
    if let Some(field) = REQUIRED_FIELDS.into_iter().find(|f| !object.contains_key(*f)) {
        warn!("rejected workflow import: missing '{field}'");
        return Err(ImportError::MissingField(field));
    }

    let mut workflow: Workflow = serde_json::from_value(document).map_err(ImportError::Shape)?;
    if mode == ImportMode::New {
        workflow.id = new_id();
    }
    Ok(workflow)
}

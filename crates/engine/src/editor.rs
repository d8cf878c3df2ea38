//! Interactive editing session over one workflow.
//!
//! The editor is a single-writer state machine driven by UI events. It owns
//! the draft workflow, tracks what is selected (or which task a new
//! connection starts from), and remembers whether anything changed since
//! the last successful save.
//!
//! ```text
//!   Idle ──click_task──▶ Task ──start_connecting──▶ Connecting
//!    ▲  ◀─click_canvas─┘   ▲                          │   │
//!    │                      └──────click_transition───┼─▶ Transition
//!    └────────────────click_canvas────────────────────┘   ▲
//!                         click_task(valid target) ────────┘
//! ```
//!
//! Rejected actions return an [`EditorError`] and leave state untouched.

use serde_json::Value;
use tracing::{debug, info};

use crate::executor::{ExecutionHandle, WorkflowExecutor};
use crate::models::{Position, Task, TaskKind, TaskUpdate, Transition, Workflow};
use crate::store::WorkflowStore;
use crate::templates::WorkflowTemplate;
use crate::transfer::{export_workflow, import_workflow, ImportMode};
use crate::validation::{validate, Issue};
use crate::{EditorError, EngineError, ImportError};

/// What the editor is focused on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Idle,
    Task(String),
    Transition(String),
    /// A source task has been picked; the next task click completes the edge.
    Connecting { source: String },
}

#[derive(Debug, Clone)]
pub struct WorkflowEditor {
    workflow: Workflow,
    selection: Selection,
    dirty: bool,
}

impl WorkflowEditor {
    /// Open an existing workflow. The session starts clean.
    pub fn open(workflow: Workflow) -> Self {
        Self { workflow, selection: Selection::Idle, dirty: false }
    }

    /// Start a new, empty draft. It is dirty until first saved.
    pub fn new_draft(name: impl Into<String>) -> Self {
        Self { workflow: Workflow::new(name), selection: Selection::Idle, dirty: true }
    }

    /// Start a new draft from a template.
    pub fn from_template(template: &WorkflowTemplate) -> Self {
        Self { workflow: template.instantiate(None), selection: Selection::Idle, dirty: true }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.selection, Selection::Connecting { .. })
    }

    pub fn selected_task(&self) -> Option<&Task> {
        match &self.selection {
            Selection::Task(id) => self.workflow.task(id),
            _ => None,
        }
    }

    pub fn selected_transition(&self) -> Option<&Transition> {
        match &self.selection {
            Selection::Transition(id) => self.workflow.transition(id),
            _ => None,
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.workflow.touch();
    }

    fn require_task(&self, id: &str) -> Result<(), EditorError> {
        match self.workflow.task(id) {
            Some(_) => Ok(()),
            None => Err(EditorError::UnknownTask(id.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Selection and connecting
    // -----------------------------------------------------------------------

    /// A task was clicked.
    ///
    /// While connecting, this completes the connection from the source task
    /// to `task_id` and selects the new transition. Otherwise it selects the
    /// task, dropping any transition selection.
    pub fn click_task(&mut self, task_id: &str) -> Result<(), EditorError> {
        self.require_task(task_id)?;

        let source = match &self.selection {
            Selection::Connecting { source } => source.clone(),
            _ => {
                self.selection = Selection::Task(task_id.to_string());
                return Ok(());
            }
        };

        if source == task_id {
            return Err(EditorError::SelfConnection);
        }
        if self.workflow.has_transition(&source, task_id) {
            return Err(EditorError::DuplicateTransition);
        }

        let transition = Transition::new(source, task_id);
        debug!("connected {} -> {}", transition.source_task_id, transition.target_task_id);
        self.selection = Selection::Transition(transition.id.clone());
        self.workflow.transitions.push(transition);
        self.mark_dirty();
        Ok(())
    }

    /// A transition was clicked.
    pub fn click_transition(&mut self, transition_id: &str) -> Result<(), EditorError> {
        if self.workflow.transition(transition_id).is_none() {
            return Err(EditorError::UnknownTransition(transition_id.to_string()));
        }
        self.selection = Selection::Transition(transition_id.to_string());
        Ok(())
    }

    /// Empty canvas was clicked: cancels a pending connection and clears
    /// any selection.
    pub fn click_canvas(&mut self) {
        self.selection = Selection::Idle;
    }

    /// Designate `source_id` as the start of a new transition.
    pub fn start_connecting(&mut self, source_id: &str) -> Result<(), EditorError> {
        self.require_task(source_id)?;
        self.selection = Selection::Connecting { source: source_id.to_string() };
        Ok(())
    }

    /// Abandon a pending connection.
    pub fn cancel_connecting(&mut self) -> Result<(), EditorError> {
        if !self.is_connecting() {
            return Err(EditorError::NotConnecting);
        }
        self.selection = Selection::Idle;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Graph mutations
    // -----------------------------------------------------------------------

    /// Add a task of `kind` at `position`, seeded with the kind's defaults,
    /// and select it. Returns the new task's id.
    pub fn add_task(&mut self, kind: TaskKind, position: Position) -> String {
        let task = Task::new(kind, position);
        let id = task.id.clone();
        self.workflow.tasks.push(task);
        self.selection = Selection::Task(id.clone());
        self.mark_dirty();
        id
    }

    /// Apply a partial update to a task.
    pub fn update_task(&mut self, task_id: &str, update: TaskUpdate) -> Result<(), EditorError> {
        let task = self
            .workflow
            .task_mut(task_id)
            .ok_or_else(|| EditorError::UnknownTask(task_id.to_string()))?;
        task.apply(update);
        self.mark_dirty();
        Ok(())
    }

    /// Write one parameter by dotted path.
    pub fn set_task_parameter(&mut self, task_id: &str, path: &str, value: Value) -> Result<(), EditorError> {
        self.update_task(task_id, TaskUpdate::default().parameter(path, value))
    }

    /// Drag a task to a new position.
    pub fn move_task(&mut self, task_id: &str, position: Position) -> Result<(), EditorError> {
        self.update_task(task_id, TaskUpdate::default().position(position))
    }

    /// Delete a task and every transition into or out of it.
    pub fn delete_task(&mut self, task_id: &str) -> Result<(), EditorError> {
        self.require_task(task_id)?;

        self.workflow.tasks.retain(|t| t.id != task_id);
        self.workflow.transitions.retain(|t| !t.touches(task_id));

        let stale = match &self.selection {
            Selection::Task(id) => id == task_id,
            Selection::Connecting { source } => source == task_id,
            Selection::Transition(id) => self.workflow.transition(id).is_none(),
            Selection::Idle => false,
        };
        if stale {
            self.selection = Selection::Idle;
        }
        self.mark_dirty();
        Ok(())
    }

    pub fn delete_transition(&mut self, transition_id: &str) -> Result<(), EditorError> {
        if self.workflow.transition(transition_id).is_none() {
            return Err(EditorError::UnknownTransition(transition_id.to_string()));
        }
        self.workflow.transitions.retain(|t| t.id != transition_id);
        if self.selection == Selection::Transition(transition_id.to_string()) {
            self.selection = Selection::Idle;
        }
        self.mark_dirty();
        Ok(())
    }

    /// Set or clear a transition's guard. Blank conditions are stored as none.
    pub fn set_transition_condition(
        &mut self,
        transition_id: &str,
        condition: Option<String>,
    ) -> Result<(), EditorError> {
        let transition = self
            .workflow
            .transition_mut(transition_id)
            .ok_or_else(|| EditorError::UnknownTransition(transition_id.to_string()))?;
        transition.condition = condition.filter(|c| !c.trim().is_empty());
        self.mark_dirty();
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.workflow.name = name.into();
        self.mark_dirty();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.workflow.description = description.into();
        self.mark_dirty();
    }

    // -----------------------------------------------------------------------
    // Whole-document operations
    // -----------------------------------------------------------------------

    /// Replace the draft with a fresh instance of `template`, keeping the
    /// draft's id.
    pub fn load_template(&mut self, template: &WorkflowTemplate) {
        self.workflow = template.instantiate(Some(&self.workflow.id));
        self.selection = Selection::Idle;
        self.dirty = true;
    }

    /// Replace the draft with an imported document. On error the draft is
    /// left exactly as it was.
    pub fn import_json(&mut self, json: &str, mode: ImportMode) -> Result<(), ImportError> {
        let imported = import_workflow(json, mode)?;
        info!("imported workflow {} into editor", imported.id);
        self.workflow = imported;
        self.selection = Selection::Idle;
        self.dirty = true;
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        export_workflow(&self.workflow)
    }

    pub fn validate(&self) -> Vec<Issue> {
        validate(&self.workflow)
    }

    /// Validate and persist the draft.
    ///
    /// A dirty draft gets its `version` bumped first. On success the draft
    /// picks up the stored timestamps and `dirty` clears. Returns the full
    /// stored collection.
    ///
    /// # Errors
    /// [`EngineError::Invalid`] if validation finds anything; the store is
    /// not touched and `dirty` is unchanged.
    pub async fn save(&mut self, store: &dyn WorkflowStore) -> Result<Vec<Workflow>, EngineError> {
        let issues = self.validate();
        if !issues.is_empty() {
            return Err(EngineError::Invalid(issues));
        }

        let mut candidate = self.workflow.clone();
        if self.dirty {
            candidate.version = candidate.version.saturating_add(1);
        }
        let all = store.save_workflow(candidate.clone()).await?;
        self.workflow = all
            .iter()
            .find(|w| w.id == candidate.id)
            .cloned()
            .unwrap_or(candidate);
        self.dirty = false;
        info!(workflow_id = %self.workflow.id, version = self.workflow.version, "saved workflow");
        Ok(all)
    }

    /// Save the draft, then start a run of it.
    pub async fn run(
        &mut self,
        store: &dyn WorkflowStore,
        executor: &WorkflowExecutor,
    ) -> Result<ExecutionHandle, EngineError> {
        self.save(store).await?;
        executor.start(&self.workflow).await
    }
}

//! Core domain models for the workflow engine.
//!
//! These types are the source of truth for what a workflow looks like in
//! memory, and they serialise losslessly to the JSON document format used
//! by import/export and by the `db` collections.
//!
//! References between records (transition → task, execution → workflow,
//! sub-workflow task → workflow) are plain string ids. Nothing here owns
//! what it points at, and a dangling id is a value to report, not an error.

use chrono::{DateTime, Utc};
use nodes::{params, schemas, ActionType, Parameters, TriggerType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Label rendered in place of a workflow that no longer exists.
pub const UNKNOWN_WORKFLOW: &str = "Unknown workflow";
/// Label rendered in place of a task that no longer exists.
pub const MISSING_TASK: &str = "missing task";

/// Generate a fresh opaque identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Canvas coordinates. Layout only; carries no meaning for validation or runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// TaskKind
// ---------------------------------------------------------------------------

/// What a task is, with the kind-specific payload.
///
/// Flattened into [`Task`] and tagged by `type`, so a task serialises as
/// `{"id": .., "type": "Action", "actionType": "Email", ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskKind {
    /// How a run begins.
    Trigger {
        #[serde(rename = "triggerType")]
        trigger_type: TriggerType,
    },
    /// A unit of work from the closed action catalog.
    Action {
        #[serde(rename = "actionType")]
        action_type: ActionType,
    },
    /// A branch point. The expression is evaluated by whatever runs the
    /// workflow, never by this crate.
    Condition {
        #[serde(rename = "conditionLogic", default)]
        condition_logic: String,
    },
    /// Delegates to another workflow named by `parameters.workflowId`.
    SubWorkflow,
    /// A document named a kind outside the catalog. Reported by validation.
    #[serde(other)]
    Unknown,
}

impl TaskKind {
    /// The canonical parameter shape for this kind.
    pub fn default_parameters(&self) -> Parameters {
        match self {
            Self::Trigger { trigger_type } => schemas::trigger_defaults(*trigger_type),
            Self::Action { action_type } => schemas::action_defaults(*action_type),
            Self::Condition { .. } => schemas::condition_defaults(),
            Self::SubWorkflow => schemas::sub_workflow_defaults(),
            Self::Unknown => Parameters::new(),
        }
    }

    /// Name given to a task created without one.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Trigger { trigger_type } => trigger_type.label(),
            Self::Action { action_type } => action_type.label(),
            Self::Condition { .. } => "Condition",
            Self::SubWorkflow => "Sub-workflow",
            Self::Unknown => "Task",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trigger { .. } => "Trigger",
            Self::Action { .. } => "Action",
            Self::Condition { .. } => "Condition",
            Self::SubWorkflow => "SubWorkflow",
            Self::Unknown => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A node in the workflow graph.
///
/// `name` uniqueness and non-emptiness are checked by validation, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: TaskKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub parameters: Parameters,
}

/// A partial update to a task. `None` fields are left alone.
///
/// Re-typing (`action_type` / `trigger_type`) resets `parameters` to the new
/// kind's defaults before `parameters` paths are applied, so a caller can
/// re-type and fill in fields in one update.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub position: Option<Position>,
    pub condition_logic: Option<String>,
    pub action_type: Option<ActionType>,
    pub trigger_type: Option<TriggerType>,
    /// Dotted-path parameter writes, applied in order.
    pub parameters: Vec<(String, Value)>,
}

impl TaskUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn condition_logic(mut self, logic: impl Into<String>) -> Self {
        self.condition_logic = Some(logic.into());
        self
    }

    pub fn action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = Some(action_type);
        self
    }

    pub fn trigger_type(mut self, trigger_type: TriggerType) -> Self {
        self.trigger_type = Some(trigger_type);
        self
    }

    pub fn parameter(mut self, path: impl Into<String>, value: Value) -> Self {
        self.parameters.push((path.into(), value));
        self
    }
}

impl Task {
    /// Create a task of `kind` seeded with the kind's default name and parameters.
    pub fn new(kind: TaskKind, position: Position) -> Self {
        Self {
            id: new_id(),
            name: kind.default_name().to_string(),
            parameters: kind.default_parameters(),
            kind,
            position,
        }
    }

    pub fn trigger(name: impl Into<String>, trigger_type: TriggerType) -> Self {
        Self::new(TaskKind::Trigger { trigger_type }, Position::default()).named(name)
    }

    pub fn action(name: impl Into<String>, action_type: ActionType) -> Self {
        Self::new(TaskKind::Action { action_type }, Position::default()).named(name)
    }

    pub fn condition(name: impl Into<String>, logic: impl Into<String>) -> Self {
        let kind = TaskKind::Condition { condition_logic: logic.into() };
        Self::new(kind, Position::default()).named(name)
    }

    pub fn sub_workflow(name: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        let mut task = Self::new(TaskKind::SubWorkflow, Position::default()).named(name);
        task.set_parameter("workflowId", Value::String(workflow_id.into()));
        task
    }

    /// Builder: replace the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: replace the position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self.kind, TaskKind::Trigger { .. })
    }

    pub fn action_type(&self) -> Option<ActionType> {
        match self.kind {
            TaskKind::Action { action_type } => Some(action_type),
            _ => None,
        }
    }

    /// The referenced workflow of a sub-workflow task, if set.
    pub fn sub_workflow_id(&self) -> Option<&str> {
        match self.kind {
            TaskKind::SubWorkflow => self
                .parameters
                .get("workflowId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty()),
            _ => None,
        }
    }

    /// Re-type this task as an action. Parameters are reset to the new
    /// action's defaults; nothing carries over from the previous kind.
    pub fn set_action_type(&mut self, action_type: ActionType) {
        self.kind = TaskKind::Action { action_type };
        self.parameters = self.kind.default_parameters();
    }

    /// Re-type this task as a trigger, resetting parameters the same way.
    pub fn set_trigger_type(&mut self, trigger_type: TriggerType) {
        self.kind = TaskKind::Trigger { trigger_type };
        self.parameters = self.kind.default_parameters();
    }

    /// Write a single parameter by dotted path (`"headers.Accept"`).
    pub fn set_parameter(&mut self, path: &str, value: Value) {
        params::set_path(&mut self.parameters, path, value);
    }

    /// Apply a partial update. Never fails; a `condition_logic` update on a
    /// non-condition task is ignored.
    pub fn apply(&mut self, update: TaskUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(action_type) = update.action_type {
            self.set_action_type(action_type);
        }
        if let Some(trigger_type) = update.trigger_type {
            self.set_trigger_type(trigger_type);
        }
        if let Some(logic) = update.condition_logic {
            if let TaskKind::Condition { condition_logic } = &mut self.kind {
                *condition_logic = logic;
            }
        }
        for (path, value) in update.parameters {
            self.set_parameter(&path, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// Directed edge between two tasks of the same workflow, optionally guarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: String,
    pub source_task_id: String,
    pub target_task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Transition {
    pub fn new(source_task_id: impl Into<String>, target_task_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            source_task_id: source_task_id.into(),
            target_task_id: target_task_id.into(),
            condition: None,
        }
    }

    /// Builder: attach a guard expression.
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn touches(&self, task_id: &str) -> bool {
        self.source_task_id == task_id || self.target_task_id == task_id
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A complete workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tasks: Vec<Task>,
    pub transitions: Vec<Transition>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "first_version")]
    pub version: u32,
}

fn first_version() -> u32 {
    1
}

impl Workflow {
    /// An empty workflow with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            description: String::new(),
            tasks: Vec::new(),
            transitions: Vec::new(),
            created_at: now,
            updated_at: now,
            version: first_version(),
        }
    }

    /// Builder: replace the task and transition lists.
    pub fn with_graph(mut self, tasks: Vec<Task>, transitions: Vec<Transition>) -> Self {
        self.tasks = tasks;
        self.transitions = transitions;
        self
    }

    /// Refresh `updated_at`. Called on every structural mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    pub fn transition_mut(&mut self, id: &str) -> Option<&mut Transition> {
        self.transitions.iter_mut().find(|t| t.id == id)
    }

    /// Whether an edge `source → target` already exists.
    pub fn has_transition(&self, source: &str, target: &str) -> bool {
        self.transitions
            .iter()
            .any(|t| t.source_task_id == source && t.target_task_id == target)
    }

    pub fn transitions_from<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions.iter().filter(move |t| t.source_task_id == task_id)
    }

    /// Display name for a task reference, or [`MISSING_TASK`] if it dangles.
    pub fn task_label(&self, task_id: &str) -> &str {
        self.task(task_id).map_or(MISSING_TASK, |t| t.name.as_str())
    }
}

impl db::Record for Workflow {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Display name for a workflow reference, or [`UNKNOWN_WORKFLOW`] if it dangles.
pub fn workflow_label<'a>(workflows: &'a [Workflow], id: &str) -> &'a str {
    workflows
        .iter()
        .find(|w| w.id == id)
        .map_or(UNKNOWN_WORKFLOW, |w| w.name.as_str())
}

// ---------------------------------------------------------------------------
// Executions
// ---------------------------------------------------------------------------

/// Lifecycle status of a whole execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Paused,
}

impl ExecutionStatus {
    /// Terminal statuses are final; a record in one is never rewritten.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running   => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed    => write!(f, "failed"),
            Self::Paused    => write!(f, "paused"),
        }
    }
}

/// Status of one task within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskResultStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Which lifecycle path produced an execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Task-graph run: all task results flip to completed together.
    #[default]
    Run,
    /// Simulated deployment: succeeds or fails at random, no task results.
    Deployment,
}

/// One run record for a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub mode: ExecutionMode,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub task_results: Vec<TaskResult>,
}

impl WorkflowExecution {
    /// A running task-graph execution with one pending result per task.
    pub fn start_run(workflow: &Workflow) -> Self {
        let task_results = workflow
            .tasks
            .iter()
            .map(|t| TaskResult {
                task_id: t.id.clone(),
                status: TaskResultStatus::Pending,
                start_time: None,
                end_time: None,
            })
            .collect();

        Self {
            id: new_id(),
            workflow_id: workflow.id.clone(),
            status: ExecutionStatus::Running,
            mode: ExecutionMode::Run,
            start_time: Utc::now(),
            end_time: None,
            task_results,
        }
    }

    /// A running deployment execution. Deployments carry no task results.
    pub fn start_deployment(workflow_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            workflow_id: workflow_id.into(),
            status: ExecutionStatus::Running,
            mode: ExecutionMode::Deployment,
            start_time: Utc::now(),
            end_time: None,
            task_results: Vec::new(),
        }
    }

    /// Move to a terminal `status` at `at`.
    ///
    /// Returns `false` and changes nothing if the record is already terminal
    /// or `status` is not terminal. A completed run flips every task result
    /// to completed at the same instant.
    pub fn resolve(&mut self, status: ExecutionStatus, at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.end_time = Some(at);

        if self.mode == ExecutionMode::Run && status == ExecutionStatus::Completed {
            for result in &mut self.task_results {
                result.status = TaskResultStatus::Completed;
                result.start_time = Some(at);
                result.end_time = Some(at);
            }
        }
        true
    }
}

impl db::Record for WorkflowExecution {
    fn record_id(&self) -> &str {
        &self.id
    }
}

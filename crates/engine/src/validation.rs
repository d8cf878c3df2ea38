//! Workflow validation — run this before saving or running a workflow.
//!
//! [`validate`] is pure and total: it never mutates the workflow and never
//! fails. An empty result means the workflow is runnable. Rules, in order:
//!
//! 1. The workflow must be named.
//! 2. It must have at least one task. A task-less workflow reports only
//!    this issue, whatever else is wrong with it.
//! 3. At least one task must be a trigger.
//! 4. No task may have a blank name.
//! 5. Task names must be unique (compared exactly as written).
//! 6. Every non-trigger task must be touched by a transition.
//! 7. Every task kind must come from the closed catalog.
//! 8. Both ends of every transition must exist.
//! 9. Transitions leaving a condition task must carry a condition.
//! 10. Data-processing actions need a source, an output format, and rules
//!     when validation is switched on.
//! 11. Web-crawling actions need a parseable URL, depth 1–10 and 1–1000 pages.
//! 12. AI-completion actions need a model, a prompt, temperature 0–2 and at
//!     least one token.
//!
//! The graph is allowed to contain cycles.

use std::collections::{HashMap, HashSet};

use nodes::ActionType;
use serde::Serialize;
use serde_json::Value;

use crate::models::{Task, TaskKind, Workflow};

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Stable identifier for the rule an issue came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    MissingWorkflowName,
    NoTasks,
    NoTrigger,
    EmptyTaskNames,
    DuplicateTaskName,
    DisconnectedTasks,
    UnknownTaskKind,
    MissingTransitionSource,
    MissingTransitionTarget,
    MissingBranchCondition,
    MissingDataSource,
    MissingOutputFormat,
    MissingValidationRules,
    MissingUrl,
    InvalidUrl,
    DepthOutOfRange,
    MaxPagesOutOfRange,
    MissingModel,
    MissingPrompt,
    TemperatureOutOfRange,
    MaxTokensOutOfRange,
}

/// One structural or semantic defect, with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Issue {
    fn workflow(code: IssueCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), task_id: None }
    }

    fn task(code: IssueCode, task: &Task, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), task_id: Some(task.id.clone()) }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Check `workflow` against every rule and return all issues found.
pub fn validate(workflow: &Workflow) -> Vec<Issue> {
    // An empty workflow reports this one issue and nothing else.
    if workflow.tasks.is_empty() {
        return vec![Issue::workflow(IssueCode::NoTasks, "Workflow must have at least one task")];
    }

    let mut issues = Vec::new();
    if workflow.name.trim().is_empty() {
        issues.push(Issue::workflow(IssueCode::MissingWorkflowName, "Workflow name is required"));
    }

    check_structure(workflow, &mut issues);
    check_transitions(workflow, &mut issues);

    for task in &workflow.tasks {
        match task.action_type() {
            Some(ActionType::DataProcessing) => check_data_processing(task, &mut issues),
            Some(ActionType::WebCrawling) => check_web_crawling(task, &mut issues),
            Some(ActionType::AiCompletion) => check_ai_completion(task, &mut issues),
            _ => {}
        }
    }

    issues
}

/// Convenience: `true` when [`validate`] finds nothing.
pub fn is_runnable(workflow: &Workflow) -> bool {
    validate(workflow).is_empty()
}

// ---------------------------------------------------------------------------
// Rules 3–7: tasks
// ---------------------------------------------------------------------------

fn check_structure(workflow: &Workflow, issues: &mut Vec<Issue>) {
    if !workflow.tasks.iter().any(Task::is_trigger) {
        issues.push(Issue::workflow(
            IssueCode::NoTrigger,
            "Workflow must have at least one trigger task",
        ));
    }

    let blank = workflow.tasks.iter().filter(|t| t.name.trim().is_empty()).count();
    if blank > 0 {
        issues.push(Issue::workflow(
            IssueCode::EmptyTaskNames,
            format!("Tasks with empty names: {blank}"),
        ));
    }

    // Count names, remembering first-appearance order for stable output.
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for task in &workflow.tasks {
        let name = task.name.as_str();
        if name.trim().is_empty() {
            continue;
        }
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }
    for name in order {
        let count = counts[name];
        if count > 1 {
            issues.push(Issue::workflow(
                IssueCode::DuplicateTaskName,
                format!("Duplicate task name '{name}' is used {count} times"),
            ));
        }
    }

    let connected: HashSet<&str> = workflow
        .transitions
        .iter()
        .flat_map(|t| [t.source_task_id.as_str(), t.target_task_id.as_str()])
        .collect();
    let disconnected: Vec<&str> = workflow
        .tasks
        .iter()
        .filter(|t| !t.is_trigger() && !connected.contains(t.id.as_str()))
        .map(|t| t.name.as_str())
        .collect();
    if !disconnected.is_empty() {
        issues.push(Issue::workflow(
            IssueCode::DisconnectedTasks,
            format!(
                "Workflow has disconnected non-trigger tasks: {} ({})",
                disconnected.len(),
                disconnected.join(", ")
            ),
        ));
    }

    for task in &workflow.tasks {
        if task.kind == TaskKind::Unknown {
            issues.push(Issue::task(
                IssueCode::UnknownTaskKind,
                task,
                format!("Task '{}' has an unknown type", task.name),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Rules 8–9: transitions
// ---------------------------------------------------------------------------

fn check_transitions(workflow: &Workflow, issues: &mut Vec<Issue>) {
    for transition in &workflow.transitions {
        let source = workflow.task(&transition.source_task_id);

        if source.is_none() {
            issues.push(Issue::workflow(
                IssueCode::MissingTransitionSource,
                format!(
                    "Transition '{}' references a missing source task '{}'",
                    transition.id, transition.source_task_id
                ),
            ));
        }
        if workflow.task(&transition.target_task_id).is_none() {
            issues.push(Issue::workflow(
                IssueCode::MissingTransitionTarget,
                format!(
                    "Transition '{}' references a missing target task '{}'",
                    transition.id, transition.target_task_id
                ),
            ));
        }

        if let Some(task) = source {
            let guarded = transition
                .condition
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty());
            if matches!(task.kind, TaskKind::Condition { .. }) && !guarded {
                issues.push(Issue::task(
                    IssueCode::MissingBranchCondition,
                    task,
                    format!("Transition from condition task '{}' must have a condition", task.name),
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rules 10–12: action parameters
// ---------------------------------------------------------------------------

/// A non-blank string parameter.
fn text<'a>(task: &'a Task, key: &str) -> Option<&'a str> {
    task.parameters
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A numeric parameter. Form fields sometimes store numbers as strings.
fn number(task: &Task, key: &str) -> Option<f64> {
    match task.parameters.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn in_range(value: Option<f64>, min: f64, max: f64) -> bool {
    value.is_some_and(|v| v >= min && v <= max)
}

fn check_data_processing(task: &Task, issues: &mut Vec<Issue>) {
    let name = &task.name;
    if text(task, "dataSource").is_none() {
        issues.push(Issue::task(
            IssueCode::MissingDataSource,
            task,
            format!("Data processing task '{name}' is missing a data source"),
        ));
    }
    if text(task, "outputFormat").is_none() {
        issues.push(Issue::task(
            IssueCode::MissingOutputFormat,
            task,
            format!("Data processing task '{name}' is missing an output format"),
        ));
    }

    let validation_on = task.parameters.get("validation").and_then(Value::as_bool) == Some(true);
    let has_rules = match task.parameters.get("validationRules") {
        Some(Value::Array(rules)) => !rules.is_empty(),
        Some(Value::String(rules)) => !rules.trim().is_empty(),
        Some(Value::Object(rules)) => !rules.is_empty(),
        _ => false,
    };
    if validation_on && !has_rules {
        issues.push(Issue::task(
            IssueCode::MissingValidationRules,
            task,
            format!("Data processing task '{name}' has validation enabled but no validation rules"),
        ));
    }
}

fn check_web_crawling(task: &Task, issues: &mut Vec<Issue>) {
    let name = &task.name;
    match text(task, "url") {
        None => issues.push(Issue::task(
            IssueCode::MissingUrl,
            task,
            format!("Web crawling task '{name}' requires a URL"),
        )),
        Some(raw) if url::Url::parse(raw).is_err() => issues.push(Issue::task(
            IssueCode::InvalidUrl,
            task,
            format!("Web crawling task '{name}' has an invalid URL '{raw}'"),
        )),
        Some(_) => {}
    }

    if !in_range(number(task, "depth"), 1.0, 10.0) {
        issues.push(Issue::task(
            IssueCode::DepthOutOfRange,
            task,
            format!("Web crawling task '{name}' depth must be between 1 and 10"),
        ));
    }
    if !in_range(number(task, "maxPages"), 1.0, 1000.0) {
        issues.push(Issue::task(
            IssueCode::MaxPagesOutOfRange,
            task,
            format!("Web crawling task '{name}' max pages must be between 1 and 1000"),
        ));
    }
}

fn check_ai_completion(task: &Task, issues: &mut Vec<Issue>) {
    let name = &task.name;
    if text(task, "model").is_none() {
        issues.push(Issue::task(
            IssueCode::MissingModel,
            task,
            format!("AI completion task '{name}' requires a model"),
        ));
    }
    if text(task, "prompt").is_none() {
        issues.push(Issue::task(
            IssueCode::MissingPrompt,
            task,
            format!("AI completion task '{name}' requires a prompt"),
        ));
    }
    if !in_range(number(task, "temperature"), 0.0, 2.0) {
        issues.push(Issue::task(
            IssueCode::TemperatureOutOfRange,
            task,
            format!("AI completion task '{name}' temperature must be between 0 and 2"),
        ));
    }
    if !number(task, "maxTokens").is_some_and(|n| n >= 1.0) {
        issues.push(Issue::task(
            IssueCode::MaxTokensOutOfRange,
            task,
            format!("AI completion task '{name}' max tokens must be at least 1"),
        ));
    }
}

//! Template catalog and instantiation.
//!
//! A template is a read-only, pre-shaped workflow plus a [`Wiring`] recipe
//! describing which transitions to synthesise when it is instantiated.
//! Instantiation always deep-clones: the template itself is never touched.

use std::collections::HashMap;

use chrono::Utc;
use nodes::{ActionType, TriggerType};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::models::{new_id, Task, Transition, Workflow};

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// One guarded outgoing edge of a branch task, by task position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchArm {
    pub target: usize,
    pub condition: String,
}

/// How an instantiated template gets its transitions.
///
/// Indices refer to positions in the template's task list. Synthesised
/// edges are added on top of any transitions the template embeds, skipping
/// pairs that are already connected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Wiring {
    /// Use the embedded transitions only (possibly none).
    Embedded,
    /// Connect `task[i] → task[i + 1]` for every consecutive pair.
    Sequential,
    /// Connect tasks sequentially up to `source`, then fan out from `source`
    /// along each guarded arm.
    Branch { source: usize, arms: Vec<BranchArm> },
}

// ---------------------------------------------------------------------------
// WorkflowTemplate
// ---------------------------------------------------------------------------

/// A named, reusable starting workflow offered through the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Pre-shaped tasks and any embedded transitions.
    pub workflow: Workflow,
    pub wiring: Wiring,
}

impl WorkflowTemplate {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        category: &str,
        tasks: Vec<Task>,
        transitions: Vec<Transition>,
        wiring: Wiring,
    ) -> Self {
        let mut workflow = Workflow::new(name).with_graph(tasks, transitions);
        workflow.description = description.to_string();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            workflow,
            wiring,
        }
    }

    fn matches(&self, query: &str, category: Option<&str>) -> bool {
        let query = query.trim().to_lowercase();
        let text_ok = query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query);
        let category_ok = category.map_or(true, |c| self.category.eq_ignore_ascii_case(c));
        text_ok && category_ok
    }

    /// Build a fresh workflow from this template.
    ///
    /// Task and transition ids are regenerated. The workflow id is
    /// `existing_id` when replacing a draft that already has one, otherwise
    /// fresh. Both timestamps are stamped now.
    pub fn instantiate(&self, existing_id: Option<&str>) -> Workflow {
        let mut id_map: HashMap<&str, String> = HashMap::new();
        let tasks: Vec<Task> = self
            .workflow
            .tasks
            .iter()
            .map(|t| {
                let mut task = t.clone();
                task.id = new_id();
                id_map.insert(t.id.as_str(), task.id.clone());
                task
            })
            .collect();

        let remap = |id: &str| id_map.get(id).cloned().unwrap_or_else(|| id.to_string());
        let mut transitions: Vec<Transition> = self
            .workflow
            .transitions
            .iter()
            .map(|t| Transition {
                id: new_id(),
                source_task_id: remap(&t.source_task_id),
                target_task_id: remap(&t.target_task_id),
                condition: t.condition.clone(),
            })
            .collect();

        for (source, target, condition) in self.synthesised_edges(tasks.len()) {
            let (from, to) = (&tasks[source].id, &tasks[target].id);
            let exists = transitions
                .iter()
                .any(|t| &t.source_task_id == from && &t.target_task_id == to);
            if !exists {
                let mut transition = Transition::new(from, to);
                transition.condition = condition;
                transitions.push(transition);
            }
        }

        let now = Utc::now();
        let workflow = Workflow {
            id: existing_id.map_or_else(new_id, str::to_string),
            name: self.name.clone(),
            description: self.description.clone(),
            tasks,
            transitions,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        debug!(
            template = %self.id,
            workflow_id = %workflow.id,
            "instantiated template with {} tasks and {} transitions",
            workflow.tasks.len(),
            workflow.transitions.len()
        );
        workflow
    }

    /// `(source, target, condition)` index triples implied by the wiring,
    /// dropping any that fall outside `task_count`.
    fn synthesised_edges(&self, task_count: usize) -> Vec<(usize, usize, Option<String>)> {
        let sequential = |upto: usize| -> Vec<(usize, usize, Option<String>)> {
            (1..=upto.min(task_count.saturating_sub(1)))
                .map(|i| (i - 1, i, None))
                .collect()
        };

        match &self.wiring {
            Wiring::Embedded => Vec::new(),
            Wiring::Sequential => sequential(task_count.saturating_sub(1)),
            Wiring::Branch { source, arms } => {
                let mut edges = sequential(*source);
                edges.extend(
                    arms.iter()
                        .filter(|arm| *source < task_count && arm.target < task_count)
                        .map(|arm| (*source, arm.target, Some(arm.condition.clone()))),
                );
                edges
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateCatalog
// ---------------------------------------------------------------------------

/// Read-only list of templates.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<WorkflowTemplate>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    pub fn new(templates: Vec<WorkflowTemplate>) -> Self {
        Self { templates }
    }

    /// The templates shipped with the engine.
    pub fn builtin() -> Self {
        Self::new(vec![
            blank_workflow(),
            simple_workflow(),
            conditional_workflow(),
            data_pipeline(),
            web_scraper(),
            api_integration(),
        ])
    }

    pub fn all(&self) -> &[WorkflowTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Case-insensitive free-text search over name and description,
    /// optionally narrowed to one category. An empty query matches all.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<&WorkflowTemplate> {
        self.templates.iter().filter(|t| t.matches(query, category)).collect()
    }

    /// Distinct categories in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for template in &self.templates {
            if !seen.contains(&template.category.as_str()) {
                seen.push(&template.category);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Built-in templates
// ---------------------------------------------------------------------------

fn blank_workflow() -> WorkflowTemplate {
    WorkflowTemplate::new(
        "blank-workflow",
        "Blank Workflow",
        "Start from a single manual trigger.",
        "Basic",
        vec![Task::trigger("Start", TriggerType::UserAction).at(100.0, 200.0)],
        vec![],
        Wiring::Embedded,
    )
}

fn simple_workflow() -> WorkflowTemplate {
    WorkflowTemplate::new(
        "simple-workflow",
        "Simple Workflow",
        "A trigger followed by a single action.",
        "Basic",
        vec![
            Task::trigger("Start", TriggerType::UserAction).at(100.0, 200.0),
            Task::action("Send Notification", ActionType::Notification).at(350.0, 200.0),
        ],
        vec![],
        Wiring::Sequential,
    )
}

fn conditional_workflow() -> WorkflowTemplate {
    WorkflowTemplate::new(
        "conditional-workflow",
        "Conditional Workflow",
        "Route incoming data down one of two branches based on its value.",
        "Logic",
        vec![
            Task::trigger("Data Received", TriggerType::Event).at(100.0, 200.0),
            Task::condition("Check Value", "value > 100").at(350.0, 200.0),
            Task::action("High Value Handler", ActionType::Notification).at(600.0, 100.0),
            Task::action("Low Value Handler", ActionType::Email).at(600.0, 300.0),
        ],
        vec![],
        Wiring::Branch {
            source: 1,
            arms: vec![
                BranchArm { target: 2, condition: "value > 100".into() },
                BranchArm { target: 3, condition: "value <= 100".into() },
            ],
        },
    )
}

fn data_pipeline() -> WorkflowTemplate {
    let mut process = Task::action("Process Data", ActionType::DataProcessing).at(350.0, 200.0);
    process.set_parameter("dataSource", json!("database://events"));

    let mut check = Task::action("Validate Data", ActionType::DataProcessing).at(600.0, 200.0);
    check.set_parameter("dataSource", json!("previous-step"));
    check.set_parameter("operation", json!("validate"));
    check.set_parameter("validation", json!(true));
    check.set_parameter("validationRules", json!(["required:id", "type:record"]));

    WorkflowTemplate::new(
        "data-pipeline",
        "Data Pipeline",
        "Process data on a schedule, then validate the result.",
        "Data",
        vec![
            Task::trigger("Nightly Run", TriggerType::Schedule).at(100.0, 200.0),
            process,
            check,
        ],
        vec![],
        Wiring::Sequential,
    )
}

fn web_scraper() -> WorkflowTemplate {
    let trigger = Task::trigger("Daily Crawl", TriggerType::Schedule).at(100.0, 200.0);

    let mut crawl = Task::action("Crawl Site", ActionType::WebCrawling).at(350.0, 200.0);
    crawl.set_parameter("url", json!("https://example.com"));
    crawl.set_parameter("depth", json!(2));
    crawl.set_parameter("maxPages", json!(50));

    let mut summarise = Task::action("Summarise Pages", ActionType::AiCompletion).at(600.0, 200.0);
    summarise.set_parameter("prompt", json!("Summarise the crawled pages in five bullet points."));

    let mut digest = Task::action("Send Digest", ActionType::Email).at(850.0, 200.0);
    digest.set_parameter("subject", json!("Daily crawl digest"));

    let transitions = vec![
        Transition::new(&trigger.id, &crawl.id),
        Transition::new(&crawl.id, &summarise.id),
        Transition::new(&summarise.id, &digest.id),
    ];

    WorkflowTemplate::new(
        "web-scraper",
        "Web Scraper",
        "Crawl a site, summarise the pages with AI and email the digest.",
        "Data",
        vec![trigger, crawl, summarise, digest],
        transitions,
        Wiring::Embedded,
    )
}

fn api_integration() -> WorkflowTemplate {
    let mut hook = Task::trigger("Incoming Webhook", TriggerType::WebHook).at(100.0, 200.0);
    hook.set_parameter("path", json!("/incoming"));

    let mut forward = Task::action("Forward Request", ActionType::HttpRequest).at(350.0, 200.0);
    forward.set_parameter("method", json!("POST"));
    forward.set_parameter("url", json!("https://api.example.com/events"));

    WorkflowTemplate::new(
        "api-integration",
        "API Integration",
        "Receive a webhook, forward it to an external API and notify the team.",
        "Integration",
        vec![
            hook,
            forward,
            Task::action("Notify Team", ActionType::Notification).at(600.0, 200.0),
        ],
        vec![],
        Wiring::Sequential,
    )
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskKind;
    use crate::validation::validate;

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::builtin()
    }

    #[test]
    fn conditional_template_wires_complementary_branches() {
        let wf = catalog().get("conditional-workflow").unwrap().instantiate(None);

        assert_eq!(wf.tasks.len(), 4);
        assert_eq!(wf.transitions.len(), 3);

        let check = &wf.tasks[1];
        assert!(matches!(check.kind, TaskKind::Condition { .. }));

        let mut guards: Vec<&str> = wf
            .transitions_from(&check.id)
            .filter_map(|t| t.condition.as_deref())
            .collect();
        guards.sort();
        assert_eq!(guards, vec!["value <= 100", "value > 100"]);

        // Trigger feeds the condition unguarded.
        assert!(wf.has_transition(&wf.tasks[0].id, &check.id));
    }

    #[test]
    fn every_builtin_template_instantiates_to_a_valid_workflow() {
        for template in catalog().all() {
            let wf = template.instantiate(None);
            assert!(validate(&wf).is_empty(), "{} → {:?}", template.id, validate(&wf));
        }
    }

    #[test]
    fn sequential_template_connects_consecutive_tasks() {
        let wf = catalog().get("data-pipeline").unwrap().instantiate(None);
        assert_eq!(wf.transitions.len(), 2);
        assert!(wf.has_transition(&wf.tasks[0].id, &wf.tasks[1].id));
        assert!(wf.has_transition(&wf.tasks[1].id, &wf.tasks[2].id));
    }

    #[test]
    fn embedded_transitions_are_remapped_to_fresh_task_ids() {
        let template = catalog().get("web-scraper").unwrap().clone();
        let wf = template.instantiate(None);

        assert_eq!(wf.transitions.len(), 3);
        for transition in &wf.transitions {
            assert!(wf.task(&transition.source_task_id).is_some());
            assert!(wf.task(&transition.target_task_id).is_some());
        }
        for (fresh, original) in wf.tasks.iter().zip(&template.workflow.tasks) {
            assert_ne!(fresh.id, original.id);
            assert_eq!(fresh.name, original.name);
        }
    }

    #[test]
    fn blank_template_keeps_its_lack_of_transitions() {
        let wf = catalog().get("blank-workflow").unwrap().instantiate(None);
        assert_eq!(wf.tasks.len(), 1);
        assert!(wf.transitions.is_empty());
    }

    #[test]
    fn instantiation_reuses_an_existing_draft_id() {
        let template = catalog().get("simple-workflow").unwrap().clone();
        assert_eq!(template.instantiate(Some("draft-1")).id, "draft-1");

        let a = template.instantiate(None);
        let b = template.instantiate(None);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, template.workflow.id);
    }

    #[test]
    fn instantiation_never_mutates_the_template() {
        let template = catalog().get("conditional-workflow").unwrap().clone();
        let before = template.workflow.clone();
        let mut wf = template.instantiate(None);
        wf.tasks[0].name = "changed".into();
        assert_eq!(template.workflow, before);
        assert!(template.workflow.transitions.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let catalog = catalog();
        let by_name: Vec<&str> = catalog.search("SCRAPER", None).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(by_name, vec!["web-scraper"]);

        let by_description: Vec<&str> =
            catalog.search("webhook", None).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(by_description, vec!["api-integration"]);

        assert_eq!(catalog.search("", None).len(), catalog.all().len());
    }

    #[test]
    fn search_filters_by_category() {
        let catalog = catalog();
        let data: Vec<&str> = catalog.search("", Some("data")).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(data, vec!["data-pipeline", "web-scraper"]);
        assert!(catalog.search("scraper", Some("Logic")).is_empty());
    }

    #[test]
    fn categories_are_distinct_and_ordered() {
        assert_eq!(catalog().categories(), vec!["Basic", "Logic", "Data", "Integration"]);
    }

    #[test]
    fn branch_arms_outside_the_task_list_are_ignored() {
        let template = WorkflowTemplate::new(
            "broken",
            "Broken",
            "",
            "Test",
            vec![
                Task::trigger("Start", TriggerType::UserAction),
                Task::condition("Check", "x"),
            ],
            vec![],
            Wiring::Branch {
                source: 1,
                arms: vec![BranchArm { target: 7, condition: "x".into() }],
            },
        );
        let wf = template.instantiate(None);
        assert_eq!(wf.transitions.len(), 1);
    }
}

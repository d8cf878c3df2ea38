//! `flowsmith` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate`   — validate a workflow JSON file.
//! - `templates`  — list or search the built-in templates.
//! - `new`        — create a workflow from a template.
//! - `import`     — import a workflow JSON file into the store.
//! - `export`     — export a stored workflow as JSON.
//! - `list`       — list stored workflows.
//! - `run`        — run (or deploy) a stored workflow and wait for the result.
//! - `executions` — list execution records.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use engine::models::workflow_label;
use engine::{
    export_workflow, import_workflow, EngineError, ExecutionStore, ExecutorConfig, ImportMode,
    Issue, TemplateCatalog, WorkflowEditor, WorkflowExecutor, WorkflowStore,
};

#[derive(Parser)]
#[command(name = "flowsmith", about = "Visual workflow builder backend", version)]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the workflow and execution collections.
    #[arg(long, global = true, env = "FLOWSMITH_DATA_DIR", default_value = ".flowsmith")]
    data_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
    /// List built-in templates.
    Templates {
        /// Case-insensitive text matched against name and description.
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Create and save a workflow from a template.
    New {
        #[arg(long)]
        template: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Import a workflow JSON file.
    Import {
        path: PathBuf,
        /// Keep the document's id, overwriting any stored workflow with it.
        #[arg(long)]
        replace: bool,
    },
    /// Export a stored workflow as JSON.
    Export {
        id: String,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored workflows.
    List,
    /// Run a stored workflow and wait for it to resolve.
    Run {
        id: String,
        /// Simulate a deployment instead of a task-graph run.
        #[arg(long)]
        deploy: bool,
    },
    /// List execution records.
    Executions,
}

/// Contents of the `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    executor: ExecutorConfig,
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let settings = toml::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(?settings, "loaded settings");
    Ok(settings)
}

fn print_issues(issues: &[Issue]) {
    eprintln!("❌ Validation failed with {} issue(s):", issues.len());
    for issue in issues {
        eprintln!("  - {issue}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Validate { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read file {}", path.display()))?;
            let workflow = import_workflow(&content, ImportMode::Replace)?;

            let issues = engine::validate(&workflow);
            if !issues.is_empty() {
                print_issues(&issues);
                std::process::exit(1);
            }
            println!("✅ Workflow '{}' is valid ({} tasks).", workflow.name, workflow.tasks.len());
        }
        Command::Templates { search, category } => {
            let catalog = TemplateCatalog::builtin();
            for template in catalog.search(&search, category.as_deref()) {
                println!(
                    "{:<22} {:<12} {} — {}",
                    template.id, template.category, template.name, template.description
                );
            }
        }
        Command::New { template, name } => {
            let catalog = TemplateCatalog::builtin();
            let template = catalog
                .get(&template)
                .ok_or_else(|| engine::EditorError::UnknownTemplate(template.clone()))?;

            let mut editor = WorkflowEditor::from_template(template);
            if let Some(name) = name {
                editor.rename(name);
            }
            let pool = db::pool::create_pool(&cli.data_dir).await?;
            save_or_exit(&mut editor, &pool).await?;
            println!("{}", editor.workflow().id);
        }
        Command::Import { path, replace } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read file {}", path.display()))?;
            let mode = if replace { ImportMode::Replace } else { ImportMode::New };
            let workflow = import_workflow(&content, mode)?;
            let id = workflow.id.clone();

            let pool = db::pool::create_pool(&cli.data_dir).await?;
            pool.save_workflow(workflow).await?;
            info!("imported workflow {id}");
            println!("{id}");
        }
        Command::Export { id, out } => {
            let pool = db::pool::create_pool(&cli.data_dir).await?;
            let workflow = pool.get_workflow(&id).await?;
            let json = export_workflow(&workflow)?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("cannot write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::List => {
            let pool = db::pool::create_pool(&cli.data_dir).await?;
            for workflow in pool.list_workflows().await? {
                println!(
                    "{}  v{}  {} tasks  {}",
                    workflow.id,
                    workflow.version,
                    workflow.tasks.len(),
                    workflow.name
                );
            }
        }
        Command::Run { id, deploy } => {
            let pool = db::pool::create_pool(&cli.data_dir).await?;
            let executor = WorkflowExecutor::new(Arc::new(pool.clone()), settings.executor);

            let started = if deploy {
                executor.deploy(&id).await
            } else {
                let workflow = pool.get_workflow(&id).await?;
                executor.start(&workflow).await
            };
            let handle = match started {
                Ok(handle) => handle,
                Err(EngineError::Invalid(issues)) => {
                    print_issues(&issues);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            info!("waiting for execution {}", handle.execution_id());
            let execution = handle.wait().await?;
            println!("{} {}", execution.id, execution.status);
        }
        Command::Executions => {
            let pool = db::pool::create_pool(&cli.data_dir).await?;
            let workflows = pool.list_workflows().await?;
            for execution in pool.list_executions().await? {
                println!(
                    "{}  {}  {:?}  {}  {}",
                    execution.id,
                    execution.status,
                    execution.mode,
                    execution.start_time.to_rfc3339(),
                    workflow_label(&workflows, &execution.workflow_id)
                );
            }
        }
    }

    Ok(())
}

async fn save_or_exit(editor: &mut WorkflowEditor, store: &dyn WorkflowStore) -> Result<()> {
    match editor.save(store).await {
        Ok(_) => Ok(()),
        Err(EngineError::Invalid(issues)) => {
            print_issues(&issues);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

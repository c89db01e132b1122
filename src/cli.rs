//! CLI commands for the synod binary
//!
//! Thin adapter over the orchestration engine. Any returned result (degraded
//! synthesis included) exits 0; only `RoleNotFound`, `AllAgentsFailed`, and
//! permanent provider/config errors exit non-zero.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use synod_core::store::TaskMemoryStore;
use synod_core::{
    AgentRegistry, Error, OrchestrateOptions, Orchestrator, OrchestratorConfig, Result, Task,
};
use synod_llm::{ModelTier, NvidiaProvider};
use synod_search::DuckDuckGoProvider;
use tracing::warn;
use uuid::Uuid;

/// Synod command line interface
#[derive(Parser)]
#[command(name = "synod", version, about = "Multi-expert task orchestration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand)]
pub enum Command {
    /// Orchestrate a task across the expert roles
    Run {
        /// The task to orchestrate (omit when using --use-task)
        task: Option<String>,
        /// File whose contents are added to the working context
        #[arg(long)]
        file: Option<PathBuf>,
        /// Model tier: fast, standard, or premium
        #[arg(long, default_value = "standard")]
        tier: String,
        /// Extra working context
        #[arg(long)]
        context: Option<String>,
        /// Print each expert's response as it arrives
        #[arg(long)]
        show_thinking: bool,
        /// Re-run a stored task by id instead of creating a new one
        #[arg(long)]
        use_task: Option<String>,
    },
    /// List the expert role catalog
    Roles,
    /// Inspect or set the current-task pointer
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

/// Current-task pointer commands
#[derive(Subcommand)]
pub enum TaskCommand {
    /// Print the current task id and title
    Current,
    /// Set the current task id
    Use {
        /// Task id to point at
        id: String,
    },
    /// Clear the current-task pointer
    Clear,
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            task,
            file,
            tier,
            context,
            show_thinking,
            use_task,
        } => run_task(task, file, &tier, context, show_thinking, use_task).await,
        Command::Roles => {
            print_roles();
            Ok(())
        }
        Command::Task { command } => run_task_command(command),
    }
}

async fn run_task(
    task_text: Option<String>,
    file: Option<PathBuf>,
    tier: &str,
    context: Option<String>,
    show_thinking: bool,
    use_task: Option<String>,
) -> Result<()> {
    let tier: ModelTier = tier.parse().map_err(Error::Internal)?;

    let provider = Arc::new(NvidiaProvider::from_env()?);
    let config = OrchestratorConfig::new();
    let store = TaskMemoryStore::new(&config.data_dir);

    let mut orchestrator = Orchestrator::new(provider, config).with_store(store.clone());
    match DuckDuckGoProvider::new() {
        Ok(search) => orchestrator = orchestrator.with_search(Arc::new(search)),
        Err(e) => warn!(error = %e, "search unavailable, freshness checks disabled"),
    }

    let task = match (use_task, task_text) {
        (Some(id), _) => task_from_store(&store, &id)?,
        (None, Some(text)) => Task::from_text(text),
        (None, None) => {
            return Err(Error::Internal(
                "provide a task, or --use-task <ID> to re-run a stored one".to_string(),
            ))
        }
    };

    let mut options = OrchestrateOptions::new()
        .with_show_thinking(show_thinking)
        .with_model_tier(tier);
    if let Some(path) = file {
        options = options.with_target_file(path);
    }
    if let Some(context) = context {
        options = options.with_working_context(context);
    }

    let result = orchestrator.orchestrate(task, &options).await?;

    if let Err(e) = store.set_current_task(&result.task.id.to_string()) {
        warn!(error = %e, "failed to update current-task pointer");
    }

    if show_thinking {
        for attempt in &result.trace {
            let status = if attempt.success { "ok" } else { "failed" };
            let reason = attempt.failure.as_deref().unwrap_or("-");
            eprintln!("[{}] {} ({})", attempt.role, status, reason);
        }
        eprintln!();
    }

    println!("{}", result.final_text);

    if result.degraded {
        eprintln!("\n(synthesis degraded: responses are concatenated per role)");
    }

    Ok(())
}

/// Rebuild a task from its stored manifest.
fn task_from_store(store: &TaskMemoryStore, id: &str) -> Result<Task> {
    let manifest = store.read_manifest(id);
    if manifest.title.is_empty() && manifest.description.is_empty() {
        return Err(Error::Store(format!("no stored task with id '{id}'")));
    }

    let task_id = Uuid::parse_str(id)
        .map_err(|e| Error::Store(format!("invalid task id '{id}': {e}")))?;

    Ok(Task {
        id: task_id,
        title: manifest.title,
        description: manifest.description,
        goals: manifest.goals,
        constraints: manifest.constraints,
    })
}

fn print_roles() {
    let registry = AgentRegistry::new();
    for role in registry.roles() {
        let profile = registry.profile(*role);
        let freshness = if profile.requires_freshness {
            "freshness-tracked"
        } else {
            "static"
        };
        println!(
            "{:<16} {:<22} {} (knowledge cutoff {}, {})",
            profile.id, profile.display_name, profile.domain, profile.knowledge_cutoff, freshness
        );
    }
}

fn run_task_command(command: TaskCommand) -> Result<()> {
    let config = OrchestratorConfig::new();
    let store = TaskMemoryStore::new(&config.data_dir);

    match command {
        TaskCommand::Current => match store.current_task() {
            Some(id) => {
                let manifest = store.read_manifest(&id);
                if manifest.title.is_empty() {
                    println!("{id}");
                } else {
                    println!("{id}  {}", manifest.title);
                }
            }
            None => println!("(no current task)"),
        },
        TaskCommand::Use { id } => {
            store.set_current_task(&id)?;
            println!("current task set to {id}");
        }
        TaskCommand::Clear => {
            store.clear_current_task()?;
            println!("current task cleared");
        }
    }

    Ok(())
}

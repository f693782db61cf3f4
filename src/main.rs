//! agentflow - command line front end
//!
//! Runs agent pipelines with live per-step progress and manages the persisted
//! agents, history, settings and backups.

use agentflow::agent::{Agent, AgentCategory, AgentRegistry};
use agentflow::config::{AppConfig, FontSize, Theme};
use agentflow::engine::{ProviderGenerationClient, RunControl, RunOutcome};
use agentflow::error::{FlowError, FlowResult};
use agentflow::observability::init_default_logging;
use agentflow::progress::{ChannelProgress, ProgressEventType, ProgressMessage};
use agentflow::storage::{default_backup_file_name, JsonFileStore};
use agentflow::task::{StepStatus, TaskStatus, WorkflowTask};
use agentflow::workspace::Workspace;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn, Level};

/// Sequential multi-agent LLM pipelines
#[derive(Parser)]
#[command(name = "agentflow")]
#[command(about = "Run ordered pipelines of LLM agents")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline; Ctrl-C stops it before the next step
    Run {
        /// Task title (defaults to a timestamped title)
        #[arg(long)]
        title: Option<String>,
        /// Agent ids in execution order
        #[arg(long, value_delimiter = ',', required = true)]
        agents: Vec<String>,
        /// What the pipeline should do
        description: String,
    },
    /// Manage agents
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Inspect and prune finished tasks
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Show the activity log
    Logs,
    /// Change persisted settings
    Settings {
        /// light | dark | system
        #[arg(long, value_parser = parse_theme)]
        theme: Option<Theme>,
        /// small | medium | large
        #[arg(long, value_parser = parse_font_size)]
        font_size: Option<FontSize>,
        #[arg(long)]
        max_history: Option<usize>,
        #[arg(long)]
        auto_fold_history: Option<bool>,
    },
    /// Write agents, history and settings to a JSON backup
    Export {
        /// Output file (defaults to agent_platform_backup_YYYY-MM-DD.json)
        path: Option<PathBuf>,
    },
    /// Restore whatever sections a JSON backup contains
    Import { path: PathBuf },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List agents
    List,
    /// Show one agent
    Show { id: String },
    /// Create an agent
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        instruction: String,
        /// analysis | execution | verification
        #[arg(long, default_value = "analysis", value_parser = parse_category)]
        category: AgentCategory,
        #[arg(long, default_value_t = 3)]
        priority: u8,
    },
    /// Delete an agent (history is kept)
    Remove { id: String },
    /// Duplicate an agent under a new id
    Copy { id: String },
    /// Pin an agent, or unpin with --off
    Pin {
        id: String,
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    List,
    Show { id: String },
    Remove { id: String },
    Clear,
}

fn parse_category(s: &str) -> Result<AgentCategory, String> {
    AgentCategory::parse(s).ok_or_else(|| format!("unknown category: {s}"))
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    match s.to_lowercase().as_str() {
        "light" => Ok(Theme::Light),
        "dark" => Ok(Theme::Dark),
        "system" => Ok(Theme::System),
        _ => Err(format!("unknown theme: {s} (light, dark, system)")),
    }
}

fn parse_font_size(s: &str) -> Result<FontSize, String> {
    match s.to_lowercase().as_str() {
        "small" => Ok(FontSize::Small),
        "medium" => Ok(FontSize::Medium),
        "large" => Ok(FontSize::Large),
        _ => Err(format!("unknown font size: {s} (small, medium, large)")),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    init_default_logging(default_level);

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e.display_message());
            process::exit(1);
        }
    };

    match execute(cli.command, config).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Command failed: {}", e.display_message());
            process::exit(1);
        }
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> FlowResult<AppConfig> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(AppConfig::load_from_file(path)?)
        }
        None => {
            for path_str in ["agentflow.toml", "config/agentflow.toml"] {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(AppConfig::load_from_file(&path)?);
                }
            }
            info!("No configuration file found; using defaults");
            Ok(AppConfig::default())
        }
    }
}

fn open_workspace(config: AppConfig) -> FlowResult<Workspace> {
    let store = JsonFileStore::open(&config.storage.data_dir)?;
    Workspace::open(config, Arc::new(store))
}

/// Returns Ok(false) when a pipeline ran but did not complete
async fn execute(command: Commands, config: AppConfig) -> FlowResult<bool> {
    match command {
        Commands::Config { show } => {
            if show {
                let rendered = toml::to_string_pretty(&config)
                    .map_err(|e| FlowError::internal(e.to_string()))?;
                println!("{rendered}");
            }
            println!("Configuration is valid");
            Ok(true)
        }
        Commands::Run {
            title,
            agents,
            description,
        } => run_pipeline(config, title, agents, description).await,
        command => {
            let mut workspace = open_workspace(config)?;
            manage(&mut workspace, command)?;
            Ok(true)
        }
    }
}

async fn run_pipeline(
    config: AppConfig,
    title: Option<String>,
    agents: Vec<String>,
    description: String,
) -> FlowResult<bool> {
    let client = Arc::new(ProviderGenerationClient::from_config(&config)?);
    let mut workspace = open_workspace(config)?;

    let task = workspace.build_task(title, &description, agents)?;
    let (progress, mut updates) = ChannelProgress::channel();
    let executor = workspace.executor(client, Arc::new(progress));

    let printer = {
        let registry = workspace.registry().clone();
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                print_update(&registry, &update);
            }
        })
    };

    let control = RunControl::new();
    let interrupt = control.clone();
    let signal_task = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping before the next step");
            interrupt.cancel();
        }
    });

    let result = workspace.run_task(&executor, task, &control).await;
    signal_task.abort();
    drop(executor);
    let _ = printer.await;

    match result? {
        RunOutcome::Finished(report) => {
            print_summary(&workspace, &report.task);
            Ok(report.task.status == TaskStatus::Completed)
        }
        RunOutcome::Paused(paused) => {
            println!("Task paused before step {}", paused.next_step + 1);
            Ok(false)
        }
    }
}

fn print_update(registry: &AgentRegistry, update: &ProgressMessage) {
    match update.event_type {
        ProgressEventType::TaskStart => {
            println!("▶ {} ({} steps)", update.snapshot.title, update.snapshot.steps.len());
        }
        ProgressEventType::StepUpdate | ProgressEventType::TaskPaused => {
            let Some(index) = update.step_index else {
                return;
            };
            let Some(step) = update.snapshot.step(index) else {
                return;
            };
            let name = registry
                .get(&step.agent_id)
                .map(|a| a.name)
                .unwrap_or_else(|| step.agent_id.clone());
            let position = format!("[{}/{}]", index + 1, update.snapshot.steps.len());
            match (step.status, &step.error) {
                (StepStatus::Failed, Some(error)) => {
                    println!("  {position} {name} - {}: {error}", step.status)
                }
                _ => println!("  {position} {name} - {}", step.status),
            }
        }
        ProgressEventType::TaskFinished => {
            println!("■ {}", update.message);
        }
    }
}

fn print_summary(workspace: &Workspace, task: &WorkflowTask) {
    println!();
    println!("{} [{}] {}%", task.title, task.status, task.progress_percent());
    for (index, step) in task.steps.iter().enumerate() {
        println!(
            "\n--- {}. {} ({}) ---",
            index + 1,
            workspace.agent_display_name(&step.agent_id),
            step.status
        );
        if let Some(output) = &step.output {
            println!("{output}");
        }
        if let Some(error) = &step.error {
            println!("error: {error}");
        }
    }
}

fn manage(workspace: &mut Workspace, command: Commands) -> FlowResult<()> {
    match command {
        Commands::Agents { command } => manage_agents(workspace, command),
        Commands::History { command } => manage_history(workspace, command),
        Commands::Logs => {
            for entry in workspace.activity_log() {
                println!(
                    "{}  {:<8} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.action.label(),
                    entry.detail
                );
            }
            Ok(())
        }
        Commands::Settings {
            theme,
            font_size,
            max_history,
            auto_fold_history,
        } => {
            let mut settings = workspace.settings().clone();
            if let Some(theme) = theme {
                settings.theme = theme;
            }
            if let Some(font_size) = font_size {
                settings.font_size = font_size;
            }
            if let Some(max_history) = max_history {
                settings.max_history = max_history;
            }
            if let Some(auto_fold) = auto_fold_history {
                settings.auto_fold_history = auto_fold;
            }
            workspace.update_settings(settings)?;
            println!("{:#?}", workspace.settings());
            Ok(())
        }
        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(default_backup_file_name()));
            workspace.export_backup(&path)?;
            println!("Backup written to {}", path.display());
            Ok(())
        }
        Commands::Import { path } => {
            let backup = workspace.import_backup(&path)?;
            println!(
                "Imported: agents={} history={} settings={}",
                backup.agents.is_some(),
                backup.history.is_some(),
                backup.settings.is_some()
            );
            Ok(())
        }
        Commands::Run { .. } | Commands::Config { .. } => Ok(()),
    }
}

fn manage_agents(workspace: &mut Workspace, command: AgentCommands) -> FlowResult<()> {
    match command {
        AgentCommands::List => {
            for agent in workspace.agents() {
                println!(
                    "{}{:<38} {:<12} {} p{}",
                    if agent.is_pinned { "*" } else { " " },
                    agent.id,
                    agent.name,
                    agent.category,
                    agent.priority
                );
            }
        }
        AgentCommands::Show { id } => {
            let agent = workspace.agent(&id)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&agent)
                    .map_err(|e| FlowError::internal(e.to_string()))?
            );
        }
        AgentCommands::Add {
            name,
            role,
            instruction,
            category,
            priority,
        } => {
            let agent = Agent::new(name, role, instruction, category).with_priority(priority);
            let id = agent.id.clone();
            workspace.save_agent(agent)?;
            println!("Created agent {id}");
        }
        AgentCommands::Remove { id } => {
            let removed = workspace.delete_agent(&id)?;
            println!("Deleted agent {} ({})", removed.name, removed.id);
        }
        AgentCommands::Copy { id } => {
            let copy = workspace.copy_agent(&id)?;
            println!("Created {} ({})", copy.name, copy.id);
        }
        AgentCommands::Pin { id, off } => {
            workspace.set_agent_pinned(&id, !off)?;
        }
    }
    Ok(())
}

fn manage_history(workspace: &mut Workspace, command: HistoryCommands) -> FlowResult<()> {
    match command {
        HistoryCommands::List => {
            for task in workspace.history() {
                let agents: Vec<String> = task
                    .steps
                    .iter()
                    .map(|s| workspace.agent_display_name(&s.agent_id))
                    .collect();
                println!(
                    "{}  {}  {:<6} {}  [{}]",
                    task.id,
                    task.created_at.format("%Y-%m-%d %H:%M"),
                    task.status.label(),
                    task.title,
                    agents.join(" → ")
                );
            }
        }
        HistoryCommands::Show { id } => {
            let task = workspace.history_entry(&id)?;
            print_summary(workspace, &task);
        }
        HistoryCommands::Remove { id } => workspace.delete_history_entry(&id)?,
        HistoryCommands::Clear => workspace.clear_history()?,
    }
    Ok(())
}

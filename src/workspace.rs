//! Workspace: the owner of all persisted state
//!
//! Loads agents, history, settings and the activity log from a `Store`,
//! exposes the user-level operations on them, and wires a `TaskExecutor` to
//! the shared registry and history. Every mutating operation writes the
//! affected collections back immediately.

use crate::agent::{default_agents, Agent, AgentRegistry, SaveOutcome};
use crate::config::{AppConfig, Settings};
use crate::engine::{
    ExecutionReport, GenerationClient, PausedRun, RunControl, RunOutcome, StepRunner,
    TaskExecutor,
};
use crate::error::{FlowError, FlowResult};
use crate::history::{ActivityAction, ActivityLog, HistoryRecorder, LogEntry, TaskHistory};
use crate::progress::Progress;
use crate::storage::{
    load_json, save_json, Backup, StorageError, Store, AGENTS_KEY, HISTORY_KEY, LOGS_KEY,
    SETTINGS_KEY,
};
use crate::task::WorkflowTask;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Workspace {
    config: AppConfig,
    store: Arc<dyn Store>,
    registry: AgentRegistry,
    history: Arc<TaskHistory>,
    settings: Settings,
    activity: ActivityLog,
}

impl Workspace {
    /// Load every collection from the store, falling back to defaults for
    /// missing or unreadable documents
    pub fn open(config: AppConfig, store: Arc<dyn Store>) -> FlowResult<Self> {
        let agents = load_or_default(store.as_ref(), AGENTS_KEY).unwrap_or_else(default_agents);

        let settings = match load_or_default::<Settings>(store.as_ref(), SETTINGS_KEY) {
            Some(settings) if settings.validate().is_ok() => settings,
            Some(_) => {
                warn!("Stored settings are invalid; using configured settings");
                config.settings.clone()
            }
            None => config.settings.clone(),
        };

        let tasks: Vec<WorkflowTask> =
            load_or_default(store.as_ref(), HISTORY_KEY).unwrap_or_default();
        let entries: Vec<LogEntry> = load_or_default(store.as_ref(), LOGS_KEY).unwrap_or_default();

        info!(
            agents = agents.len(),
            history = tasks.len(),
            "Workspace opened"
        );

        Ok(Self {
            registry: AgentRegistry::from_agents(agents),
            history: Arc::new(TaskHistory::from_tasks(tasks, settings.max_history)),
            activity: ActivityLog::from_entries(entries, config.storage.max_log_entries),
            settings,
            config,
            store,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ---- agents ----

    pub fn agents(&self) -> Vec<Agent> {
        self.registry.list()
    }

    pub fn agent(&self, agent_id: &str) -> FlowResult<Agent> {
        self.registry
            .get(agent_id)
            .ok_or_else(|| FlowError::AgentNotFound(agent_id.to_string()))
    }

    pub fn save_agent(&mut self, agent: Agent) -> FlowResult<SaveOutcome> {
        let name = agent.name.clone();
        let outcome = self.registry.save(agent)?;
        let action = match outcome {
            SaveOutcome::Created => ActivityAction::AgentCreated,
            SaveOutcome::Updated => ActivityAction::AgentUpdated,
        };
        self.activity.add(action, format!("Agent: {name}"));
        self.persist_agents()?;
        self.persist_logs()?;
        Ok(outcome)
    }

    /// Remove an agent. History entries that reference it are kept as-is.
    pub fn delete_agent(&mut self, agent_id: &str) -> FlowResult<Agent> {
        let removed = self
            .registry
            .delete(agent_id)
            .ok_or_else(|| FlowError::AgentNotFound(agent_id.to_string()))?;
        self.activity
            .add(ActivityAction::AgentDeleted, format!("ID: {agent_id}"));
        self.persist_agents()?;
        self.persist_logs()?;
        Ok(removed)
    }

    pub fn copy_agent(&mut self, agent_id: &str) -> FlowResult<Agent> {
        let source = self.agent(agent_id)?;
        let copy = self
            .registry
            .duplicate(agent_id)
            .ok_or_else(|| FlowError::AgentNotFound(agent_id.to_string()))?;
        self.activity
            .add(ActivityAction::AgentCopied, format!("从: {}", source.name));
        self.persist_agents()?;
        self.persist_logs()?;
        Ok(copy)
    }

    pub fn set_agent_pinned(&mut self, agent_id: &str, pinned: bool) -> FlowResult<()> {
        if !self.registry.set_pinned(agent_id, pinned) {
            return Err(FlowError::AgentNotFound(agent_id.to_string()));
        }
        let name = self.agent(agent_id)?.name;
        self.activity
            .add(ActivityAction::AgentUpdated, format!("Agent: {name}"));
        self.persist_agents()?;
        self.persist_logs()
    }

    /// Name to show for an agent id; the raw id once the agent is gone
    pub fn agent_display_name(&self, agent_id: &str) -> String {
        self.registry
            .get(agent_id)
            .map(|agent| agent.name)
            .unwrap_or_else(|| agent_id.to_string())
    }

    // ---- tasks ----

    /// Build a task from a description and an ordered list of agent ids.
    /// Unknown ids are allowed; those steps are skipped at run time.
    pub fn build_task(
        &self,
        title: Option<String>,
        description: &str,
        agent_ids: Vec<String>,
    ) -> FlowResult<WorkflowTask> {
        if agent_ids.is_empty() {
            return Err(FlowError::invalid_input("select at least one agent"));
        }
        if description.trim().is_empty() {
            return Err(FlowError::invalid_input("task description must not be empty"));
        }
        Ok(WorkflowTask::new(title, description, agent_ids))
    }

    /// Executor sharing this workspace's registry and history
    pub fn executor(
        &self,
        client: Arc<dyn GenerationClient>,
        progress: Arc<dyn Progress>,
    ) -> TaskExecutor {
        let history: Arc<dyn HistoryRecorder> = self.history.clone();
        TaskExecutor::new(
            self.registry.clone(),
            StepRunner::new(client, self.config.llm.model.clone()),
            history,
            progress,
        )
    }

    pub async fn run_task(
        &mut self,
        executor: &TaskExecutor,
        task: WorkflowTask,
        control: &RunControl,
    ) -> FlowResult<RunOutcome> {
        executor.check(&task)?;
        self.activity.add(ActivityAction::TaskStarted, &task.title);
        let outcome = executor.execute(task, control).await?;
        self.after_run(&outcome)?;
        Ok(outcome)
    }

    pub async fn resume_task(
        &mut self,
        executor: &TaskExecutor,
        paused: PausedRun,
        control: &RunControl,
    ) -> FlowResult<RunOutcome> {
        let outcome = executor.resume(paused, control).await?;
        self.after_run(&outcome)?;
        Ok(outcome)
    }

    pub async fn abandon_task(
        &mut self,
        executor: &TaskExecutor,
        paused: PausedRun,
    ) -> FlowResult<ExecutionReport> {
        let report = executor.abandon(paused).await?;
        self.activity.add(ActivityAction::TaskStopped, "用户手动中断");
        self.persist_history()?;
        self.persist_logs()?;
        Ok(report)
    }

    fn after_run(&mut self, outcome: &RunOutcome) -> FlowResult<()> {
        if let RunOutcome::Finished(report) = outcome {
            if report.cancelled {
                self.activity.add(ActivityAction::TaskStopped, "用户手动中断");
            }
            self.persist_history()?;
        }
        self.persist_logs()
    }

    // ---- history ----

    /// Finished tasks, newest first
    pub fn history(&self) -> Vec<WorkflowTask> {
        self.history.list()
    }

    pub fn history_entry(&self, task_id: &str) -> FlowResult<WorkflowTask> {
        self.history
            .get(task_id)
            .ok_or_else(|| FlowError::TaskNotFound(task_id.to_string()))
    }

    pub fn delete_history_entry(&mut self, task_id: &str) -> FlowResult<()> {
        if !self.history.remove(task_id) {
            return Err(FlowError::TaskNotFound(task_id.to_string()));
        }
        self.activity
            .add(ActivityAction::HistoryEntryDeleted, format!("ID: {task_id}"));
        self.persist_history()?;
        self.persist_logs()
    }

    pub fn clear_history(&mut self) -> FlowResult<()> {
        self.history.clear();
        self.activity
            .add(ActivityAction::HistoryCleared, "历史记录已清空");
        self.persist_history()?;
        self.persist_logs()
    }

    pub fn activity_log(&self) -> Vec<LogEntry> {
        self.activity.entries()
    }

    // ---- settings ----

    /// Replace the settings; a lower `max_history` trims stored history at once
    pub fn update_settings(&mut self, settings: Settings) -> FlowResult<()> {
        settings.validate()?;
        let evicted = self.history.set_capacity(settings.max_history);
        if evicted > 0 {
            info!(evicted, "Trimmed history to new maximum");
        }
        self.settings = settings;
        self.activity
            .add(ActivityAction::SettingsUpdated, "设置已更新");
        self.persist_settings()?;
        self.persist_history()?;
        self.persist_logs()
    }

    // ---- backup ----

    /// Write agents, history and settings as one pretty-printed JSON file
    pub fn export_backup(&mut self, path: &Path) -> FlowResult<()> {
        let backup = Backup::full(self.agents(), self.history(), self.settings.clone());
        let json = backup.to_pretty_json()?;
        std::fs::write(path, json)
            .map_err(|e| StorageError::io(path.display().to_string(), e))?;

        info!(path = %path.display(), "Exported backup");
        self.activity.add(ActivityAction::DataExported, "完成系统备份");
        self.persist_logs()
    }

    /// Apply every section present in a backup file
    ///
    /// The file is parsed and validated completely before anything changes,
    /// so a malformed backup leaves the workspace untouched.
    pub fn import_backup(&mut self, path: &Path) -> FlowResult<Backup> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StorageError::io(path.display().to_string(), e))?;
        let backup = Backup::parse(&raw)?;

        if let Some(agents) = &backup.agents {
            for agent in agents {
                agent.validate()?;
            }
        }
        if let Some(settings) = &backup.settings {
            settings.validate()?;
        }

        if let Some(settings) = &backup.settings {
            self.settings = settings.clone();
            self.history.set_capacity(settings.max_history);
            self.persist_settings()?;
        }
        if let Some(agents) = &backup.agents {
            self.registry.replace_all(agents.clone());
            self.persist_agents()?;
        }
        if let Some(history) = &backup.history {
            self.history.replace_all(history.clone());
        }
        self.persist_history()?;

        info!(
            path = %path.display(),
            agents = backup.agents.is_some(),
            history = backup.history.is_some(),
            settings = backup.settings.is_some(),
            "Imported backup"
        );
        self.activity.add(ActivityAction::DataImported, "配置已恢复");
        self.persist_logs()?;
        Ok(backup)
    }

    // ---- persistence ----

    fn persist_agents(&self) -> FlowResult<()> {
        save_json(self.store.as_ref(), AGENTS_KEY, &self.registry.list())?;
        Ok(())
    }

    fn persist_history(&self) -> FlowResult<()> {
        save_json(self.store.as_ref(), HISTORY_KEY, &self.history.list())?;
        Ok(())
    }

    fn persist_settings(&self) -> FlowResult<()> {
        save_json(self.store.as_ref(), SETTINGS_KEY, &self.settings)?;
        Ok(())
    }

    fn persist_logs(&self) -> FlowResult<()> {
        save_json(self.store.as_ref(), LOGS_KEY, &self.activity.entries())?;
        Ok(())
    }
}

/// Decode a stored document; unreadable documents are logged and ignored
fn load_or_default<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    match load_json(store, key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key, error = %e, "Ignoring unreadable stored document");
            None
        }
    }
}

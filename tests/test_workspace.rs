//! Workspace persistence and lifecycle tests
//!
//! Drive the workspace against a real directory-backed store: runs are
//! persisted and survive a reopen, backups round-trip, and the activity log
//! tracks what the user did.

use agentflow::agent::{Agent, AgentCategory, SaveOutcome};
use agentflow::config::{AppConfig, Settings, Theme};
use agentflow::engine::{GenerationClient, GenerationError, RunControl, RunOutcome};
use agentflow::error::FlowError;
use agentflow::history::ActivityAction;
use agentflow::progress::NoOpProgress;
use agentflow::storage::{Backup, JsonFileStore, Store, AGENTS_KEY, HISTORY_KEY};
use agentflow::task::{StepStatus, TaskStatus};
use agentflow::testing::MockGenerationClient;
use agentflow::workspace::Workspace;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};

/// Notes when each generation call arrives
#[derive(Default)]
struct TimedClient {
    calls: Mutex<Vec<DateTime<Utc>>>,
}

#[async_trait]
impl GenerationClient for TimedClient {
    async fn generate(
        &self,
        _model: &str,
        _instruction: &str,
        _prompt: &str,
        _context: &str,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(Utc::now());
        Ok("out".to_string())
    }
}

fn open(dir: &Path) -> Workspace {
    let store = Arc::new(JsonFileStore::open(dir).unwrap());
    Workspace::open(AppConfig::default(), store).unwrap()
}

fn actions(ws: &Workspace) -> Vec<ActivityAction> {
    ws.activity_log().into_iter().map(|e| e.action).collect()
}

async fn run(ws: &mut Workspace, client: MockGenerationClient, agent_ids: &[&str]) -> RunOutcome {
    let executor = ws.executor(Arc::new(client), Arc::new(NoOpProgress));
    let task = ws
        .build_task(
            Some("Audit".to_string()),
            "Review X",
            agent_ids.iter().map(|id| id.to_string()).collect(),
        )
        .unwrap();
    ws.run_task(&executor, task, &RunControl::new()).await.unwrap()
}

#[tokio::test]
async fn test_finished_run_is_persisted_and_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());

    let outcome = run(
        &mut ws,
        MockGenerationClient::with_outputs(["audit notes", "design notes"]),
        &["agent-1", "agent-2"],
    )
    .await;
    assert_eq!(outcome.task().status, TaskStatus::Completed);

    let reopened = open(dir.path());
    let history = reopened.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].title, "Audit");
    assert_eq!(history[0].steps[1].output.as_deref(), Some("design notes"));
    assert_eq!(
        reopened.activity_log()[0].action,
        ActivityAction::TaskStarted
    );
}

#[tokio::test]
async fn test_failed_run_keeps_step_error_in_history() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());

    run(
        &mut ws,
        MockGenerationClient::scripted(vec![
            Ok("S1".to_string()),
            Err(GenerationError::new("rate limited")),
        ]),
        &["agent-1", "agent-2", "agent-3"],
    )
    .await;

    let entry = ws.history()[0].clone();
    assert_eq!(entry.status, TaskStatus::Failed);
    assert_eq!(entry.steps[1].error.as_deref(), Some("rate limited"));
    assert_eq!(entry.steps[2].status, StepStatus::Waiting);
    assert_eq!(ws.history_entry(&entry.id).unwrap(), entry);
}

#[tokio::test]
async fn test_cancelled_run_logs_manual_stop() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let control = RunControl::new();
    let client = MockGenerationClient::new().cancel_after(1, &control);

    let executor = ws.executor(Arc::new(client), Arc::new(NoOpProgress));
    let task = ws
        .build_task(None, "Review X", vec!["agent-1".into(), "agent-2".into()])
        .unwrap();
    let outcome = ws.run_task(&executor, task, &control).await.unwrap();

    assert_eq!(outcome.task().status, TaskStatus::Cancelled);
    assert_eq!(
        actions(&ws)[..2],
        [ActivityAction::TaskStopped, ActivityAction::TaskStarted]
    );
    assert_eq!(ws.activity_log()[0].detail, "用户手动中断");
    assert_eq!(ws.history().len(), 1);
}

#[tokio::test]
async fn test_paused_run_is_recorded_only_once_finished() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let control = RunControl::new();
    let client = MockGenerationClient::new().pause_after(1, &control);

    let executor = ws.executor(Arc::new(client), Arc::new(NoOpProgress));
    let task = ws
        .build_task(None, "Review X", vec!["agent-1".into(), "agent-2".into()])
        .unwrap();
    let paused = ws
        .run_task(&executor, task, &control)
        .await
        .unwrap()
        .into_paused()
        .unwrap();
    assert!(ws.history().is_empty());

    let report = ws
        .resume_task(&executor, paused, &control)
        .await
        .unwrap()
        .into_report()
        .unwrap();
    assert_eq!(report.task.status, TaskStatus::Completed);
    assert_eq!(open(dir.path()).history().len(), 1);
}

#[tokio::test]
async fn test_task_started_is_logged_before_first_step() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let client = Arc::new(TimedClient::default());

    let executor = ws.executor(client.clone(), Arc::new(NoOpProgress));
    let task = ws
        .build_task(Some("Audit".to_string()), "Review X", vec!["agent-1".into()])
        .unwrap();
    ws.run_task(&executor, task, &RunControl::new()).await.unwrap();

    let started = ws.activity_log()[0].clone();
    assert_eq!(started.action, ActivityAction::TaskStarted);
    assert_eq!(started.detail, "Audit");

    let calls = client.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert!(started.timestamp <= calls[0]);
}

#[tokio::test]
async fn test_run_refused_without_credentials_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let executor = ws.executor(
        Arc::new(MockGenerationClient::not_configured("missing key")),
        Arc::new(NoOpProgress),
    );
    let task = ws
        .build_task(None, "Review X", vec!["agent-1".into()])
        .unwrap();

    let result = ws.run_task(&executor, task, &RunControl::new()).await;

    assert!(matches!(result, Err(FlowError::Configuration { .. })));
    assert!(ws.history().is_empty());
    assert!(ws.activity_log().is_empty());
}

#[test]
fn test_agent_edits_are_persisted_and_logged() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());

    let agent = Agent::new("翻译官", "translator", "Translate to English", AgentCategory::Execution)
        .with_id("agent-t");
    assert_eq!(ws.save_agent(agent.clone()).unwrap(), SaveOutcome::Created);

    let mut renamed = agent.clone();
    renamed.name = "资深翻译官".to_string();
    assert_eq!(ws.save_agent(renamed).unwrap(), SaveOutcome::Updated);

    let copy = ws.copy_agent("agent-t").unwrap();
    assert_ne!(copy.id, "agent-t");
    ws.set_agent_pinned(&copy.id, true).unwrap();
    ws.delete_agent("agent-1").unwrap();

    let reopened = open(dir.path());
    assert!(reopened.agent("agent-1").is_err());
    assert_eq!(reopened.agent("agent-t").unwrap().name, "资深翻译官");
    assert!(reopened.agent(&copy.id).unwrap().is_pinned);

    assert_eq!(
        actions(&reopened),
        vec![
            ActivityAction::AgentDeleted,
            ActivityAction::AgentUpdated,
            ActivityAction::AgentCopied,
            ActivityAction::AgentUpdated,
            ActivityAction::AgentCreated,
        ]
    );
    assert_eq!(reopened.activity_log()[2].detail, "从: 资深翻译官");
}

#[test]
fn test_invalid_agent_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let agent = Agent::new("", "role", "instruction", AgentCategory::Analysis);

    assert!(matches!(
        ws.save_agent(agent),
        Err(FlowError::InvalidInput { .. })
    ));
    assert_eq!(ws.agents().len(), 3);
}

#[tokio::test]
async fn test_lowering_max_history_trims_immediately() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    for _ in 0..3 {
        run(&mut ws, MockGenerationClient::new(), &["agent-1"]).await;
    }
    let newest = ws.history()[0].id.clone();

    ws.update_settings(Settings {
        max_history: 1,
        theme: Theme::Dark,
        ..Settings::default()
    })
    .unwrap();

    let reopened = open(dir.path());
    assert_eq!(reopened.settings().max_history, 1);
    assert_eq!(reopened.settings().theme, Theme::Dark);
    let history = reopened.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, newest);
}

#[test]
fn test_zero_max_history_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let result = ws.update_settings(Settings {
        max_history: 0,
        ..Settings::default()
    });
    assert!(result.is_err());
    assert_eq!(ws.settings().max_history, 100);
}

#[tokio::test]
async fn test_history_delete_and_clear() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    run(&mut ws, MockGenerationClient::new(), &["agent-1"]).await;
    run(&mut ws, MockGenerationClient::new(), &["agent-2"]).await;

    let first = ws.history()[1].id.clone();
    ws.delete_history_entry(&first).unwrap();
    assert!(matches!(
        ws.delete_history_entry(&first),
        Err(FlowError::TaskNotFound(_))
    ));
    assert_eq!(ws.history().len(), 1);

    ws.clear_history().unwrap();
    assert!(open(dir.path()).history().is_empty());
    assert_eq!(actions(&ws)[0], ActivityAction::HistoryCleared);
}

#[tokio::test]
async fn test_backup_round_trip_into_fresh_workspace() {
    let source_dir = TempDir::new().unwrap();
    let mut source = open(source_dir.path());
    run(&mut source, MockGenerationClient::new(), &["agent-1", "agent-3"]).await;
    source.delete_agent("agent-2").unwrap();

    let backup_file = NamedTempFile::new().unwrap();
    source.export_backup(backup_file.path()).unwrap();
    assert_eq!(actions(&source)[0], ActivityAction::DataExported);

    let target_dir = TempDir::new().unwrap();
    let mut target = open(target_dir.path());
    let applied = target.import_backup(backup_file.path()).unwrap();

    assert!(applied.agents.is_some() && applied.history.is_some() && applied.settings.is_some());
    assert_eq!(target.agents(), source.agents());
    assert_eq!(target.history(), source.history());
    assert_eq!(actions(&target)[0], ActivityAction::DataImported);
    assert_eq!(open(target_dir.path()).agents().len(), 2);
}

#[test]
fn test_partial_backup_only_touches_present_sections() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let agents_before = ws.agents();

    let mut backup_file = NamedTempFile::new().unwrap();
    write!(backup_file, r#"{{"settings": {{"theme": "light", "max_history": 7}}}}"#).unwrap();

    let applied = ws.import_backup(backup_file.path()).unwrap();

    assert!(applied.agents.is_none());
    assert_eq!(ws.agents(), agents_before);
    assert_eq!(ws.settings().theme, Theme::Light);
    assert_eq!(ws.settings().max_history, 7);
}

#[test]
fn test_malformed_backup_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut ws = open(dir.path());
    let agents_before = ws.agents();

    let mut garbage = NamedTempFile::new().unwrap();
    write!(garbage, "{{\"agents\": [{{\"id\": 1}}").unwrap();
    assert!(matches!(
        ws.import_backup(garbage.path()),
        Err(FlowError::InvalidInput { .. })
    ));

    // well-formed JSON, but one agent fails validation
    let mut invalid_agent = Backup::default();
    let mut bad = Agent::new("bad", "role", "instruction", AgentCategory::Analysis);
    bad.priority = 9;
    invalid_agent.agents = Some(vec![bad]);
    invalid_agent.settings = Some(Settings {
        max_history: 3,
        ..Settings::default()
    });
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", invalid_agent.to_pretty_json().unwrap()).unwrap();
    assert!(ws.import_backup(file.path()).is_err());

    assert_eq!(ws.agents(), agents_before);
    assert_eq!(ws.settings().max_history, 100);
    assert!(ws.activity_log().is_empty());
}

#[test]
fn test_corrupt_stored_documents_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    store.write(AGENTS_KEY, "{not json").unwrap();
    store.write(HISTORY_KEY, "[1, 2, 3]").unwrap();

    let ws = open(dir.path());
    assert_eq!(ws.agents().len(), 3);
    assert!(ws.history().is_empty());
}

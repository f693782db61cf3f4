//! Task and step state
//!
//! A `WorkflowTask` is one run of an ordered agent pipeline. Its steps are
//! fixed at creation and only ever mutated in place by the executor through
//! the transition methods below, which keep `output` and `error` consistent
//! with `status`.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-step status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Waiting,
    Running,
    Completed,
    Failed,
    /// The run was paused right before this step
    Paused,
    /// The step's agent no longer exists in the registry
    Skipped,
}

impl StepStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Waiting => "等待中",
            StepStatus::Running => "执行中",
            StepStatus::Completed => "已完成",
            StepStatus::Failed => "失败",
            StepStatus::Paused => "暂停",
            StepStatus::Skipped => "已跳过",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Overall task status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Running => "执行中",
            TaskStatus::Paused => "暂停",
            TaskStatus::Completed => "已完成",
            TaskStatus::Failed => "失败",
            TaskStatus::Cancelled => "已终止",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One pipeline stage bound to one agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStep {
    pub id: String,
    /// Reference into the agent registry; may dangle
    pub agent_id: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStep {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            status: StepStatus::Waiting,
            output: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.set(StepStatus::Running, None, None);
    }

    pub fn complete(&mut self, output: String) {
        self.set(StepStatus::Completed, Some(output), None);
    }

    pub fn fail(&mut self, error: String) {
        self.set(StepStatus::Failed, None, Some(error));
    }

    pub fn skip(&mut self) {
        self.set(StepStatus::Skipped, None, None);
    }

    pub fn pause(&mut self) {
        self.set(StepStatus::Paused, None, None);
    }

    /// Back to Waiting (resume, or abandoning a paused run)
    pub fn reset(&mut self) {
        self.set(StepStatus::Waiting, None, None);
    }

    fn set(&mut self, status: StepStatus, output: Option<String>, error: Option<String>) {
        self.status = status;
        self.output = output;
        self.error = error;
    }
}

/// One execution of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowTask {
    pub id: String,
    pub title: String,
    /// The user's request; sent as the ask of every step
    pub description: String,
    /// Execution order; never reordered
    pub steps: Vec<TaskStep>,
    pub created_at: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WorkflowTask {
    /// Build a task with one Waiting step per agent id, in order
    pub fn new<I, S>(title: Option<String>, description: impl Into<String>, agent_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let created_at = Utc::now();
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default_title(created_at));

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: description.into(),
            steps: agent_ids.into_iter().map(TaskStep::new).collect(),
            created_at,
            status: TaskStatus::Running,
            tags: Vec::new(),
        }
    }

    pub fn step(&self, index: usize) -> Option<&TaskStep> {
        self.steps.get(index)
    }

    pub fn count_with_status(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    pub fn all_completed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }

    /// Share of Completed steps, rounded to a whole percent
    pub fn progress_percent(&self) -> u8 {
        if self.steps.is_empty() {
            return 0;
        }
        let completed = self.count_with_status(StepStatus::Completed) as f64;
        ((completed / self.steps.len() as f64) * 100.0).round() as u8
    }

    /// The first Failed step, if any
    pub fn failed_step(&self) -> Option<(usize, &TaskStep)> {
        self.steps
            .iter()
            .enumerate()
            .find(|(_, s)| s.status == StepStatus::Failed)
    }
}

fn default_title(created_at: DateTime<Utc>) -> String {
    format!(
        "新任务 {}",
        created_at.with_timezone(&Local).format("%H:%M:%S")
    )
}

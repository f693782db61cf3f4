//! Run progress notifications
//!
//! The executor reports every task and step transition through the `Progress`
//! trait. Each step transition produces exactly one `report_step_update`
//! carrying a full snapshot of the task, so a consumer can render the current
//! state without tracking history itself.

use crate::task::WorkflowTask;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: ProgressEventType,
    /// Index of the step that changed, for step and pause events
    pub step_index: Option<usize>,
    pub message: String,
    /// Task state right after the transition
    pub snapshot: WorkflowTask,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProgressEventType {
    TaskStart,
    StepUpdate,
    TaskPaused,
    TaskFinished,
}

impl ProgressMessage {
    pub fn new(task: &WorkflowTask, event_type: ProgressEventType, message: String) -> Self {
        Self {
            task_id: task.id.clone(),
            timestamp: Utc::now(),
            event_type,
            step_index: None,
            message,
            snapshot: task.clone(),
        }
    }

    pub fn with_step(mut self, step_index: usize) -> Self {
        self.step_index = Some(step_index);
        self
    }

    /// Build the message for a step transition
    pub fn step_update(task: &WorkflowTask, step_index: usize) -> Self {
        let status = task
            .step(step_index)
            .map(|step| step.status.label())
            .unwrap_or("?");
        Self::new(
            task,
            ProgressEventType::StepUpdate,
            format!("[{}/{}] {}", step_index + 1, task.steps.len(), status),
        )
        .with_step(step_index)
    }
}

#[async_trait]
pub trait Progress: Send + Sync {
    async fn report_task_start(&self, task: &WorkflowTask);

    /// One call per step transition
    async fn report_step_update(&self, task: &WorkflowTask, step_index: usize);

    async fn report_task_paused(&self, task: &WorkflowTask, step_index: usize);

    async fn report_task_finished(&self, task: &WorkflowTask, cancelled: bool);
}

pub struct NoOpProgress;

#[async_trait]
impl Progress for NoOpProgress {
    async fn report_task_start(&self, _task: &WorkflowTask) {}
    async fn report_step_update(&self, _task: &WorkflowTask, _step_index: usize) {}
    async fn report_task_paused(&self, _task: &WorkflowTask, _step_index: usize) {}
    async fn report_task_finished(&self, _task: &WorkflowTask, _cancelled: bool) {}
}

/// Forwards every notification over an unbounded channel
///
/// Sending never waits for the consumer. A dropped receiver is not an error;
/// the run carries on and the notification is discarded.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressMessage>,
}

impl ChannelProgress {
    pub fn new(sender: mpsc::UnboundedSender<ProgressMessage>) -> Self {
        Self { sender }
    }

    /// Convenience constructor returning the receiving half as well
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    fn send(&self, message: ProgressMessage) {
        if self.sender.send(message).is_err() {
            debug!("Progress receiver dropped; discarding notification");
        }
    }
}

#[async_trait]
impl Progress for ChannelProgress {
    async fn report_task_start(&self, task: &WorkflowTask) {
        self.send(ProgressMessage::new(
            task,
            ProgressEventType::TaskStart,
            format!("{} ({} steps)", task.title, task.steps.len()),
        ));
    }

    async fn report_step_update(&self, task: &WorkflowTask, step_index: usize) {
        self.send(ProgressMessage::step_update(task, step_index));
    }

    async fn report_task_paused(&self, task: &WorkflowTask, step_index: usize) {
        self.send(
            ProgressMessage::new(
                task,
                ProgressEventType::TaskPaused,
                format!("paused before step {}", step_index + 1),
            )
            .with_step(step_index),
        );
    }

    async fn report_task_finished(&self, task: &WorkflowTask, cancelled: bool) {
        let message = if cancelled {
            format!("{} (stopped)", task.status.label())
        } else {
            task.status.label().to_string()
        };
        self.send(ProgressMessage::new(
            task,
            ProgressEventType::TaskFinished,
            message,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::StepStatus;

    fn task() -> WorkflowTask {
        WorkflowTask::new(Some("Review".to_string()), "Review X", ["a", "b"])
    }

    #[test]
    fn test_step_update_message() {
        let mut task = task();
        task.steps[1].mark_running();

        let msg = ProgressMessage::step_update(&task, 1);
        assert_eq!(msg.event_type, ProgressEventType::StepUpdate);
        assert_eq!(msg.step_index, Some(1));
        assert_eq!(msg.message, "[2/2] 执行中");
        assert_eq!(msg.snapshot.steps[1].status, StepStatus::Running);
        assert_eq!(msg.task_id, task.id);
    }

    #[tokio::test]
    async fn test_channel_progress_forwards_in_order() {
        let (progress, mut receiver) = ChannelProgress::channel();
        let task = task();

        progress.report_task_start(&task).await;
        progress.report_step_update(&task, 0).await;
        progress.report_task_finished(&task, false).await;

        let events: Vec<_> = std::iter::from_fn(|| receiver.try_recv().ok())
            .map(|m| m.event_type)
            .collect();
        assert_eq!(
            events,
            vec![
                ProgressEventType::TaskStart,
                ProgressEventType::StepUpdate,
                ProgressEventType::TaskFinished
            ]
        );
    }

    #[tokio::test]
    async fn test_channel_progress_tolerates_dropped_receiver() {
        let (progress, receiver) = ChannelProgress::channel();
        drop(receiver);
        progress.report_step_update(&task(), 0).await;
    }

    #[tokio::test]
    async fn test_noop_progress() {
        let progress = NoOpProgress;
        progress.report_task_paused(&task(), 0).await;
    }
}

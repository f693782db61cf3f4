//! Mock implementations for testing
//!
//! Provides mock LlmProvider, GenerationClient, and Progress implementations
//! so the engine can be exercised without network access.

use crate::engine::control::RunControl;
use crate::engine::generation::{GenerationClient, GenerationError};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use crate::progress::{Progress, ProgressEventType};
use crate::task::{StepStatus, TaskStatus, WorkflowTask};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock LLM provider for testing
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    pub responses: Vec<String>,
    pub current_response: Arc<Mutex<usize>>,
    pub should_fail: bool,
    pub received_requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            ..Default::default()
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Requests received so far, in order
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.received_requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.received_requests.lock().await.push(request);

        if self.should_fail {
            return Err(LlmError::RequestFailed("Mock LLM failure".to_string()));
        }

        let mut current = self.current_response.lock().await;
        let response_idx = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            self.responses[response_idx].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
            metadata: HashMap::new(),
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.should_fail {
            Err(LlmError::RequestFailed(
                "Mock health check failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// One call seen by `MockGenerationClient`
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    pub model: String,
    pub instruction: String,
    pub prompt: String,
    pub context: String,
}

/// What the hook does once its call has returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Cancel,
    Pause,
}

/// Scripted generation client
///
/// Results are consumed in call order; once the script runs out every call
/// returns "Mock output". A hook can cancel or pause a `RunControl` right
/// after the n-th call (1-based), which lands deterministically at the next
/// step boundary.
#[derive(Debug, Default)]
pub struct MockGenerationClient {
    script: Mutex<Vec<Result<String, GenerationError>>>,
    calls: Mutex<Vec<GenerationCall>>,
    not_ready: Option<String>,
    hook: Option<(usize, ControlAction, RunControl)>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call succeeds with the given outputs, in order
    pub fn with_outputs<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(outputs.into_iter().map(|o| Ok(o.into())).collect())
    }

    pub fn scripted(results: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(results),
            ..Default::default()
        }
    }

    /// A client whose `check_ready` fails (missing credential)
    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self {
            not_ready: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Cancel `control` after the `call`-th generation call returns
    pub fn cancel_after(mut self, call: usize, control: &RunControl) -> Self {
        self.hook = Some((call, ControlAction::Cancel, control.clone()));
        self
    }

    /// Request a pause on `control` after the `call`-th generation call returns
    pub fn pause_after(mut self, call: usize, control: &RunControl) -> Self {
        self.hook = Some((call, ControlAction::Pause, control.clone()));
        self
    }

    pub async fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    fn check_ready(&self) -> Result<(), GenerationError> {
        match &self.not_ready {
            Some(reason) => Err(GenerationError::new(reason.clone())),
            None => Ok(()),
        }
    }

    async fn generate(
        &self,
        model: &str,
        instruction: &str,
        prompt: &str,
        context: &str,
    ) -> Result<String, GenerationError> {
        let call_number = {
            let mut calls = self.calls.lock().await;
            calls.push(GenerationCall {
                model: model.to_string(),
                instruction: instruction.to_string(),
                prompt: prompt.to_string(),
                context: context.to_string(),
            });
            calls.len()
        };

        let result = {
            let mut script = self.script.lock().await;
            if script.is_empty() {
                Ok("Mock output".to_string())
            } else {
                script.remove(0)
            }
        };

        if let Some((after, action, control)) = &self.hook {
            if *after == call_number {
                match action {
                    ControlAction::Cancel => control.cancel(),
                    ControlAction::Pause => control.request_pause(),
                }
            }
        }

        result
    }
}

/// One notification seen by `RecordingProgress`
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub event_type: ProgressEventType,
    pub step_index: Option<usize>,
    pub step_status: Option<StepStatus>,
    pub task_status: TaskStatus,
    pub snapshot: WorkflowTask,
}

/// Progress sink that keeps every notification for later assertions
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().await.clone()
    }

    /// `(step_index, status)` for every step update, in order
    pub async fn step_transitions(&self) -> Vec<(usize, StepStatus)> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.event_type == ProgressEventType::StepUpdate)
            .filter_map(|e| Some((e.step_index?, e.step_status?)))
            .collect()
    }

    async fn push(&self, event_type: ProgressEventType, task: &WorkflowTask, step: Option<usize>) {
        self.events.lock().await.push(RecordedEvent {
            event_type,
            step_index: step,
            step_status: step.and_then(|i| task.step(i)).map(|s| s.status),
            task_status: task.status,
            snapshot: task.clone(),
        });
    }
}

#[async_trait]
impl Progress for RecordingProgress {
    async fn report_task_start(&self, task: &WorkflowTask) {
        self.push(ProgressEventType::TaskStart, task, None).await;
    }

    async fn report_step_update(&self, task: &WorkflowTask, step_index: usize) {
        self.push(ProgressEventType::StepUpdate, task, Some(step_index))
            .await;
    }

    async fn report_task_paused(&self, task: &WorkflowTask, step_index: usize) {
        self.push(ProgressEventType::TaskPaused, task, Some(step_index))
            .await;
    }

    async fn report_task_finished(&self, task: &WorkflowTask, _cancelled: bool) {
        self.push(ProgressEventType::TaskFinished, task, None).await;
    }
}

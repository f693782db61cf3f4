//! Task executor
//!
//! Drives a `WorkflowTask` through its steps strictly in order. Each
//! completed step's output is appended to a per-run context string that
//! every later step receives. A failed step halts the pipeline; a step whose
//! agent no longer exists is skipped. Cancellation and pause requests are
//! honoured between steps only.

use crate::agent::{Agent, AgentRegistry};
use crate::engine::control::RunControl;
use crate::engine::step_runner::StepRunner;
use crate::error::{FlowError, FlowResult};
use crate::history::HistoryRecorder;
use crate::progress::Progress;
use crate::task::{StepStatus, TaskStatus, WorkflowTask};
use crate::{step_span, task_span};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Block appended to the run context after a step completes
pub fn context_block(agent_name: &str, output: &str) -> String {
    format!("\n\n[{agent_name}输出]:\n{output}")
}

/// A run that reached a terminal state and was recorded to history
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub task: WorkflowTask,
    /// True when the run was stopped by the user rather than by completion
    /// or a step failure
    pub cancelled: bool,
}

/// A run stopped on a pause request, resumable with `TaskExecutor::resume`
#[derive(Debug, Clone, PartialEq)]
pub struct PausedRun {
    pub task: WorkflowTask,
    /// Index of the step marked Paused
    pub next_step: usize,
    /// Context accumulated from the steps completed so far
    pub context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Finished(ExecutionReport),
    Paused(PausedRun),
}

impl RunOutcome {
    pub fn task(&self) -> &WorkflowTask {
        match self {
            RunOutcome::Finished(report) => &report.task,
            RunOutcome::Paused(paused) => &paused.task,
        }
    }

    pub fn into_report(self) -> Option<ExecutionReport> {
        match self {
            RunOutcome::Finished(report) => Some(report),
            RunOutcome::Paused(_) => None,
        }
    }

    pub fn into_paused(self) -> Option<PausedRun> {
        match self {
            RunOutcome::Paused(paused) => Some(paused),
            RunOutcome::Finished(_) => None,
        }
    }
}

/// Executes pipelines against a registry, recording finished runs
pub struct TaskExecutor {
    registry: AgentRegistry,
    runner: StepRunner,
    history: Arc<dyn HistoryRecorder>,
    progress: Arc<dyn Progress>,
}

impl TaskExecutor {
    pub fn new(
        registry: AgentRegistry,
        runner: StepRunner,
        history: Arc<dyn HistoryRecorder>,
        progress: Arc<dyn Progress>,
    ) -> Self {
        Self {
            registry,
            runner,
            history,
            progress,
        }
    }

    /// Run a freshly built task from its first step
    ///
    /// Returns `Err` only when the run cannot start at all; in that case no
    /// step changes state and nothing is recorded. Step failures are recorded
    /// on the step and reported through `Ok`.
    pub async fn execute(
        &self,
        mut task: WorkflowTask,
        control: &RunControl,
    ) -> FlowResult<RunOutcome> {
        self.ensure_runnable(&task)?;

        task.status = TaskStatus::Running;
        info!(
            task_id = %task.id,
            title = %task.title,
            steps = task.steps.len(),
            model = %self.runner.model(),
            "Starting task"
        );
        self.progress.report_task_start(&task).await;

        Ok(self.drive(task, 0, String::new(), control).await)
    }

    /// Continue a paused run from the step it stopped at
    pub async fn resume(&self, paused: PausedRun, control: &RunControl) -> FlowResult<RunOutcome> {
        Self::check_paused(&paused)?;
        self.ensure_runnable(&paused.task)?;

        let PausedRun {
            mut task,
            next_step,
            context,
        } = paused;

        task.steps[next_step].reset();
        task.status = TaskStatus::Running;
        info!(task_id = %task.id, step = next_step, "Resuming task");
        self.progress.report_step_update(&task, next_step).await;

        Ok(self.drive(task, next_step, context, control).await)
    }

    /// Give up on a paused run: it is finished as Cancelled and recorded
    pub async fn abandon(&self, paused: PausedRun) -> FlowResult<ExecutionReport> {
        Self::check_paused(&paused)?;

        let PausedRun {
            mut task,
            next_step,
            ..
        } = paused;

        task.steps[next_step].reset();
        self.progress.report_step_update(&task, next_step).await;
        info!(task_id = %task.id, step = next_step, "Abandoning paused task");

        Ok(self.finish(task, true).await)
    }

    /// Fail-fast checks `execute` runs before touching any step
    pub fn check(&self, task: &WorkflowTask) -> FlowResult<()> {
        self.ensure_runnable(task)
    }

    fn ensure_runnable(&self, task: &WorkflowTask) -> FlowResult<()> {
        self.runner
            .check_ready()
            .map_err(|e| FlowError::configuration(e.message))?;

        if task.description.trim().is_empty() {
            return Err(FlowError::invalid_input("task description must not be empty"));
        }
        if task.steps.is_empty() {
            return Err(FlowError::invalid_input(
                "task must contain at least one step",
            ));
        }
        Ok(())
    }

    fn check_paused(paused: &PausedRun) -> FlowResult<()> {
        match paused.task.step(paused.next_step) {
            Some(step) if step.status == StepStatus::Paused => Ok(()),
            _ => Err(FlowError::invalid_input(format!(
                "task {} is not paused at step {}",
                paused.task.id, paused.next_step
            ))),
        }
    }

    async fn drive(
        &self,
        task: WorkflowTask,
        start: usize,
        context: String,
        control: &RunControl,
    ) -> RunOutcome {
        let span = task_span!(task_id = %task.id, steps = task.steps.len());
        self.drive_steps(task, start, context, control)
            .instrument(span)
            .await
    }

    async fn drive_steps(
        &self,
        mut task: WorkflowTask,
        start: usize,
        mut context: String,
        control: &RunControl,
    ) -> RunOutcome {
        let mut cancelled = false;

        for index in start..task.steps.len() {
            if control.is_cancelled() {
                info!(step = index, "Task stopped by user before step");
                cancelled = true;
                break;
            }

            if control.take_pause_request() {
                task.steps[index].pause();
                task.status = TaskStatus::Paused;
                info!(step = index, "Task paused before step");
                self.progress.report_step_update(&task, index).await;
                self.progress.report_task_paused(&task, index).await;
                return RunOutcome::Paused(PausedRun {
                    task,
                    next_step: index,
                    context,
                });
            }

            let agent_id = task.steps[index].agent_id.clone();
            let Some(agent) = self.registry.get(&agent_id) else {
                warn!(step = index, agent_id = %agent_id, "Agent not found; skipping step");
                task.steps[index].skip();
                self.progress.report_step_update(&task, index).await;
                continue;
            };

            let span = step_span!(step = index, agent_id = %agent.id, agent = %agent.name);
            let succeeded = self
                .run_step(&mut task, index, &agent, &mut context)
                .instrument(span)
                .await;
            if !succeeded {
                break;
            }
        }

        RunOutcome::Finished(self.finish(task, cancelled).await)
    }

    /// Returns false when the step failed and the pipeline must halt
    async fn run_step(
        &self,
        task: &mut WorkflowTask,
        index: usize,
        agent: &Agent,
        context: &mut String,
    ) -> bool {
        task.steps[index].mark_running();
        debug!("Step started");
        self.progress.report_step_update(task, index).await;

        let result = self
            .runner
            .run_step(agent, &task.description, context)
            .await;

        match result {
            Ok(output) => {
                context.push_str(&context_block(&agent.name, &output));
                info!(output_len = output.len(), "Step completed");
                task.steps[index].complete(output);
                self.progress.report_step_update(task, index).await;
                true
            }
            Err(e) => {
                warn!(error = %e, "Step failed; halting pipeline");
                task.steps[index].fail(e.message);
                self.progress.report_step_update(task, index).await;
                false
            }
        }
    }

    async fn finish(&self, mut task: WorkflowTask, cancelled: bool) -> ExecutionReport {
        task.status = if cancelled {
            TaskStatus::Cancelled
        } else if task.all_completed() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };

        info!(
            task_id = %task.id,
            status = ?task.status,
            completed = task.count_with_status(StepStatus::Completed),
            failed = task.count_with_status(StepStatus::Failed),
            skipped = task.count_with_status(StepStatus::Skipped),
            "Task finished"
        );

        self.history.record(task.clone());
        self.progress.report_task_finished(&task, cancelled).await;

        ExecutionReport { task, cancelled }
    }
}

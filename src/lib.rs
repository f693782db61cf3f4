//! agentflow - sequential multi-agent LLM pipelines
//!
//! Users define named agents (reusable instruction profiles), compose an
//! ordered list of agent references into a task, and run the task step by
//! step. Each step sends the agent's instruction, the task description, and
//! everything earlier steps produced to a text-generation backend.
//!
//! # Overview
//!
//! - [`agent`]: agent definitions and the in-memory registry
//! - [`task`]: workflow tasks and per-step state
//! - [`engine`]: the executor, step runner, and generation boundary
//! - [`llm`]: Gemini and OpenAI providers behind one trait
//! - [`history`]: bounded task history and activity log
//! - [`storage`]: keyed JSON persistence and backups
//! - [`workspace`]: ties the above together for a front end
//!
//! # Quick Start
//!
//! ```rust
//! use agentflow::agent::AgentRegistry;
//! use agentflow::engine::{RunControl, StepRunner, TaskExecutor};
//! use agentflow::history::TaskHistory;
//! use agentflow::progress::NoOpProgress;
//! use agentflow::task::{TaskStatus, WorkflowTask};
//! use agentflow::testing::MockGenerationClient;
//! use std::sync::Arc;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let client = Arc::new(MockGenerationClient::with_outputs(["looks fine"]));
//!     let executor = TaskExecutor::new(
//!         AgentRegistry::with_defaults(),
//!         StepRunner::new(client, "gemini-3-flash-preview"),
//!         Arc::new(TaskHistory::new(100)),
//!         Arc::new(NoOpProgress),
//!     );
//!
//!     let task = WorkflowTask::new(None, "Review X", ["agent-1"]);
//!     let outcome = executor.execute(task, &RunControl::new()).await.unwrap();
//!     assert_eq!(outcome.task().status, TaskStatus::Completed);
//! });
//! ```

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod llm;
pub mod observability;
pub mod progress;
pub mod storage;
pub mod task;
pub mod testing;
pub mod workspace;

pub use agent::{Agent, AgentCategory, AgentRegistry};
pub use config::*;
pub use engine::{
    ExecutionReport, GenerationClient, GenerationError, PausedRun, RunControl, RunOutcome,
    StepRunner, TaskExecutor,
};
pub use error::{FlowError, FlowResult};
pub use progress::{ChannelProgress, NoOpProgress, Progress, ProgressEventType, ProgressMessage};
pub use task::{StepStatus, TaskStatus, TaskStep, WorkflowTask};
pub use workspace::Workspace;

//! Task execution engine
//!
//! `TaskExecutor` owns the ordered drive loop, `StepRunner` performs the one
//! generation call per step, and `GenerationClient` is the boundary to the
//! text-generation backend.

pub mod control;
pub mod executor;
pub mod generation;
pub mod step_runner;

pub use control::RunControl;
pub use executor::{context_block, ExecutionReport, PausedRun, RunOutcome, TaskExecutor};
pub use generation::{
    build_prompt, GenerationClient, GenerationError, ProviderGenerationClient, SamplingParams,
};
pub use step_runner::{StepRunner, EMPTY_OUTPUT};

//! Single-step execution

use crate::agent::Agent;
use crate::engine::generation::{GenerationClient, GenerationError};
use std::sync::Arc;
use tracing::debug;

/// Output recorded when the model returns nothing but whitespace
pub const EMPTY_OUTPUT: &str = "无输出结果";

/// Runs one agent against the task description and the context so far
#[derive(Clone)]
pub struct StepRunner {
    client: Arc<dyn GenerationClient>,
    model: String,
}

impl StepRunner {
    pub fn new(client: Arc<dyn GenerationClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn check_ready(&self) -> Result<(), GenerationError> {
        self.client.check_ready()
    }

    /// Exactly one generation call. Errors are passed through untouched.
    pub async fn run_step(
        &self,
        agent: &Agent,
        task_description: &str,
        context: &str,
    ) -> Result<String, GenerationError> {
        debug!(
            agent_id = %agent.id,
            model = %self.model,
            context_len = context.len(),
            "Invoking generation"
        );

        let output = self
            .client
            .generate(&self.model, &agent.instruction, task_description, context)
            .await?;

        // Whitespace is real output and is kept as returned
        if output.is_empty() {
            Ok(EMPTY_OUTPUT.to_string())
        } else {
            Ok(output)
        }
    }
}

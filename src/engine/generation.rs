//! Text-generation boundary
//!
//! The engine only needs "instruction + prompt + context in, text out". The
//! `GenerationClient` trait is that seam; `ProviderGenerationClient` fills it
//! with a configured `LlmProvider`.

use crate::config::{AppConfig, ConfigError, LlmSection};
use crate::llm::provider::{CompletionRequest, LlmError, LlmProvider};
use crate::llm::providers::LlmProviderFactory;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// A failed generation call. The message is shown to the user verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Keeps only the message the provider reported; the variant is for logs
impl From<LlmError> for GenerationError {
    fn from(error: LlmError) -> Self {
        Self::new(error.message())
    }
}

/// External text generation used by every pipeline step
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Whether a call could succeed at all (e.g. a credential is present)
    fn check_ready(&self) -> Result<(), GenerationError> {
        Ok(())
    }

    async fn generate(
        &self,
        model: &str,
        instruction: &str,
        prompt: &str,
        context: &str,
    ) -> Result<String, GenerationError>;
}

/// Combine the three prompt segments into the single message that is sent
pub fn build_prompt(instruction: &str, context: &str, prompt: &str) -> String {
    format!("角色设定: {instruction}\n前序上下文: {context}\n\n当前任务需求: {prompt}")
}

/// Sampling parameters applied to every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::from(&LlmSection::default())
    }
}

impl From<&LlmSection> for SamplingParams {
    fn from(llm: &LlmSection) -> Self {
        Self {
            temperature: llm.temperature,
            top_p: llm.top_p,
            max_tokens: llm.max_tokens,
        }
    }
}

/// `GenerationClient` backed by an `LlmProvider`
pub struct ProviderGenerationClient {
    provider: Result<Arc<dyn LlmProvider>, String>,
    sampling: SamplingParams,
}

impl ProviderGenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, sampling: SamplingParams) -> Self {
        Self {
            provider: Ok(provider),
            sampling,
        }
    }

    /// A client that reports `reason` from `check_ready` and from every call
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            provider: Err(reason.into()),
            sampling: SamplingParams::default(),
        }
    }

    /// Build the configured provider. A missing API key does not fail here;
    /// it yields an unconfigured client so runs are refused before any step.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let sampling = SamplingParams::from(&config.llm);
        match LlmProviderFactory::create_provider(config) {
            Ok(provider) => Ok(Self::new(provider, sampling)),
            Err(ConfigError::EnvVarNotFound(var)) => {
                warn!(env = %var, "LLM API key not set; runs will be refused");
                Ok(Self::unconfigured(missing_key_message(&var)))
            }
            Err(e) => Err(e),
        }
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().ok().map(|p| p.name())
    }
}

fn missing_key_message(var: &str) -> String {
    format!("未检测到 {var} 环境变量，请确保环境配置正确。")
}

#[async_trait]
impl GenerationClient for ProviderGenerationClient {
    fn check_ready(&self) -> Result<(), GenerationError> {
        self.provider
            .as_ref()
            .map(|_| ())
            .map_err(|reason| GenerationError::new(reason.clone()))
    }

    async fn generate(
        &self,
        model: &str,
        instruction: &str,
        prompt: &str,
        context: &str,
    ) -> Result<String, GenerationError> {
        let provider = self
            .provider
            .as_ref()
            .map_err(|reason| GenerationError::new(reason.clone()))?;

        let mut request =
            CompletionRequest::single_prompt(model, build_prompt(instruction, context, prompt));
        request.temperature = Some(self.sampling.temperature);
        request.top_p = Some(self.sampling.top_p);
        request.max_tokens = Some(self.sampling.max_tokens);

        let response = provider.complete(request).await.map_err(|e| {
            warn!(provider = provider.name(), error = %e, "Generation failed");
            GenerationError::from(e)
        })?;
        debug!(
            provider = provider.name(),
            total_tokens = response.usage.total_tokens,
            "Generation finished"
        );
        Ok(response.content.unwrap_or_default())
    }
}

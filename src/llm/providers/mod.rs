//! LLM provider implementations
//!
//! This module contains concrete implementations of the LlmProvider trait
//! for different LLM services, plus the factory that picks one from
//! configuration.

pub mod gemini;
pub mod openai;

pub use gemini::*;
pub use openai::*;

use crate::config::{AppConfig, ConfigError};
use crate::llm::provider::LlmProvider;
use std::sync::Arc;

/// Provider factory for creating LLM providers from configuration
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Build the configured provider, resolving the API key from the environment
    pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        let api_key = config.get_llm_api_key()?;
        let timeout = config.llm_timeout();

        match config.llm.provider.as_str() {
            "gemini" => {
                let mut gemini_config = GeminiConfig {
                    api_key,
                    timeout,
                    ..Default::default()
                };
                if let Some(base_url) = &config.llm.base_url {
                    gemini_config.base_url = base_url.clone();
                }
                let provider = GeminiProvider::new(gemini_config)
                    .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
                Ok(Arc::new(provider))
            }
            "openai" => {
                let mut openai_config = OpenAiConfig {
                    api_key,
                    timeout,
                    ..Default::default()
                };
                if let Some(base_url) = &config.llm.base_url {
                    openai_config.base_url = base_url.clone();
                }
                let provider = OpenAiProvider::new(openai_config)
                    .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
                Ok(Arc::new(provider))
            }
            provider => Err(ConfigError::UnsupportedProvider(provider.to_string())),
        }
    }
}

//! LLM provider abstraction layer
//!
//! This module provides a provider-agnostic interface for LLM interactions
//! with support for multiple providers (Gemini, OpenAI).

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;

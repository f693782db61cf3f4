//! Testing utilities and mock implementations
//!
//! Mocks for the generation boundary, LLM providers and progress reporting,
//! so pipelines can be run deterministically without network access.

pub mod mocks;

pub use mocks::*;

//! Agent definitions and the in-memory agent registry
//!
//! Agents are reusable instruction profiles. The execution engine only ever
//! looks them up by id; creation, editing and deletion belong to the registry
//! owner.

pub mod model;
pub mod registry;

pub use model::*;
pub use registry::*;

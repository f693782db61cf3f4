//! Workflow tasks and their pipeline steps

pub mod model;

pub use model::*;

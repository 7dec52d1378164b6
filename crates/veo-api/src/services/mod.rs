//! Business logic services.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorSettings};

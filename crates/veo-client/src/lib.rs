//! Client for the Gemini Veo3 video generation API.
//!
//! This crate provides:
//! - `VeoClient`, a REST client for Veo long-running generation operations
//! - The `VideoGenerator` trait the orchestrator drives
//! - `SimulatedGenerator` for local development without upstream access

pub mod client;
pub mod error;
pub mod generator;
pub mod simulated;
pub mod types;

pub use client::{VeoClient, VeoConfig};
pub use error::{ClientError, ClientResult};
pub use generator::{GeneratedVideo, GenerationJob, OperationHandle, OperationState, VideoGenerator};
pub use simulated::SimulatedGenerator;

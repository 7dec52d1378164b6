//! Shared data models for the Veo generation gateway.
//!
//! This crate provides Serde-serializable types for:
//! - Generation tasks and their lifecycle status
//! - Video request parameters and intake validation
//! - Prompt enhancement for the Veo3 model

pub mod error;
pub mod prompt;
pub mod request;
pub mod task;

pub use error::{TransitionError, ValidationError};
pub use prompt::enhance_prompt;
pub use request::{
    AspectRatio, GenerationLimits, Quality, Resolution, VideoFormat, VideoGenerationRequest,
    VideoSpec,
};
pub use task::{Task, TaskId, TaskStatus, TaskUpdate};

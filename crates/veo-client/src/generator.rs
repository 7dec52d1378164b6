//! Video generator abstraction.

use async_trait::async_trait;
use veo_models::{enhance_prompt, VideoSpec};

use crate::error::ClientResult;

/// A generation request ready for the upstream model.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    /// Enhanced prompt text
    pub prompt: String,
    pub spec: VideoSpec,
}

impl GenerationJob {
    pub fn from_spec(spec: &VideoSpec) -> Self {
        Self {
            prompt: enhance_prompt(spec),
            spec: spec.clone(),
        }
    }
}

/// Reference to an upstream long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub name: String,
}

/// A finished video as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub uri: String,
    pub mime_type: Option<String>,
    /// Preview image, when the backend produces one
    pub thumbnail_uri: Option<String>,
}

/// Result of polling an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Done(GeneratedVideo),
    /// Operation finished with an error; the message is the provider's.
    Failed(String),
}

/// Backend that turns prompts into videos.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Submit a generation and return the operation to poll.
    async fn start(&self, job: &GenerationJob) -> ClientResult<OperationHandle>;

    /// Check an operation once.
    async fn poll(&self, operation: &OperationHandle) -> ClientResult<OperationState>;

    /// Fetch the bytes of a generated video.
    async fn download(&self, video: &GeneratedVideo) -> ClientResult<Vec<u8>>;

    /// Forget an operation nobody will poll again.
    async fn release(&self, _operation: &OperationHandle) {}
}

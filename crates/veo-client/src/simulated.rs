//! Simulated generator for local development.
//!
//! Completes every operation after a fixed delay with a placeholder URL in
//! the shape Veo delivers to Google Cloud Storage.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::generator::{GeneratedVideo, GenerationJob, OperationHandle, OperationState, VideoGenerator};

const OPERATION_PREFIX: &str = "simulated/operations/";

pub struct SimulatedGenerator {
    delay: Duration,
    started: Mutex<HashMap<String, Instant>>,
}

impl SimulatedGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: Mutex::new(HashMap::new()),
        }
    }

    /// Operations started and not yet finished or released.
    pub async fn in_flight(&self) -> usize {
        self.started.lock().await.len()
    }

    fn video_url(operation: &str, suffix: &str) -> String {
        let id = operation.trim_start_matches(OPERATION_PREFIX);
        format!("https://storage.googleapis.com/generated-videos/{}{}", id, suffix)
    }
}

#[async_trait]
impl VideoGenerator for SimulatedGenerator {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn start(&self, job: &GenerationJob) -> ClientResult<OperationHandle> {
        let name = format!("{}{}", OPERATION_PREFIX, Uuid::new_v4());
        debug!(operation = %name, prompt_len = job.prompt.len(), "Simulated generation started");
        self.started.lock().await.insert(name.clone(), Instant::now());
        Ok(OperationHandle { name })
    }

    async fn poll(&self, operation: &OperationHandle) -> ClientResult<OperationState> {
        let mut started = self.started.lock().await;
        let Some(at) = started.get(&operation.name).copied() else {
            return Err(ClientError::Api {
                status: 404,
                message: format!("Operation {} not found", operation.name),
            });
        };

        if at.elapsed() < self.delay {
            return Ok(OperationState::Pending);
        }

        started.remove(&operation.name);
        Ok(OperationState::Done(GeneratedVideo {
            uri: Self::video_url(&operation.name, ".mp4"),
            mime_type: Some("video/mp4".to_string()),
            thumbnail_uri: Some(Self::video_url(&operation.name, "_thumb.jpg")),
        }))
    }

    async fn download(&self, _video: &GeneratedVideo) -> ClientResult<Vec<u8>> {
        Err(ClientError::Unsupported(
            "simulated videos have no content to download".to_string(),
        ))
    }

    async fn release(&self, operation: &OperationHandle) {
        if self.started.lock().await.remove(&operation.name).is_some() {
            debug!(operation = %operation.name, "Simulated operation released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veo_models::{GenerationLimits, VideoGenerationRequest};

    fn job() -> GenerationJob {
        let spec = VideoGenerationRequest::with_prompt("A cat")
            .validate_with(&GenerationLimits::default())
            .unwrap();
        GenerationJob::from_spec(&spec)
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_delay() {
        let generator = SimulatedGenerator::new(Duration::from_secs(5));
        let op = generator.start(&job()).await.unwrap();

        assert_eq!(generator.poll(&op).await.unwrap(), OperationState::Pending);

        tokio::time::advance(Duration::from_secs(6)).await;
        match generator.poll(&op).await.unwrap() {
            OperationState::Done(video) => {
                assert!(video.uri.starts_with("https://storage.googleapis.com/generated-videos/"));
                assert!(video.uri.ends_with(".mp4"));
                assert!(video.thumbnail_uri.unwrap().ends_with("_thumb.jpg"));
            }
            other => panic!("expected done, got {:?}", other),
        }
        assert_eq!(generator.in_flight().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_forgets_operation() {
        let generator = SimulatedGenerator::new(Duration::from_secs(60));
        let op = generator.start(&job()).await.unwrap();
        assert_eq!(generator.in_flight().await, 1);

        generator.release(&op).await;
        assert_eq!(generator.in_flight().await, 0);
        assert!(matches!(
            generator.poll(&op).await.unwrap_err(),
            ClientError::Api { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let generator = SimulatedGenerator::new(Duration::ZERO);
        let err = generator
            .poll(&OperationHandle {
                name: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
    }
}

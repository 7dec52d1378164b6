//! Generation orchestrator.
//!
//! Admits requests into the task store and drives each accepted task through
//! the generator in its own spawned future:
//! `analyzing_prompt` (10) → `generating` (30..79) → `finalizing` (80) →
//! `completed` (100). Any upstream error ends the task as `failed` with the
//! provider's message. A task cancelled through the store is noticed at the
//! next stage update and abandoned.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;
use veo_client::{GeneratedVideo, GenerationJob, OperationHandle, OperationState, VideoGenerator};
use veo_models::{GenerationLimits, Task, TaskId, TaskStatus, TaskUpdate, VideoGenerationRequest};
use veo_storage::{object_key, VideoPublisher};

use crate::error::{ApiError, ApiResult};
use crate::logging::TaskLogger;
use crate::metrics;
use crate::security::prompt_preview;
use crate::store::{StoreError, TaskStore};

const ANALYZING_PROGRESS: u8 = 10;
const GENERATING_PROGRESS: u8 = 30;
const POLL_PROGRESS_STEP: u8 = 5;
const MAX_GENERATING_PROGRESS: u8 = 79;
const FINALIZING_PROGRESS: u8 = 80;

/// Timing and limits for generation.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub limits: GenerationLimits,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

/// Why a driver stopped early.
enum DriveError {
    /// The task left the active set (cancelled or evicted).
    Stopped,
    Failed(String),
}

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<TaskStore>,
    generator: Arc<dyn VideoGenerator>,
    publisher: Option<Arc<dyn VideoPublisher>>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<TaskStore>,
        generator: Arc<dyn VideoGenerator>,
        publisher: Option<Arc<dyn VideoPublisher>>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            generator,
            publisher,
            settings,
        }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub fn limits(&self) -> &GenerationLimits {
        &self.settings.limits
    }

    /// Validate, admit and start a generation. Returns the `processing` snapshot.
    pub async fn submit(&self, request: &VideoGenerationRequest, source: &str) -> ApiResult<Task> {
        let spec = request.validate_with(&self.settings.limits)?;

        let task = self.store.create(spec).await.map_err(|e| {
            if matches!(e, StoreError::CapacityExceeded { .. }) {
                metrics::record_capacity_rejection();
            }
            ApiError::from(e)
        })?;
        metrics::record_task_submitted(source);

        let logger = TaskLogger::new(&task.task_id, self.generator.name());
        let span = logger.create_span();
        let driver = self.clone();
        let snapshot = task.clone();
        tokio::spawn(async move { driver.drive(snapshot, logger).await }.instrument(span));

        Ok(task)
    }

    /// Cancel a task. The driver notices on its next stage update.
    pub async fn cancel(&self, task_id: &TaskId) -> ApiResult<Task> {
        let task = self.store.cancel(task_id).await?;
        metrics::record_task_cancelled();
        Ok(task)
    }

    async fn drive(self, task: Task, logger: TaskLogger) {
        let started = Instant::now();
        logger.log_start(&prompt_preview(&task.spec.prompt));

        let outcome = match self.generate(&task, &logger).await {
            Ok((url, thumbnail)) => self
                .store
                .update_status(
                    &task.task_id,
                    TaskUpdate::completed(url.clone()).with_thumbnail(thumbnail),
                )
                .await
                .map(|_| url)
                .map_err(|_| DriveError::Stopped),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(url) => {
                metrics::record_task_completed(self.generator.name(), started.elapsed().as_secs_f64());
                logger.log_completion(&url);
            }
            Err(DriveError::Stopped) => {
                logger.log_warning("task is no longer active, abandoning generation");
            }
            Err(DriveError::Failed(message)) => {
                logger.log_error(&message);
                if self
                    .store
                    .update_status(&task.task_id, TaskUpdate::failed(message))
                    .await
                    .is_ok()
                {
                    metrics::record_task_failed(self.generator.name());
                }
            }
        }
    }

    /// Run the stages; yields the published video URL and its thumbnail.
    async fn generate(
        &self,
        task: &Task,
        logger: &TaskLogger,
    ) -> Result<(String, Option<String>), DriveError> {
        let id = &task.task_id;

        self.advance(id, TaskUpdate::stage(TaskStatus::AnalyzingPrompt, ANALYZING_PROGRESS))
            .await?;
        let job = GenerationJob::from_spec(&task.spec);

        self.advance(id, TaskUpdate::stage(TaskStatus::Generating, GENERATING_PROGRESS))
            .await?;
        let operation = self
            .generator
            .start(&job)
            .await
            .map_err(|e| DriveError::Failed(e.upstream_message()))?;
        logger.log_progress(&format!("operation {} started", operation.name));

        let waited = self.follow_operation(id, &operation).await;
        if waited.is_err() {
            self.generator.release(&operation).await;
        }
        let video = waited?;

        self.advance(id, TaskUpdate::stage(TaskStatus::Finalizing, FINALIZING_PROGRESS))
            .await?;

        let url = match &self.publisher {
            Some(publisher) => self.publish(task, &video, publisher.as_ref(), logger).await?,
            None => video.uri,
        };
        Ok((url, video.thumbnail_uri))
    }

    async fn follow_operation(
        &self,
        id: &TaskId,
        operation: &OperationHandle,
    ) -> Result<GeneratedVideo, DriveError> {
        self.advance(
            id,
            TaskUpdate::stage(TaskStatus::Generating, GENERATING_PROGRESS)
                .with_operation(operation.name.clone()),
        )
        .await?;

        self.wait_for_video(id, operation).await
    }

    async fn wait_for_video(
        &self,
        id: &TaskId,
        operation: &OperationHandle,
    ) -> Result<GeneratedVideo, DriveError> {
        let deadline = Instant::now() + self.settings.timeout;
        let mut progress = GENERATING_PROGRESS;

        loop {
            tokio::time::sleep(self.settings.poll_interval).await;

            match self.generator.poll(operation).await {
                Ok(OperationState::Done(video)) => return Ok(video),
                Ok(OperationState::Failed(message)) => return Err(DriveError::Failed(message)),
                Err(e) => return Err(DriveError::Failed(e.upstream_message())),
                Ok(OperationState::Pending) => {}
            }

            if Instant::now() >= deadline {
                return Err(DriveError::Failed(format!(
                    "Video generation timed out after {} seconds",
                    self.settings.timeout.as_secs()
                )));
            }

            progress = (progress + POLL_PROGRESS_STEP).min(MAX_GENERATING_PROGRESS);
            self.advance(id, TaskUpdate::stage(TaskStatus::Generating, progress))
                .await?;
        }
    }

    async fn publish(
        &self,
        task: &Task,
        video: &GeneratedVideo,
        publisher: &dyn VideoPublisher,
        logger: &TaskLogger,
    ) -> Result<String, DriveError> {
        let bytes = self
            .generator
            .download(video)
            .await
            .map_err(|e| DriveError::Failed(e.upstream_message()))?;

        let key = object_key(&task.task_id, task.spec.format);
        let content_type = video
            .mime_type
            .as_deref()
            .unwrap_or_else(|| task.spec.format.content_type());

        let started = Instant::now();
        let url = publisher
            .publish(&key, bytes, content_type)
            .await
            .map_err(|e| DriveError::Failed(format!("Failed to upload video: {}", e)))?;
        metrics::record_upload_duration(started.elapsed().as_secs_f64());
        logger.log_progress(&format!("published to {}", url));

        Ok(url)
    }

    /// Write a stage update; a rejected write means the task was cancelled.
    async fn advance(&self, id: &TaskId, update: TaskUpdate) -> Result<(), DriveError> {
        self.store
            .update_status(id, update)
            .await
            .map(|_| ())
            .map_err(|_| DriveError::Stopped)
    }
}

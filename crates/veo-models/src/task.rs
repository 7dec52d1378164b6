//! Generation task records and lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::TransitionError;
use crate::request::VideoSpec;

/// Unique identifier for a generation task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task lifecycle status.
///
/// Non-terminal states advance in declaration order. `Failed` and
/// `Cancelled` can be entered from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted, waiting for the driver to pick it up
    #[default]
    Processing,
    /// Building the enhanced prompt
    AnalyzingPrompt,
    /// Upstream generation in flight
    Generating,
    /// Publishing the generated video
    Finalizing,
    /// Video available
    Completed,
    /// Generation failed
    Failed,
    /// Cancelled by a client
    Cancelled,
}

impl TaskStatus {
    pub const ALL: &'static [TaskStatus] = &[
        TaskStatus::Processing,
        TaskStatus::AnalyzingPrompt,
        TaskStatus::Generating,
        TaskStatus::Finalizing,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::AnalyzingPrompt => "analyzing_prompt",
            TaskStatus::Generating => "generating",
            TaskStatus::Finalizing => "finalizing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more updates accepted).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    fn rank(&self) -> u8 {
        match self {
            TaskStatus::Processing => 0,
            TaskStatus::AnalyzingPrompt => 1,
            TaskStatus::Generating => 2,
            TaskStatus::Finalizing => 3,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled => 4,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Staying in the same non-terminal state is allowed so progress can be
    /// reported within a stage.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            TaskStatus::Failed | TaskStatus::Cancelled => true,
            _ => next.rank() >= self.rank(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TaskStatusParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown task status: {0}")]
pub struct TaskStatusParseError(String);

/// A requested change to a task record.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskUpdate {
    pub status: TaskStatus,
    pub progress: Option<u8>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub error: Option<String>,
    /// Upstream operation name, once known.
    pub operation: Option<String>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status,
            progress: None,
            video_url: None,
            thumbnail_url: None,
            error: None,
            operation: None,
        }
    }

    pub fn stage(status: TaskStatus, progress: u8) -> Self {
        Self::status(status).with_progress(progress)
    }

    pub fn completed(video_url: impl Into<String>) -> Self {
        Self {
            video_url: Some(video_url.into()),
            ..Self::stage(TaskStatus::Completed, 100)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::status(TaskStatus::Failed)
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }
}

/// One video generation request and its lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub task_id: TaskId,
    pub status: TaskStatus,
    /// Validated request parameters. Immutable once accepted.
    #[serde(flatten)]
    pub spec: VideoSpec,
    /// Progress percentage (0-100), never decreases.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task in `processing` state.
    pub fn new(spec: VideoSpec) -> Self {
        let now = Utc::now();
        Self {
            task_id: TaskId::new(),
            status: TaskStatus::Processing,
            spec,
            progress: 0,
            video_url: None,
            thumbnail_url: None,
            error: None,
            operation: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a status update, enforcing forward-only transitions.
    pub fn apply(&mut self, update: TaskUpdate) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }
        if !self.status.can_transition_to(update.status) {
            return Err(TransitionError::Backward {
                from: self.status,
                to: update.status,
            });
        }
        if update.status == TaskStatus::Completed && update.video_url.is_none() {
            return Err(TransitionError::MissingVideoUrl);
        }

        let now = Utc::now();
        self.status = update.status;
        if let Some(progress) = update.progress {
            self.progress = progress.min(100).max(self.progress);
        }
        if let Some(operation) = update.operation {
            self.operation = Some(operation);
        }

        match update.status {
            TaskStatus::Completed => {
                self.progress = 100;
                self.video_url = update.video_url;
                self.thumbnail_url = update.thumbnail_url;
                self.completed_at = Some(now);
            }
            TaskStatus::Failed => {
                self.error = Some(
                    update
                        .error
                        .unwrap_or_else(|| "Video generation failed".to_string()),
                );
                self.completed_at = Some(now);
            }
            TaskStatus::Cancelled => {
                self.completed_at = Some(now);
            }
            _ => {}
        }

        self.updated_at = now;
        Ok(())
    }

    /// Cancel a non-terminal task.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.apply(TaskUpdate::status(TaskStatus::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{GenerationLimits, VideoGenerationRequest};

    fn task() -> Task {
        let spec = VideoGenerationRequest::with_prompt("A cat")
            .validate_with(&GenerationLimits::default())
            .unwrap();
        Task::new(spec)
    }

    #[test]
    fn test_task_creation() {
        let task = task();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.progress, 0);
        assert!(task.completed_at.is_none());
        assert!(!task.is_terminal());
    }

    #[test]
    fn test_forward_transitions() {
        let mut task = task();

        task.apply(TaskUpdate::stage(TaskStatus::AnalyzingPrompt, 10)).unwrap();
        task.apply(TaskUpdate::stage(TaskStatus::Generating, 30)).unwrap();
        task.apply(TaskUpdate::stage(TaskStatus::Generating, 45)).unwrap();
        assert_eq!(task.progress, 45);

        task.apply(TaskUpdate::stage(TaskStatus::Finalizing, 80)).unwrap();
        task.apply(TaskUpdate::completed("https://example.com/v.mp4")).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert_eq!(task.video_url.as_deref(), Some("https://example.com/v.mp4"));
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_completion_carries_thumbnail() {
        let mut task = task();
        task.apply(
            TaskUpdate::completed("https://example.com/v.mp4")
                .with_thumbnail(Some("https://example.com/v_thumb.jpg".to_string())),
        )
        .unwrap();

        assert_eq!(task.thumbnail_url.as_deref(), Some("https://example.com/v_thumb.jpg"));
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut task = task();
        task.apply(TaskUpdate::stage(TaskStatus::Generating, 30)).unwrap();

        let err = task
            .apply(TaskUpdate::status(TaskStatus::AnalyzingPrompt))
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Backward {
                from: TaskStatus::Generating,
                to: TaskStatus::AnalyzingPrompt,
            }
        );
        assert_eq!(task.status, TaskStatus::Generating);
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut task = task();
        task.apply(TaskUpdate::stage(TaskStatus::Generating, 50)).unwrap();
        task.apply(TaskUpdate::stage(TaskStatus::Generating, 20)).unwrap();
        assert_eq!(task.progress, 50);
    }

    #[test]
    fn test_terminal_rejects_updates() {
        let mut task = task();
        task.apply(TaskUpdate::failed("quota exhausted")).unwrap();
        assert_eq!(task.error.as_deref(), Some("quota exhausted"));

        let err = task
            .apply(TaskUpdate::stage(TaskStatus::Generating, 40))
            .unwrap_err();
        assert_eq!(err, TransitionError::Terminal(TaskStatus::Failed));
        assert_eq!(task.cancel().unwrap_err(), TransitionError::Terminal(TaskStatus::Failed));
    }

    #[test]
    fn test_cancel_from_any_non_terminal_state() {
        for status in [
            TaskStatus::Processing,
            TaskStatus::AnalyzingPrompt,
            TaskStatus::Generating,
            TaskStatus::Finalizing,
        ] {
            let mut task = task();
            task.apply(TaskUpdate::status(status)).unwrap();
            task.cancel().unwrap();
            assert_eq!(task.status, TaskStatus::Cancelled);
            assert!(task.completed_at.is_some());
        }
    }

    #[test]
    fn test_completed_requires_video_url() {
        let mut task = task();
        let err = task
            .apply(TaskUpdate::status(TaskStatus::Completed))
            .unwrap_err();
        assert_eq!(err, TransitionError::MissingVideoUrl);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::AnalyzingPrompt).unwrap(),
            "\"analyzing_prompt\""
        );
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), *status);
        }
    }
}

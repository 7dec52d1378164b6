//! Task listing and cancellation handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use veo_models::{AspectRatio, Task, TaskId, TaskStatus};

use crate::auth::ApiCaller;
use crate::error::ApiResult;
use crate::security::parse_task_id;
use crate::state::AppState;

/// One row of the task list.
#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: u8,
    pub prompt: String,
    pub duration: u32,
    pub aspect_ratio: AspectRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Task> for TaskSummary {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id,
            status: task.status,
            progress: task.progress,
            prompt: task.spec.prompt,
            duration: task.spec.duration,
            aspect_ratio: task.spec.aspect_ratio,
            video_url: task.video_url,
            thumbnail_url: task.thumbnail_url,
            error: task.error,
            created_at: task.created_at,
            completed_at: task.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskSummary>,
    pub total: usize,
}

/// List retained tasks, oldest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    _caller: ApiCaller,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks: Vec<TaskSummary> = state.store.list().await.into_iter().map(Into::into).collect();
    let total = tasks.len();
    Ok(Json(TaskListResponse { tasks, total }))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub message: String,
}

/// Cancel a task that has not finished.
pub async fn cancel_task(
    State(state): State<AppState>,
    _caller: ApiCaller,
    Path(task_id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    let task_id = parse_task_id(&task_id)?;
    let task = state.orchestrator.cancel(&task_id).await?;
    info!(task_id = %task.task_id, "Task cancelled");

    Ok(Json(CancelResponse {
        message: format!("Task {} cancelled successfully", task.task_id),
        task_id: task.task_id,
        status: task.status,
    }))
}

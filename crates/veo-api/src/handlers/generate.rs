//! Direct generation and status handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::info;
use veo_models::{Task, TaskId, TaskStatus, VideoGenerationRequest};

use crate::auth::ApiCaller;
use crate::error::{ApiError, ApiResult};
use crate::extract::AppJson;
use crate::security::{parse_task_id, prompt_preview};
use crate::state::AppState;

/// Response to an accepted submission.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for GenerateResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id,
            status: task.status,
            message: "Video generation started".to_string(),
            created_at: task.created_at,
        }
    }
}

/// Status of one task.
#[derive(Debug, Serialize, JsonSchema)]
pub struct TaskStatusResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: u8,
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

impl From<Task> for TaskStatusResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id,
            status: task.status,
            progress: task.progress,
            video_url: task.video_url,
            thumbnail_url: task.thumbnail_url,
            error: task.error,
            created_at: task.created_at,
            completed_at: task.completed_at,
        }
    }
}

/// Submit a generation request.
pub async fn generate_video(
    State(state): State<AppState>,
    _caller: ApiCaller,
    AppJson(request): AppJson<VideoGenerationRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    submit(&state, &request, "direct").await
}

pub(crate) async fn submit(
    state: &AppState,
    request: &VideoGenerationRequest,
    source: &str,
) -> ApiResult<Json<GenerateResponse>> {
    info!(source, "Received generation request: {}", prompt_preview(&request.prompt));

    let task = state.orchestrator.submit(request, source).await?;
    info!(task_id = %task.task_id, "Video generation started");

    Ok(Json(task.into()))
}

/// Get the status of a task.
pub async fn get_task_status(
    State(state): State<AppState>,
    _caller: ApiCaller,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusResponse>> {
    lookup(&state, &task_id).await
}

pub(crate) async fn lookup(state: &AppState, raw_id: &str) -> ApiResult<Json<TaskStatusResponse>> {
    let task_id = parse_task_id(raw_id)?;
    let task = state
        .store
        .get(&task_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Task {} not found", task_id)))?;

    Ok(Json(task.into()))
}

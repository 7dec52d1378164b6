//! Webhook endpoints for workflow-automation tools.
//!
//! Same behavior as the direct endpoints, with tolerant request parsing.

use axum::extract::{Path, State};
use axum::Json;

use crate::auth::ApiCaller;
use crate::error::ApiResult;
use crate::extract::WebhookRequest;
use crate::handlers::generate::{lookup, submit};
use crate::handlers::{GenerateResponse, TaskStatusResponse};
use crate::state::AppState;

pub async fn webhook_generate(
    State(state): State<AppState>,
    _caller: ApiCaller,
    WebhookRequest(request): WebhookRequest,
) -> ApiResult<Json<GenerateResponse>> {
    submit(&state, &request, "webhook").await
}

pub async fn webhook_status(
    State(state): State<AppState>,
    _caller: ApiCaller,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskStatusResponse>> {
    lookup(&state, &task_id).await
}

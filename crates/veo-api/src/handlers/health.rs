//! Service info and health handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use schemars::schema_for;
use serde::Serialize;
use serde_json::{json, Value};
use veo_models::{Task, VideoGenerationRequest};

use crate::handlers::TaskStatusResponse;
use crate::state::AppState;

const SERVICE_NAME: &str = "veo3-video-api";

/// Root response.
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub docs: String,
}

/// Service banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Veo3 Video Generation API".to_string(),
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs: "/schema".to_string(),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub environment: String,
    pub version: String,
    pub timestamp: String,
    pub active_tasks: usize,
    pub max_concurrent_tasks: usize,
}

/// Health check endpoint (liveness probe).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        environment: state.config.environment.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        active_tasks: state.store.active_count().await,
        max_concurrent_tasks: state.store.max_active(),
    })
}

/// JSON Schemas of the request and response shapes.
pub async fn schema() -> Json<Value> {
    Json(json!({
        "video_generation_request": schema_for!(VideoGenerationRequest),
        "task_status": schema_for!(TaskStatusResponse),
        "task": schema_for!(Task),
    }))
}

//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::ApiError;
use crate::handlers::{
    cancel_task, generate_key, generate_video, get_task_status, health, list_tasks, root, schema,
    verify_key, webhook_generate, webhook_status,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, handle_panic, normalize_error_responses, rate_limit_middleware, request_id,
    request_logging, security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let task_routes = Router::new()
        .route("/generate", post(generate_video))
        .route("/status/:task_id", get(get_task_status))
        .route("/tasks", get(list_tasks))
        .route("/tasks/:task_id", delete(cancel_task));

    // Tolerant variants for automation tools
    let webhook_routes = Router::new()
        .route("/webhook/generate", post(webhook_generate))
        .route("/webhook/status/:task_id", get(webhook_status));

    let auth_routes = Router::new()
        .route("/auth/generate-key", post(generate_key))
        .route("/auth/verify", get(verify_key));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(task_routes)
        .merge(webhook_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/schema", get(schema));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(public_routes)
        .merge(metrics_routes)
        .fallback(route_not_found)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::map_response(normalize_error_responses))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

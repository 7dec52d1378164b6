//! End-to-end tests of the HTTP surface against the simulated generator.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use veo_api::config::Environment;
use veo_api::{create_router, AppState, ServiceConfig};
use veo_client::SimulatedGenerator;

const API_KEY: &str = "test-secret-key";

fn test_config() -> ServiceConfig {
    ServiceConfig {
        api_key: API_KEY.to_string(),
        simulate: true,
        simulate_delay: Duration::from_millis(50),
        poll_interval: Duration::from_millis(10),
        generation_timeout: Duration::from_secs(5),
        ..ServiceConfig::default()
    }
}

fn app_with(config: ServiceConfig) -> Router {
    let generator = Arc::new(SimulatedGenerator::new(config.simulate_delay));
    let state = AppState::with_generator(config, generator, None);
    create_router(state, None)
}

fn app() -> Router {
    app_with(test_config())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn wait_for_status(app: &Router, task_id: &str, wanted: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = send(app, authed("GET", &format!("/status/{}", task_id), None)).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == wanted {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {} never reached {}", task_id, wanted);
}

#[tokio::test]
async fn test_root_and_health_are_public() {
    let app = app();

    let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "veo3-video-api");
    assert_eq!(body["active_tasks"], 0);
    assert_eq!(body["max_concurrent_tasks"], 10);
}

#[tokio::test]
async fn test_schema_lists_request_shape() {
    let (status, body) = send(&app(), Request::get("/schema").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["video_generation_request"].is_object());
    assert!(body["task_status"].is_object());
}

#[tokio::test]
async fn test_missing_and_invalid_credentials() {
    let app = app();
    let payload = json!({"prompt": "A cat"}).to_string();

    let request = Request::post("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.clone()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authenticated");

    let request = Request::post("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer wrong-key")
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid API key");
}

#[tokio::test]
async fn test_generate_runs_to_completion() {
    let app = app();

    let (status, body) = send(
        &app,
        authed("POST", "/generate", Some(json!({"prompt": "A cat on a skateboard", "duration": 5}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");
    assert_eq!(body["message"], "Video generation started");

    let task_id = body["task_id"].as_str().unwrap().to_string();
    let done = wait_for_status(&app, &task_id, "completed").await;

    assert_eq!(done["progress"], 100);
    assert!(done["video_url"].as_str().unwrap().ends_with(".mp4"));
    assert!(done["thumbnail_url"].as_str().unwrap().ends_with("_thumb.jpg"));
    assert!(done["completed_at"].is_string());
    assert!(done.get("error").is_none());

    let (_, list) = send(&app, authed("GET", "/tasks", None)).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["tasks"][0]["prompt"], "A cat on a skateboard");
}

#[tokio::test]
async fn test_duration_over_limit_is_rejected() {
    let app = app();

    let (status, body) = send(
        &app,
        authed("POST", "/generate", Some(json!({"prompt": "A cat", "duration": 120}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["details"]["field"], "duration");

    let (_, list) = send(&app, authed("GET", "/tasks", None)).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let request = Request::post("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_direct_type_error_names_field() {
    let (status, body) = send(
        &app(),
        authed("POST", "/generate", Some(json!({"prompt": "A cat", "duration": "5"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["details"]["field"], "duration");
}

#[tokio::test]
async fn test_wrong_method_has_error_body() {
    let (status, body) = send(&app(), authed("GET", "/generate", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "MethodNotAllowedError");
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn test_oversized_body_has_error_body() {
    let app = app_with(ServiceConfig {
        max_body_size: 64,
        ..test_config()
    });
    let payload = json!({ "prompt": "x".repeat(200) }).to_string();

    let request = Request::post("/generate")
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "PayloadTooLargeError");
}

#[tokio::test]
async fn test_capacity_limit() {
    let app = app_with(ServiceConfig {
        max_concurrent_tasks: 1,
        simulate_delay: Duration::from_secs(60),
        generation_timeout: Duration::from_secs(120),
        ..test_config()
    });

    let (status, _) = send(&app, authed("POST", "/generate", Some(json!({"prompt": "one"})))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, authed("POST", "/generate", Some(json!({"prompt": "two"})))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["message"],
        "Maximum concurrent tasks (1) reached. Please try again later."
    );
}

#[tokio::test]
async fn test_cancel_then_cancel_again() {
    let app = app_with(ServiceConfig {
        simulate_delay: Duration::from_secs(60),
        generation_timeout: Duration::from_secs(120),
        ..test_config()
    });

    let (_, body) = send(&app, authed("POST", "/generate", Some(json!({"prompt": "slow"})))).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();
    wait_for_status(&app, &task_id, "generating").await;

    let (status, body) = send(&app, authed("DELETE", &format!("/tasks/{}", task_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["message"], format!("Task {} cancelled successfully", task_id));

    let (status, body) = send(&app, authed("DELETE", &format!("/tasks/{}", task_id), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot cancel task with status: cancelled");

    // The slot is released
    let (_, health) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(health["active_tasks"], 0);
}

#[tokio::test]
async fn test_cancel_completed_task_conflicts() {
    let app = app();

    let (_, body) = send(&app, authed("POST", "/generate", Some(json!({"prompt": "quick"})))).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();
    wait_for_status(&app, &task_id, "completed").await;

    let (status, body) = send(&app, authed("DELETE", &format!("/tasks/{}", task_id), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ConflictError");
    assert_eq!(body["message"], "Cannot cancel task with status: completed");

    let (_, status_body) = send(&app, authed("GET", &format!("/status/{}", task_id), None)).await;
    assert_eq!(status_body["status"], "completed");
}

#[tokio::test]
async fn test_unknown_task_ids_are_not_found() {
    let app = app();

    let (status, body) = send(&app, authed("GET", "/status/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFoundError");
    assert_eq!(body["message"], "Task not-a-uuid not found");

    let (status, _) = send(&app, authed("DELETE", "/tasks/abc", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unknown = "550e8400-e29b-41d4-a716-446655440000";
    let (status, body) = send(&app, authed("GET", &format!("/status/{}", unknown), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFoundError");

    let (status, _) = send(&app, authed("DELETE", &format!("/tasks/{}", unknown), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_accepts_wrapped_payload() {
    let app = app();

    let (status, body) = send(
        &app,
        authed(
            "POST",
            "/webhook/generate",
            Some(json!({
                "prompt": null,
                "body": {"prompt": "A dog", "duration": "5", "aspectRatio": "9:16"}
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let task_id = body["task_id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, authed("GET", &format!("/webhook/status/{}", task_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_id"], task_id.as_str());

    let (_, list) = send(&app, authed("GET", "/tasks", None)).await;
    assert_eq!(list["tasks"][0]["duration"], 5);
    assert_eq!(list["tasks"][0]["aspect_ratio"], "9:16");
}

#[tokio::test]
async fn test_generate_key_only_in_development() {
    let (status, body) = send(
        &app(),
        Request::post("/auth/generate-key").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["api_key"].as_str().unwrap().len() >= 40);

    let production = app_with(ServiceConfig {
        environment: Environment::Production,
        ..test_config()
    });
    let (status, body) = send(
        &production,
        Request::post("/auth/generate-key").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FeatureDisabledError");
}

#[tokio::test]
async fn test_verify_key() {
    let (status, body) = send(&app(), authed("GET", "/auth/verify", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["token_preview"], "test-sec...");
}

#[tokio::test]
async fn test_security_headers_present() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
}

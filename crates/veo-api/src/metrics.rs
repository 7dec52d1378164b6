//! Prometheus metrics for the gateway.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

use crate::auth::AuthFailure;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "veo_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "veo_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "veo_http_requests_in_flight";

    // Task lifecycle
    pub const TASKS_SUBMITTED_TOTAL: &str = "veo_tasks_submitted_total";
    pub const TASKS_COMPLETED_TOTAL: &str = "veo_tasks_completed_total";
    pub const TASKS_FAILED_TOTAL: &str = "veo_tasks_failed_total";
    pub const TASKS_CANCELLED_TOTAL: &str = "veo_tasks_cancelled_total";
    pub const TASKS_ACTIVE: &str = "veo_tasks_active";
    pub const CAPACITY_REJECTIONS_TOTAL: &str = "veo_capacity_rejections_total";
    pub const GENERATION_DURATION_SECONDS: &str = "veo_generation_duration_seconds";
    pub const UPLOAD_DURATION_SECONDS: &str = "veo_upload_duration_seconds";

    // Access control
    pub const RATE_LIMIT_HITS_TOTAL: &str = "veo_rate_limit_hits_total";
    pub const AUTH_FAILURES_TOTAL: &str = "veo_auth_failures_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an accepted submission.
pub fn record_task_submitted(source: &str) {
    let labels = [("source", source.to_string())];
    counter!(names::TASKS_SUBMITTED_TOTAL, &labels).increment(1);
}

/// Record a successful generation and how long it took.
pub fn record_task_completed(generator: &str, duration_secs: f64) {
    let labels = [("generator", generator.to_string())];
    counter!(names::TASKS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_task_failed(generator: &str) {
    let labels = [("generator", generator.to_string())];
    counter!(names::TASKS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_task_cancelled() {
    counter!(names::TASKS_CANCELLED_TOTAL).increment(1);
}

/// Update active tasks gauge.
pub fn set_active_tasks(count: usize) {
    gauge!(names::TASKS_ACTIVE).set(count as f64);
}

pub fn record_capacity_rejection() {
    counter!(names::CAPACITY_REJECTIONS_TOTAL).increment(1);
}

/// Record upload duration.
pub fn record_upload_duration(duration_secs: f64) {
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

pub fn record_auth_failure(failure: AuthFailure) {
    let reason = match failure {
        AuthFailure::NotAuthenticated => "missing",
        AuthFailure::InvalidKey => "invalid",
    };
    counter!(names::AUTH_FAILURES_TOTAL, "reason" => reason).increment(1);
}

static UUID_SEGMENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}").ok()
});

/// Replace task ids (and anything else under `/status/`) with a placeholder.
static TASK_PATH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/(status|tasks)/[^/]+").ok());

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    let mut path = path.to_string();
    if let Some(re) = UUID_SEGMENT.as_ref() {
        path = re.replace_all(&path, ":id").into_owned();
    }
    if let Some(re) = TASK_PATH.as_ref() {
        path = re.replace_all(&path, "/$1/:id").into_owned();
    }
    path
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

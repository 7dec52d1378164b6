//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;
use veo_models::ValidationError;

use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Client-facing text for internal errors; details only go to the log.
const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    FeatureDisabled(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body is too large")]
    PayloadTooLarge,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Capacity(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn feature_disabled(msg: impl Into<String>) -> Self {
        Self::FeatureDisabled(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Error kind reported in the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "ValidationError",
            ApiError::Unauthorized(_) => "AuthenticationError",
            ApiError::FeatureDisabled(_) => "FeatureDisabledError",
            ApiError::NotFound(_) => "NotFoundError",
            ApiError::MethodNotAllowed => "MethodNotAllowedError",
            ApiError::PayloadTooLarge => "PayloadTooLargeError",
            ApiError::Conflict(_) => "ConflictError",
            ApiError::Capacity(_) => "CapacityError",
            ApiError::RateLimited => "RateLimitError",
            ApiError::Upstream(_) => "UpstreamError",
            ApiError::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Capacity(_) | ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Validation {
                field: Some(field), ..
            } => Some(json!({ "field": field })),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            field: Some(err.field),
            message: err.message,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CapacityExceeded { .. } => Self::Capacity(err.to_string()),
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.kind(),
            message,
            details: self.details(),
        };

        match self {
            ApiError::Unauthorized(_) => (
                status,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(body),
            )
                .into_response(),
            ApiError::RateLimited => {
                (status, [(header::RETRY_AFTER, "1")], Json(body)).into_response()
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}

//! API key bootstrap and verification handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::auth::{generate_api_key, hash_api_key, ApiCaller};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GeneratedKeyResponse {
    pub api_key: String,
    /// SHA-256 digest, usable as `API_KEY` instead of the key itself
    pub api_key_sha256: String,
    pub message: String,
    pub usage: String,
}

/// Generate a new random API key. Development only.
pub async fn generate_key(State(state): State<AppState>) -> ApiResult<Json<GeneratedKeyResponse>> {
    if state.config.is_production() {
        return Err(ApiError::feature_disabled(
            "API key generation is disabled in production",
        ));
    }

    let api_key = generate_api_key();
    info!("Generated a new API key");

    Ok(Json(GeneratedKeyResponse {
        api_key_sha256: hash_api_key(&api_key),
        usage: format!("Authorization: Bearer {}", api_key),
        message: "Set this value as API_KEY to enable it. It will not be shown again.".to_string(),
        api_key,
    }))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub message: String,
    pub token_preview: Option<String>,
}

/// Confirm the presented key is accepted.
pub async fn verify_key(State(state): State<AppState>, caller: ApiCaller) -> Json<VerifyResponse> {
    let message = if state.auth.require_auth() {
        "API key is valid"
    } else {
        "Authentication is disabled"
    };

    Json(VerifyResponse {
        valid: true,
        message: message.to_string(),
        token_preview: caller.token_preview(),
    })
}

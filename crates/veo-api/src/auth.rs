//! Bearer API key authentication.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Random bytes in a generated key.
const GENERATED_KEY_BYTES: usize = 32;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NotAuthenticated,
    InvalidKey,
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::NotAuthenticated => "Not authenticated",
            AuthFailure::InvalidKey => "Invalid API key",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny(AuthFailure),
}

/// Checks bearer tokens against the configured secret.
#[derive(Debug, Clone)]
pub struct Authenticator {
    require_auth: bool,
    secret: String,
    /// Set when the secret is itself a SHA-256 hex digest.
    secret_is_digest: bool,
}

impl Authenticator {
    pub fn new(secret: impl Into<String>, require_auth: bool) -> Self {
        let secret = secret.into();
        if require_auth && secret.is_empty() {
            warn!("REQUIRE_AUTH is on but API_KEY is empty; every request will be rejected");
        }

        Self {
            require_auth,
            secret_is_digest: is_sha256_hex(&secret),
            secret,
        }
    }

    pub fn require_auth(&self) -> bool {
        self.require_auth
    }

    pub fn check(&self, token: Option<&str>) -> AuthDecision {
        if !self.require_auth {
            return AuthDecision::Allow;
        }

        let Some(token) = token else {
            return AuthDecision::Deny(AuthFailure::NotAuthenticated);
        };

        if self.secret.is_empty() {
            return AuthDecision::Deny(AuthFailure::InvalidKey);
        }

        let matches = digest(token) == digest(&self.secret)
            || (self.secret_is_digest && hash_api_key(token).eq_ignore_ascii_case(&self.secret));

        if matches {
            AuthDecision::Allow
        } else {
            warn!("Invalid API key attempt: {}", token_preview(token));
            AuthDecision::Deny(AuthFailure::InvalidKey)
        }
    }
}

fn digest(value: &str) -> Vec<u8> {
    Sha256::digest(value.as_bytes()).to_vec()
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// SHA-256 hex digest of a key, suitable for `API_KEY`.
pub fn hash_api_key(key: &str) -> String {
    digest(key).iter().map(|b| format!("{:02x}", b)).collect()
}

/// Fresh URL-safe random key.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; GENERATED_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// First 8 characters followed by `...`.
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(8).collect();
    format!("{}...", head)
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct ApiCaller {
    /// Presented bearer token, if any
    pub token: Option<String>,
}

impl ApiCaller {
    pub fn token_preview(&self) -> Option<String> {
        self.token.as_deref().map(token_preview)
    }
}

/// Axum extractor for authenticated callers.
#[axum::async_trait]
impl FromRequestParts<AppState> for ApiCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

        match state.auth.check(token.as_deref()) {
            AuthDecision::Allow => Ok(ApiCaller { token }),
            AuthDecision::Deny(failure) => {
                metrics::record_auth_failure(failure);
                Err(ApiError::unauthorized(failure.message()))
            }
        }
    }
}

//! Request body extractors.
//!
//! `AppJson` is the strict extractor for the direct endpoints. `WebhookRequest`
//! accepts the looser payloads workflow-automation tools produce.

use std::error::Error as StdError;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use veo_models::VideoGenerationRequest;

use crate::error::ApiError;

/// Keys automation tools wrap the real payload in.
const ENVELOPE_KEYS: &[&str] = &["body", "json", "data"];

/// Nested envelopes followed before giving up.
const MAX_ENVELOPE_DEPTH: usize = 3;

/// JSON body whose rejections render as `ValidationError`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Expected request with `Content-Type: application/json`")
        }
        JsonRejection::JsonDataError(err) => match rejected_field(&err) {
            Some(field) => ApiError::validation(field, err.body_text()),
            None => ApiError::bad_request(err.body_text()),
        },
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        other => ApiError::bad_request(other.body_text()),
    }
}

/// Field a deserialization error points at, from the serde path or a
/// `missing field` message.
fn rejected_field(err: &(dyn StdError + 'static)) -> Option<String> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(path_error) =
            cause.downcast_ref::<serde_path_to_error::Error<serde_json::Error>>()
        {
            let path = path_error.path().to_string();
            if path != "." {
                return Some(path);
            }
            return missing_field(&path_error.inner().to_string());
        }
        source = cause.source();
    }
    None
}

fn missing_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next().map(str::to_string)
}

/// Generation request from a webhook caller.
#[derive(Debug, Clone)]
pub struct WebhookRequest(pub VideoGenerationRequest);

#[axum::async_trait]
impl<S> FromRequest<S> for WebhookRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::PayloadTooLarge
                } else {
                    ApiError::bad_request(e.body_text())
                }
            })?;

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;

        normalize_webhook_payload(value).map(WebhookRequest)
    }
}

/// Turn a tolerant webhook payload into a generation request.
///
/// Unwraps `body`/`json`/`data` envelopes (also when stringified), accepts
/// camelCase keys and numeric strings, and treats `null` or `""` as unset.
pub fn normalize_webhook_payload(value: Value) -> Result<VideoGenerationRequest, ApiError> {
    let object = unwrap_envelope(value)?;
    let mut request = VideoGenerationRequest::default();

    for (key, value) in object {
        if is_unset(&value) {
            continue;
        }

        match canonical_key(&key).as_str() {
            "prompt" => request.prompt = text_field("prompt", value)?,
            "duration" => request.duration = Some(integer_field("duration", &value)?),
            "fps" => request.fps = Some(integer_field("fps", &value)?),
            "resolution" => request.resolution = Some(text_field("resolution", value)?),
            "quality" => request.quality = Some(text_field("quality", value)?),
            "aspect_ratio" => request.aspect_ratio = Some(text_field("aspect_ratio", value)?),
            "format" => request.format = Some(text_field("format", value)?),
            "style" => request.style = Some(text_field("style", value)?),
            _ => {}
        }
    }

    Ok(request)
}

fn unwrap_envelope(mut value: Value) -> Result<Map<String, Value>, ApiError> {
    for _ in 0..=MAX_ENVELOPE_DEPTH {
        // Stringified JSON bodies
        if let Value::String(raw) = &value {
            let parsed = serde_json::from_str(raw)
                .map_err(|_| ApiError::bad_request("Request body must be a JSON object"))?;
            value = parsed;
        }

        let Value::Object(mut object) = value else {
            return Err(ApiError::bad_request("Request body must be a JSON object"));
        };

        if object.get("prompt").is_some_and(|prompt| !is_unset(prompt)) {
            return Ok(object);
        }

        let inner = ENVELOPE_KEYS.iter().find_map(|key| {
            object
                .get(*key)
                .filter(|v| v.is_object() || v.is_string())
                .map(|_| *key)
        });

        match inner.and_then(|key| object.remove(key)) {
            Some(next) => value = next,
            None => return Ok(object),
        }
    }

    Err(ApiError::bad_request("Request body is nested too deeply"))
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// `aspectRatio` / `aspect-ratio` → `aspect_ratio`.
fn canonical_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.trim().chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || c == ' ' {
            out.push('_');
        } else {
            out.push(c);
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    out
}

fn text_field(field: &str, value: Value) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ApiError::validation(field, format!("{} must be a string", field))),
    }
}

fn integer_field(field: &str, value: &Value) -> Result<i64, ApiError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    };

    parsed.ok_or_else(|| ApiError::validation(field, format!("{} must be an integer", field)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_plain_payload() {
        let request = normalize_webhook_payload(json!({
            "prompt": "A cat",
            "duration": 5,
            "aspect_ratio": "9:16"
        }))
        .unwrap();

        assert_eq!(request.prompt, "A cat");
        assert_eq!(request.duration, Some(5));
        assert_eq!(request.aspect_ratio.as_deref(), Some("9:16"));
    }

    #[test]
    fn test_wrapped_camel_case_payload() {
        let request = normalize_webhook_payload(json!({
            "body": {"prompt": "x", "duration": "5", "aspectRatio": "9:16"}
        }))
        .unwrap();

        assert_eq!(request.prompt, "x");
        assert_eq!(request.duration, Some(5));
        assert_eq!(request.aspect_ratio.as_deref(), Some("9:16"));
    }

    #[test]
    fn test_nested_and_stringified_envelopes() {
        let request = normalize_webhook_payload(json!({
            "json": {"data": "{\"prompt\": \"y\", \"fps\": \"24\"}"}
        }))
        .unwrap();

        assert_eq!(request.prompt, "y");
        assert_eq!(request.fps, Some(24));
    }

    #[test]
    fn test_empty_values_mean_default() {
        let request = normalize_webhook_payload(json!({
            "prompt": "z",
            "duration": "",
            "resolution": null,
            "style": "  "
        }))
        .unwrap();

        assert_eq!(request.duration, None);
        assert_eq!(request.resolution, None);
        assert_eq!(request.style, None);
    }

    #[test]
    fn test_bad_number_names_field() {
        let err = normalize_webhook_payload(json!({"prompt": "z", "duration": "five"})).unwrap_err();
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("duration")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_top_level_prompt_still_unwraps() {
        let request = normalize_webhook_payload(json!({
            "prompt": null,
            "body": {"prompt": "A dog"}
        }))
        .unwrap();
        assert_eq!(request.prompt, "A dog");

        let request = normalize_webhook_payload(json!({
            "prompt": "",
            "data": {"prompt": "A bird", "duration": 4}
        }))
        .unwrap();
        assert_eq!(request.prompt, "A bird");
        assert_eq!(request.duration, Some(4));
    }

    #[tokio::test]
    async fn test_direct_type_error_names_field() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"prompt": "A cat", "duration": "5"}"#))
            .unwrap();

        let err = AppJson::<VideoGenerationRequest>::from_request(request, &())
            .await
            .unwrap_err();
        match err {
            ApiError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("duration")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_message() {
        assert_eq!(
            missing_field("missing field `prompt` at line 1 column 2").as_deref(),
            Some("prompt")
        );
        assert_eq!(missing_field("invalid type: string"), None);
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(normalize_webhook_payload(json!([1, 2, 3])).is_err());
        assert!(normalize_webhook_payload(json!("not json")).is_err());
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("aspectRatio"), "aspect_ratio");
        assert_eq!(canonical_key("aspect-ratio"), "aspect_ratio");
        assert_eq!(canonical_key("aspect_ratio"), "aspect_ratio");
        assert_eq!(canonical_key("FPS"), "fps");
        assert_eq!(canonical_key("Prompt"), "prompt");
    }
}

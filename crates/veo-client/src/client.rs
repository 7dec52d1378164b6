//! Veo3 REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::generator::{GeneratedVideo, GenerationJob, OperationHandle, OperationState, VideoGenerator};
use crate::types::{
    native_aspect_ratio, native_resolution, ApiErrorEnvelope, Instance, Operation, Parameters,
    PredictRequest,
};

/// Default Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Veo model.
pub const DEFAULT_MODEL: &str = "veo-3.0-generate-001";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Configuration for the Veo client.
#[derive(Debug, Clone)]
pub struct VeoConfig {
    /// Google API key
    pub api_key: String,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Model name, e.g. `veo-3.0-generate-001`
    pub model: String,
    /// Per-request timeout (downloads included)
    pub request_timeout: Duration,
    /// Content to steer away from, forwarded as `negativePrompt`
    pub negative_prompt: Option<String>,
}

impl VeoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(120),
            negative_prompt: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Client for Veo long-running generation operations.
pub struct VeoClient {
    http: Client,
    config: VeoConfig,
}

impl VeoClient {
    /// Create a new Veo client.
    pub fn new(config: VeoConfig) -> ClientResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::config("GOOGLE_API_KEY is required"));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn predict_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.config.base_url, self.config.model
        )
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.config.base_url, name.trim_start_matches('/'))
    }

    fn build_request(&self, job: &GenerationJob) -> PredictRequest {
        PredictRequest {
            instances: vec![Instance {
                prompt: job.prompt.clone(),
            }],
            parameters: Parameters {
                aspect_ratio: native_aspect_ratio(job.spec.aspect_ratio).map(str::to_string),
                resolution: native_resolution(job.spec.resolution).map(str::to_string),
                negative_prompt: self.config.negative_prompt.clone(),
            },
        }
    }

    /// Turn a non-success response into an API error carrying the provider message.
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body
                }
            });

        warn!(status = %status, "Veo API request failed: {}", message);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl VideoGenerator for VeoClient {
    fn name(&self) -> &'static str {
        "veo"
    }

    async fn start(&self, job: &GenerationJob) -> ClientResult<OperationHandle> {
        let url = self.predict_url();
        debug!("Submitting generation to {}", url);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&self.build_request(job))
            .send()
            .await?;

        let operation: Operation = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(format!("Failed to parse operation: {}", e)))?;

        if operation.name.is_empty() {
            return Err(ClientError::invalid_response("Operation name missing"));
        }

        info!(model = %self.config.model, operation = %operation.name, "Veo generation started");
        Ok(OperationHandle {
            name: operation.name,
        })
    }

    async fn poll(&self, operation: &OperationHandle) -> ClientResult<OperationState> {
        let response = self
            .http
            .get(self.operation_url(&operation.name))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        let operation: Operation = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(format!("Failed to parse operation: {}", e)))?;

        Ok(operation.into_state())
    }

    async fn download(&self, video: &GeneratedVideo) -> ClientResult<Vec<u8>> {
        debug!("Downloading generated video from {}", video.uri);

        let response = self
            .http
            .get(&video.uri)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        let bytes = Self::check(response).await?.bytes().await?;
        info!("Downloaded {} bytes of generated video", bytes.len());
        Ok(bytes.to_vec())
    }
}

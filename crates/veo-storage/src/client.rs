//! Spaces / S3 client implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use tracing::{debug, info};
use veo_models::{TaskId, VideoFormat};

use crate::error::{StorageError, StorageResult};

const DEFAULT_REGION: &str = "us-east-1";

/// Object key for a task's video: `videos/{task_id}.{ext}`.
pub fn object_key(task_id: &TaskId, format: VideoFormat) -> String {
    format!("videos/{}.{}", task_id, format.as_str())
}

/// Configuration for the Spaces client.
#[derive(Debug, Clone)]
pub struct SpacesConfig {
    /// S3 API endpoint, e.g. `https://nyc3.digitaloceanspaces.com`
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    pub region: String,
}

impl SpacesConfig {
    /// Read configuration from the environment.
    ///
    /// Returns `None` unless every required variable is set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Some(Self {
            endpoint_url: get("AWS_S3_ENDPOINT_URL")?.trim_end_matches('/').to_string(),
            access_key_id: get("AWS_ACCESS_KEY_ID")?,
            secret_access_key: get("AWS_SECRET_ACCESS_KEY")?,
            bucket_name: get("AWS_STORAGE_BUCKET_NAME")?,
            region: get("AWS_S3_REGION_NAME").unwrap_or_else(|| DEFAULT_REGION.to_string()),
        })
    }

    /// Public URL of an object.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint_url, self.bucket_name, key)
    }
}

/// Destination for finished videos.
#[async_trait]
pub trait VideoPublisher: Send + Sync {
    /// Store the video under `key` and return its public URL.
    async fn publish(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct SpacesClient {
    client: Client,
    config: SpacesConfig,
}

impl SpacesClient {
    /// Create a new client from configuration.
    pub fn new(config: SpacesConfig) -> StorageResult<Self> {
        if config.endpoint_url.is_empty() || config.bucket_name.is_empty() {
            return Err(StorageError::config_error(
                "endpoint and bucket are required",
            ));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "spaces",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            config,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket_name
    }

    /// Upload bytes with a public-read ACL.
    pub async fn upload_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()> {
        if key.is_empty() || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        debug!("Uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl VideoPublisher for SpacesClient {
    async fn publish(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        self.upload_bytes(data, key, content_type).await?;
        let url = self.config.public_url(key);
        info!("Video uploaded to {}", url);
        Ok(url)
    }
}

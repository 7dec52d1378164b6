//! Service configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;
use veo_client::VeoConfig;
use veo_models::GenerationLimits;
use veo_storage::SpacesConfig;

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Read `ENVIRONMENT` directly, before the rest of the configuration.
    pub fn from_process_env() -> Self {
        std::env::var("ENVIRONMENT")
            .map(|v| Self::from_name(&v))
            .unwrap_or_default()
    }

    fn from_name(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load `.env` in development only.
pub fn load_dotenv() {
    if Environment::from_process_env() == Environment::Development {
        dotenvy::dotenv().ok();
    }
}

/// Service configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_json: bool,

    /// Shared bearer secret (plain or SHA-256 hex digest)
    pub api_key: String,
    pub require_auth: bool,

    pub max_video_duration: u32,
    pub max_concurrent_tasks: usize,
    pub max_retained_tasks: usize,

    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub max_body_size: usize,
    pub metrics_enabled: bool,

    pub google_api_key: Option<String>,
    pub veo_base_url: String,
    pub veo_model: String,
    pub veo_negative_prompt: Option<String>,
    pub poll_interval: Duration,
    pub generation_timeout: Duration,
    /// Use the simulated generator instead of the Veo API
    pub simulate: bool,
    pub simulate_delay: Duration,

    /// Video publishing target, when fully configured
    pub storage: Option<SpacesConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            log_json: false,
            api_key: String::new(),
            require_auth: true,
            max_video_duration: 60,
            max_concurrent_tasks: 10,
            max_retained_tasks: 1000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024, // 1MiB
            metrics_enabled: true,
            google_api_key: None,
            veo_base_url: veo_client::client::DEFAULT_BASE_URL.to_string(),
            veo_model: veo_client::client::DEFAULT_MODEL.to_string(),
            veo_negative_prompt: None,
            poll_interval: Duration::from_secs(10),
            generation_timeout: Duration::from_secs(600),
            simulate: false,
            simulate_delay: Duration::from_millis(5000),
            storage: None,
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);
        let defaults = Self::default();

        let config = Self {
            environment: vars
                .get("ENVIRONMENT")
                .map(|v| Environment::from_name(&v))
                .unwrap_or_default(),
            host: vars.get("HOST").unwrap_or(defaults.host),
            port: vars.parse("PORT")?.unwrap_or(defaults.port),
            log_level: vars.get("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: vars
                .get("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            api_key: vars.get("API_KEY").unwrap_or_default(),
            require_auth: vars.flag("REQUIRE_AUTH")?.unwrap_or(defaults.require_auth),
            max_video_duration: vars
                .parse("MAX_VIDEO_DURATION")?
                .unwrap_or(defaults.max_video_duration),
            max_concurrent_tasks: vars
                .parse("MAX_CONCURRENT_TASKS")?
                .unwrap_or(defaults.max_concurrent_tasks),
            max_retained_tasks: vars
                .parse("MAX_RETAINED_TASKS")?
                .unwrap_or(defaults.max_retained_tasks),
            cors_origins: vars
                .get("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: vars.parse("RATE_LIMIT_RPS")?.unwrap_or(defaults.rate_limit_rps),
            max_body_size: vars.parse("MAX_BODY_SIZE")?.unwrap_or(defaults.max_body_size),
            metrics_enabled: vars
                .flag("METRICS_ENABLED")?
                .unwrap_or(defaults.metrics_enabled),
            google_api_key: vars.get("GOOGLE_API_KEY"),
            veo_base_url: vars
                .get("VEO_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.veo_base_url),
            veo_model: vars.get("VEO_MODEL").unwrap_or(defaults.veo_model),
            veo_negative_prompt: vars.get("VEO_NEGATIVE_PROMPT"),
            poll_interval: vars
                .parse("VEO_POLL_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            generation_timeout: vars
                .parse("VEO_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.generation_timeout),
            simulate: vars.flag("VEO_SIMULATE")?.unwrap_or(false),
            simulate_delay: vars
                .parse("VEO_SIMULATE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.simulate_delay),
            storage: SpacesConfig::from_lookup(&lookup),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.simulate && self.google_api_key.is_none() {
            return Err(ConfigError::Missing("GOOGLE_API_KEY"));
        }
        if self.max_video_duration == 0 {
            return Err(invalid("MAX_VIDEO_DURATION", "0", "must be at least 1"));
        }
        if self.max_concurrent_tasks == 0 {
            return Err(invalid("MAX_CONCURRENT_TASKS", "0", "must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("VEO_POLL_INTERVAL_SECS", "0", "must be at least 1"));
        }
        if let Err(e) = Url::parse(&self.veo_base_url) {
            return Err(invalid("VEO_API_BASE_URL", &self.veo_base_url, &e.to_string()));
        }
        if let Some(storage) = &self.storage {
            if let Err(e) = Url::parse(&storage.endpoint_url) {
                return Err(invalid("AWS_S3_ENDPOINT_URL", &storage.endpoint_url, &e.to_string()));
            }
        }
        Ok(())
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn limits(&self) -> GenerationLimits {
        GenerationLimits {
            max_duration: self.max_video_duration,
        }
    }

    /// Veo client configuration. `None` when no Google API key is set.
    pub fn veo_config(&self) -> Option<VeoConfig> {
        let key = self.google_api_key.as_ref()?;
        let mut config = VeoConfig::new(key.clone())
            .with_base_url(self.veo_base_url.clone())
            .with_model(self.veo_model.clone());
        config.negative_prompt = self.veo_negative_prompt.clone();
        Some(config)
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Variable lookup that treats empty values as unset.
struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
        }
    }

    fn flag(&self, name: &'static str) -> Result<Option<bool>, ConfigError> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(invalid(name, &raw, "expected true or false")),
            },
        }
    }
}

//! YAML configuration, read once at startup.
//!
//! ```yaml
//! guardian_api:
//!   api_key: "..."
//!   endpoint: "https://content.guardianapis.com/search"
//!   timeout_secs: 30
//! retry:
//!   max_attempts: 3
//!   base_delay_ms: 5000
//!   max_delay_ms: 300000
//!   jitter_ms: 0
//! ```
//!
//! Every key is optional in the file. The API key may instead come from
//! `--api-key` / `GUARDIAN_API_KEY`, which wins over the file.

use crate::api::RetryPolicy;
use crate::error::ConfigError;
use crate::sources::guardian::DEFAULT_ENDPOINT;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub guardian_api: GuardianApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardianApiConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for GuardianApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for GuardianApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardianApiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            jitter_ms: policy.max_jitter.as_millis() as u64,
        }
    }
}

impl AppConfig {
    /// Read and parse `path`. A missing file is an error.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&raw, path)?;
        info!("Loaded configuration");
        debug!(?config, "Configuration contents");
        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_if_present(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "No config file; using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        // an empty file is a valid, all-defaults config
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The API key, preferring `cli_key` over the file.
    pub fn api_key(&self, cli_key: Option<&str>, path: &Path) -> Result<String, ConfigError> {
        let usable = |k: &str| Some(k.trim()).filter(|k| !k.is_empty()).map(str::to_string);
        cli_key
            .and_then(usable)
            .or_else(|| self.guardian_api.api_key.as_deref().and_then(usable))
            .ok_or_else(|| ConfigError::MissingApiKey {
                path: path.display().to_string(),
            })
    }

    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.guardian_api.endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: self.guardian_api.endpoint.clone(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.guardian_api.timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let retry = &self.retry;
        if retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if retry.max_delay_ms < retry.base_delay_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_ms ({}) is below base_delay_ms ({})",
                retry.max_delay_ms, retry.base_delay_ms
            )));
        }
        Ok(
            RetryPolicy::new(retry.max_attempts, Duration::from_millis(retry.base_delay_ms))
                .with_max_delay(Duration::from_millis(retry.max_delay_ms))
                .with_jitter(Duration::from_millis(retry.jitter_ms)),
        )
    }
}

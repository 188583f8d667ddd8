//! Configuration management for the CRPT client.

use serde::{Deserialize, Serialize};

use crate::ratelimit::TimeWindow;

/// Main configuration for the CRPT client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Registry API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Registry API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the registry
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://ismp.crpt.ru".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per window, must be positive
    #[serde(default = "default_request_limit")]
    pub request_limit: u32,

    /// Window unit the limit applies to
    #[serde(default = "default_window")]
    pub window: TimeWindow,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_limit: default_request_limit(),
            window: default_window(),
        }
    }
}

fn default_request_limit() -> u32 {
    10
}

fn default_window() -> TimeWindow {
    TimeWindow::Second
}

impl ClientConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(contents: &str) -> crate::error::Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(contents)
            .map_err(|e| crate::error::CrptError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the client cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.rate_limit.request_limit == 0 {
            return Err(crate::error::CrptError::Config(
                "rate_limit.request_limit must be positive".to_string(),
            ));
        }
        if self.api.base_url.is_empty() {
            return Err(crate::error::CrptError::Config(
                "api.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::provider::ProviderConfig;

/// Environment variables starting with this prefix override file values,
/// e.g. `MAILGATE_ADDRESS` or `MAILGATE_LIMITS__MAX_RECIPIENTS`.
pub const CONFIG_ENV_PREFIX: &str = "MAILGATE";

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RECIPIENTS: usize = 1000;
pub const DEFAULT_MAX_MAIL_SIZE: u64 = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Mail services are not properly defined in app configuration: at least one provider is required")]
    NoProviders,

    #[error("Unknown mail service found in app configuration: {0}")]
    UnknownService(String),

    #[error("Invalid endpoint for provider #{index}: {reason}")]
    InvalidEndpoint { index: usize, reason: String },

    #[error("Missing api_key for provider #{index}")]
    MissingApiKey { index: usize },

    #[error("Invalid limit: {0} must be greater than zero")]
    InvalidLimit(&'static str),

    #[error("Invalid timeout for {0}: must be greater than zero")]
    InvalidTimeout(String),
}

/// Hard limits applied to every send request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendLimits {
    /// Maximum number of distinct recipients across to, cc and bcc
    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,
    /// Maximum mail size in bytes (subject + body + base64 attachments)
    #[serde(default = "default_max_mail_size")]
    pub max_mail_size: u64,
}

impl Default for SendLimits {
    fn default() -> Self {
        Self {
            max_recipients: DEFAULT_MAX_RECIPIENTS,
            max_mail_size: DEFAULT_MAX_MAIL_SIZE,
        }
    }
}

fn default_max_recipients() -> usize {
    DEFAULT_MAX_RECIPIENTS
}

fn default_max_mail_size() -> u64 {
    DEFAULT_MAX_MAIL_SIZE
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Process-wide gateway configuration, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the HTTP gateway binds to
    #[serde(default = "default_address")]
    pub address: String,

    /// Per-request timeout for provider calls, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub limits: SendLimits,

    /// Providers in failover order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl GatewayConfig {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self {
            address: default_address(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            limits: SendLimits::default(),
            providers,
        }
    }

    /// Load from an optional file (format picked from the extension) with
    /// `MAILGATE_*` environment overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: GatewayConfig = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without environment overrides, then validate.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }

        if self.limits.max_recipients == 0 {
            return Err(ConfigError::InvalidLimit("max_recipients"));
        }
        if self.limits.max_mail_size == 0 {
            return Err(ConfigError::InvalidLimit("max_mail_size"));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("http_timeout_secs".to_string()));
        }

        for (index, provider) in self.providers.iter().enumerate() {
            provider.kind()?;

            if provider.endpoint.trim().is_empty() {
                return Err(ConfigError::InvalidEndpoint {
                    index,
                    reason: "endpoint is blank".to_string(),
                });
            }
            let url = Url::parse(provider.endpoint.trim()).map_err(|e| {
                ConfigError::InvalidEndpoint {
                    index,
                    reason: e.to_string(),
                }
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidEndpoint {
                    index,
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }

            if provider.api_key.trim().is_empty() {
                return Err(ConfigError::MissingApiKey { index });
            }

            if provider.timeout_secs == Some(0) {
                return Err(ConfigError::InvalidTimeout(format!("provider #{}", index)));
            }
        }

        Ok(())
    }
}

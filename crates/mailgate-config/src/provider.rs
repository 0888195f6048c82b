use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::service::ConfigError;

/// Mail services the gateway knows how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// SendGrid v3 mail send (JSON body)
    SendGrid,
    /// MailGun messages API (multipart form)
    MailGun,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::SendGrid => write!(f, "sendgrid"),
            ProviderKind::MailGun => write!(f, "mailgun"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sendgrid" => Ok(ProviderKind::SendGrid),
            "mailgun" => Ok(ProviderKind::MailGun),
            _ => Err(ConfigError::UnknownService(s.to_string())),
        }
    }
}

/// One entry of the ordered provider list.
///
/// `service_name` is kept as written in the file and resolved through
/// [`ProviderConfig::kind`], so a name that slips past validation can still be
/// reported where it is used.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub service_name: String,
    pub endpoint: String,
    pub api_key: String,
    /// Overrides the gateway-wide HTTP timeout for this provider
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            service_name: kind.to_string(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn kind(&self) -> Result<ProviderKind, ConfigError> {
        self.service_name.parse()
    }

    /// Effective request timeout, falling back to the gateway default
    pub fn timeout(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(default_secs))
    }

    pub fn redacted_api_key(&self) -> String {
        let visible: String = self.api_key.chars().take(4).collect();
        if self.api_key.chars().count() <= 8 {
            "****".to_string()
        } else {
            format!("{}****", visible)
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("service_name", &self.service_name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.redacted_api_key())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

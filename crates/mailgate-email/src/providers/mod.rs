//! Mail provider abstractions and implementations

mod mailgun;
mod sendgrid;
mod traits;

#[cfg(test)]
pub mod mock;

pub use mailgun::{MailGunPayload, MailGunProvider};
pub use sendgrid::{
    SendGridAddress, SendGridAttachment, SendGridContent, SendGridMail, SendGridPersonalization,
    SendGridProvider,
};
pub use traits::MailProvider;

#[cfg(test)]
pub use mock::MockMailProvider;

use async_trait::async_trait;
use mailgate_config::{GatewayConfig, ProviderConfig, ProviderKind, SendLimits};
use tracing::error;

use crate::errors::EmailError;
use crate::models::{Attachment, Message};

/// The closed set of provider adapters, built from configuration
pub enum Provider {
    SendGrid(SendGridProvider),
    MailGun(MailGunProvider),
}

impl Provider {
    /// Build the adapter for one configured entry
    pub fn from_config(
        config: &ProviderConfig,
        limits: SendLimits,
        default_timeout_secs: u64,
    ) -> Result<Self, EmailError> {
        let kind = config.kind().map_err(|e| {
            error!("Cannot build mail provider: {}", e);
            EmailError::UnexpectedProvider
        })?;
        let timeout = config.timeout(default_timeout_secs);

        match kind {
            ProviderKind::SendGrid => {
                SendGridProvider::new(config, limits, timeout).map(Provider::SendGrid)
            }
            ProviderKind::MailGun => {
                MailGunProvider::new(config, limits, timeout).map(Provider::MailGun)
            }
        }
    }

    /// Build every configured provider, keeping the configured order
    pub fn all_from_config(config: &GatewayConfig) -> Result<Vec<Self>, EmailError> {
        config
            .providers
            .iter()
            .map(|provider| Self::from_config(provider, config.limits, config.http_timeout_secs))
            .collect()
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Provider::SendGrid(p) => p.endpoint(),
            Provider::MailGun(p) => p.endpoint(),
        }
    }
}

#[async_trait]
impl MailProvider for Provider {
    fn kind(&self) -> ProviderKind {
        match self {
            Provider::SendGrid(p) => p.kind(),
            Provider::MailGun(p) => p.kind(),
        }
    }

    fn limits(&self) -> &SendLimits {
        match self {
            Provider::SendGrid(p) => p.limits(),
            Provider::MailGun(p) => p.limits(),
        }
    }

    async fn send(&self, message: &Message, attachments: &[Attachment]) -> Result<(), EmailError> {
        match self {
            Provider::SendGrid(p) => p.send(message, attachments).await,
            Provider::MailGun(p) => p.send(message, attachments).await,
        }
    }
}

//! Provider failover for a single send request

use mailgate_config::{GatewayConfig, ProviderKind};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::errors::{EmailError, ErrorClass};
use crate::models::{Attachment, Message};
use crate::providers::{MailProvider, Provider};

/// Which provider accepted a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SendReceipt {
    #[schema(value_type = String, example = "sendgrid")]
    pub provider: ProviderKind,
    /// Position of the provider in the configured list
    pub provider_index: usize,
    /// Number of providers tried, including the one that succeeded
    pub attempts: usize,
}

/// Tries each provider in order until one accepts the message.
///
/// Client errors and internal errors end the request at once. Provider
/// errors move on to the next provider, and the last one is returned when
/// every provider failed.
pub struct DispatchService<P = Provider> {
    providers: Vec<P>,
}

impl DispatchService<Provider> {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, EmailError> {
        Self::new(Provider::all_from_config(config)?)
    }
}

impl<P: MailProvider> DispatchService<P> {
    pub fn new(providers: Vec<P>) -> Result<Self, EmailError> {
        if providers.is_empty() {
            error!("No mail providers configured");
            return Err(EmailError::Configuration(
                "provider list is empty".to_string(),
            ));
        }
        Ok(Self { providers })
    }

    pub fn providers(&self) -> &[P] {
        &self.providers
    }

    pub async fn send(
        &self,
        message: &Message,
        attachments: &[Attachment],
    ) -> Result<SendReceipt, EmailError> {
        let mut last_error = None;

        for (index, provider) in self.providers.iter().enumerate() {
            let kind = provider.kind();
            info!(
                "Sending mail through {} (provider {} of {})",
                kind,
                index + 1,
                self.providers.len()
            );

            match provider.send(message, attachments).await {
                Ok(()) => {
                    info!("Mail accepted by {}", kind);
                    return Ok(SendReceipt {
                        provider: kind,
                        provider_index: index,
                        attempts: index + 1,
                    });
                }
                Err(e) => match e.classification() {
                    ErrorClass::Provider => {
                        warn!("{} failed ({}), trying next provider", kind, e.error_code());
                        last_error = Some(e);
                    }
                    ErrorClass::Client | ErrorClass::Internal => {
                        error!("Mail rejected by {}: {}", kind, e);
                        return Err(e);
                    }
                },
            }
        }

        let err = last_error.unwrap_or(EmailError::UnexpectedProvider);
        error!("All mail providers failed, last error: {}", err);
        Err(err)
    }
}

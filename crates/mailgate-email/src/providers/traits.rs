//! Mail provider trait definitions

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use mailgate_config::{ProviderKind, SendLimits};
use tracing::error;

use crate::errors::EmailError;
use crate::models::{Attachment, Message};
use crate::services::{validation_service, SizeLedger};

/// Capability shared by every mail provider adapter
#[async_trait]
pub trait MailProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn limits(&self) -> &SendLimits;

    /// Adapters can be driven directly, so they check the message themselves
    fn validate(&self, message: &Message) -> Result<(), EmailError> {
        validation_service::validate(message, self.limits())
    }

    /// Deliver one message. Only returns once the provider accepted or refused it.
    async fn send(&self, message: &Message, attachments: &[Attachment]) -> Result<(), EmailError>;
}

/// Attachment content checked and charged against the ledger
#[derive(Debug, Clone)]
pub(crate) struct LoadedAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

pub(crate) async fn load_attachment(
    attachment: &Attachment,
    ledger: &mut SizeLedger,
) -> Result<LoadedAttachment, EmailError> {
    let bytes = attachment.read().await.map_err(|e| {
        error!("Failed to read attachment {}: {}", attachment.filename, e);
        EmailError::AttachmentFailed(attachment.filename.clone())
    })?;

    if bytes.is_empty() {
        error!("Attachment {} is empty", attachment.filename);
        return Err(EmailError::InvalidAttachment);
    }

    ledger.add_attachment(bytes.len())?;

    Ok(LoadedAttachment {
        filename: attachment.filename.clone(),
        content_type: attachment.content_type.clone(),
        bytes,
    })
}

/// Map a provider response status onto the gateway outcome
pub(crate) fn classify_status(kind: ProviderKind, status: StatusCode) -> Result<(), EmailError> {
    if status.is_success() {
        return Ok(());
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        error!("{} rejected the credentials ({})", kind, status);
        return Err(EmailError::ProviderAuth { status });
    }

    error!("{} send API failed ({})", kind, status);
    Err(EmailError::ProviderApi { status })
}

/// Map a reqwest failure that happened before a response was received
pub(crate) fn classify_transport_error(kind: ProviderKind, err: &reqwest::Error) -> EmailError {
    error!("Request to {} failed: {}", kind, err);

    if err.is_builder() {
        EmailError::ProviderEncoding
    } else if err.is_connect() || err.is_timeout() {
        EmailError::ProviderUnavailable
    } else {
        EmailError::ProviderProtocol
    }
}

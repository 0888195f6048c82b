//! SendGrid v3 mail send provider implementation

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mailgate_config::{ProviderConfig, ProviderKind, SendLimits};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::traits::{classify_status, classify_transport_error, load_attachment, MailProvider};
use crate::errors::EmailError;
use crate::models::{Address, Attachment, Message};
use crate::services::SizeLedger;

const TEXT_PLAIN: &str = "text/plain";

/// SendGrid provider: JSON body, bearer token auth
pub struct SendGridProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    limits: SendLimits,
}

#[derive(Debug, Serialize)]
pub struct SendGridAddress<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

impl<'a> From<&'a Address> for SendGridAddress<'a> {
    fn from(address: &'a Address) -> Self {
        Self {
            email: &address.email,
            name: address.display_name(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendGridPersonalization<'a> {
    pub to: Vec<SendGridAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<SendGridAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<SendGridAddress<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SendGridContent<'a> {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendGridAttachment {
    /// Base64 encoded file content
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub filename: String,
}

/// Body of `POST /v3/mail/send`
#[derive(Debug, Serialize)]
pub struct SendGridMail<'a> {
    pub from: SendGridAddress<'a>,
    pub personalizations: Vec<SendGridPersonalization<'a>>,
    pub subject: &'a str,
    pub content: Vec<SendGridContent<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SendGridAttachment>,
}

fn addresses(list: &[Address]) -> Vec<SendGridAddress<'_>> {
    list.iter().map(SendGridAddress::from).collect()
}

impl SendGridProvider {
    pub fn new(config: &ProviderConfig, limits: SendLimits, timeout: Duration) -> Result<Self, EmailError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            error!("Failed to create HTTP client for SendGrid: {}", e);
            EmailError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            api_key: config.api_key.clone(),
            limits,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the JSON payload, charging subject, body and attachments to `ledger`
    pub async fn build_payload<'a>(
        &self,
        message: &'a Message,
        attachments: &[Attachment],
        ledger: &mut SizeLedger,
    ) -> Result<SendGridMail<'a>, EmailError> {
        let from = message.from.as_ref().ok_or(EmailError::MissingFrom)?;

        ledger.add_text(&message.subject, &message.body)?;

        let mut encoded = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let loaded = load_attachment(attachment, ledger).await?;
            encoded.push(SendGridAttachment {
                content: STANDARD.encode(&loaded.bytes),
                content_type: loaded.content_type,
                filename: loaded.filename,
            });
        }

        Ok(SendGridMail {
            from: SendGridAddress::from(from),
            personalizations: vec![SendGridPersonalization {
                to: addresses(&message.to),
                cc: addresses(&message.cc),
                bcc: addresses(&message.bcc),
            }],
            subject: &message.subject,
            content: vec![SendGridContent {
                content_type: TEXT_PLAIN,
                value: &message.body,
            }],
            attachments: encoded,
        })
    }
}

#[async_trait]
impl MailProvider for SendGridProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SendGrid
    }

    fn limits(&self) -> &SendLimits {
        &self.limits
    }

    async fn send(&self, message: &Message, attachments: &[Attachment]) -> Result<(), EmailError> {
        self.validate(message)?;

        let mut ledger = SizeLedger::new(self.limits.max_mail_size);
        let mail = self.build_payload(message, attachments, &mut ledger).await?;
        debug!(
            "Built SendGrid payload: {} recipients, {} attachments, {} bytes",
            message.recipients().count(),
            mail.attachments.len(),
            ledger.total()
        );

        let body = serde_json::to_vec(&mail).map_err(|e| {
            error!("Failed to serialize SendGrid payload: {}", e);
            EmailError::ProviderJson
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| classify_transport_error(self.kind(), &e))?;

        classify_status(self.kind(), response.status())?;

        info!("SendGrid accepted the message ({})", response.status());
        Ok(())
    }
}

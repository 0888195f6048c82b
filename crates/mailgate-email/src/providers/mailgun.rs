//! MailGun messages API provider implementation

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mailgate_config::{ProviderConfig, ProviderKind, SendLimits};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

use super::traits::{
    classify_status, classify_transport_error, load_attachment, LoadedAttachment, MailProvider,
};
use crate::errors::EmailError;
use crate::models::{Address, Attachment, Message};
use crate::services::SizeLedger;

/// MailGun provider: multipart form body, basic auth
pub struct MailGunProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    limits: SendLimits,
}

/// Form fields and attachment parts for one MailGun request
#[derive(Debug)]
pub struct MailGunPayload {
    fields: Vec<(&'static str, String)>,
    attachments: Vec<LoadedAttachment>,
}

impl MailGunPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(key, _)| *key).collect()
    }

    pub fn attachment_names(&self) -> Vec<&str> {
        self.attachments.iter().map(|a| a.filename.as_str()).collect()
    }

    fn into_form(self) -> Result<Form, EmailError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        for attachment in self.attachments {
            let len = attachment.bytes.len() as u64;
            let part = Part::stream_with_length(attachment.bytes, len)
                .file_name(attachment.filename.clone())
                .mime_str(&attachment.content_type)
                .map_err(|e| {
                    error!(
                        "Invalid content type {} for attachment {}: {}",
                        attachment.content_type, attachment.filename, e
                    );
                    EmailError::ProviderEncoding
                })?;
            form = form.part("attachment", part);
        }

        Ok(form)
    }
}

fn join_addresses(list: &[Address]) -> String {
    list.iter()
        .map(Address::formatted)
        .collect::<Vec<_>>()
        .join(",")
}

impl MailGunProvider {
    pub fn new(config: &ProviderConfig, limits: SendLimits, timeout: Duration) -> Result<Self, EmailError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            error!("Failed to create HTTP client for MailGun: {}", e);
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

    /// Value of the `Authorization` header
    fn basic_auth(&self) -> String {
        format!("Basic {}", STANDARD.encode(&self.api_key))
    }

    /// Build the form payload, charging subject, body and attachments to `ledger`
    pub async fn build_payload(
        &self,
        message: &Message,
        attachments: &[Attachment],
        ledger: &mut SizeLedger,
    ) -> Result<MailGunPayload, EmailError> {
        let from = message.from.as_ref().ok_or(EmailError::MissingFrom)?;

        let mut fields = vec![
            ("from", from.formatted()),
            ("to", join_addresses(&message.to)),
        ];
        if !message.cc.is_empty() {
            fields.push(("cc", join_addresses(&message.cc)));
        }
        if !message.bcc.is_empty() {
            fields.push(("bcc", join_addresses(&message.bcc)));
        }
        fields.push(("subject", message.subject.clone()));
        fields.push(("text", message.body.clone()));

        ledger.add_text(&message.subject, &message.body)?;

        let mut loaded = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            loaded.push(load_attachment(attachment, ledger).await?);
        }

        Ok(MailGunPayload {
            fields,
            attachments: loaded,
        })
    }
}

#[async_trait]
impl MailProvider for MailGunProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MailGun
    }

    fn limits(&self) -> &SendLimits {
        &self.limits
    }

    async fn send(&self, message: &Message, attachments: &[Attachment]) -> Result<(), EmailError> {
        self.validate(message)?;

        let mut ledger = SizeLedger::new(self.limits.max_mail_size);
        let payload = self.build_payload(message, attachments, &mut ledger).await?;
        debug!(
            "Built MailGun payload: fields {:?}, {} attachments, {} bytes",
            payload.field_names(),
            payload.attachments.len(),
            ledger.total()
        );

        let form = payload.into_form()?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, self.basic_auth())
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_transport_error(self.kind(), &e))?;

        classify_status(self.kind(), response.status())?;

        info!("MailGun accepted the message ({})", response.status());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MailGunProvider {
        let config = ProviderConfig::new(
            ProviderKind::MailGun,
            " https://api.mailgun.net/v3/example.com/messages ",
            "api:key-123",
        );
        MailGunProvider::new(&config, SendLimits::default(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_trimmed_and_basic_auth() {
        let provider = provider();
        assert_eq!(
            provider.endpoint(),
            "https://api.mailgun.net/v3/example.com/messages"
        );
        assert_eq!(provider.basic_auth(), "Basic YXBpOmtleS0xMjM=");
    }

    #[tokio::test]
    async fn test_minimal_payload_omits_empty_lists() {
        let message = Message::new(
            Address::new("a@x.com"),
            vec![Address::new("b@x.com")],
            "S",
            "B",
        );
        let provider = provider();
        let mut ledger = SizeLedger::new(provider.limits.max_mail_size);

        let payload = provider.build_payload(&message, &[], &mut ledger).await.unwrap();

        assert_eq!(payload.field_names(), vec!["from", "to", "subject", "text"]);
        assert_eq!(payload.field("from"), Some("a@x.com"));
        assert_eq!(payload.field("to"), Some("b@x.com"));
        assert_eq!(payload.field("subject"), Some("S"));
        assert_eq!(payload.field("text"), Some("B"));
        assert!(payload.attachment_names().is_empty());
    }

    #[tokio::test]
    async fn test_payload_with_names_lists_and_attachments() {
        let message = Message::new(
            Address::new("a@x.com").with_name("Alice"),
            vec![
                Address::new("b@x.com").with_name("Bob"),
                Address::new("c@x.com"),
            ],
            "S",
            "B",
        )
        .with_cc(vec![Address::new("d@x.com")])
        .with_bcc(vec![Address::new("e@x.com")]);
        let attachments = vec![Attachment::from_bytes("a.txt", "text/plain", b"abc".to_vec())];
        let provider = provider();
        let mut ledger = SizeLedger::new(provider.limits.max_mail_size);

        let payload = provider
            .build_payload(&message, &attachments, &mut ledger)
            .await
            .unwrap();

        assert_eq!(payload.field("from"), Some("Alice <a@x.com>"));
        assert_eq!(payload.field("to"), Some("Bob <b@x.com>,c@x.com"));
        assert_eq!(payload.field("cc"), Some("d@x.com"));
        assert_eq!(payload.field("bcc"), Some("e@x.com"));
        assert_eq!(payload.attachment_names(), vec!["a.txt"]);
        // 2 bytes of text + base64 length of 3 bytes
        assert_eq!(ledger.total(), 2 + 4);
    }

    #[tokio::test]
    async fn test_comma_in_display_name_stays_one_recipient() {
        let message = Message::new(
            Address::new("a@x.com"),
            vec![Address::new("b@x.com").with_name("evil1@attacker.com, evil2@attacker.com, Bob")],
            "S",
            "B",
        )
        .with_cc(vec![Address::new("c@x.com").with_name("Doe, Jane")]);
        let provider = provider();
        let mut ledger = SizeLedger::new(provider.limits.max_mail_size);

        let payload = provider.build_payload(&message, &[], &mut ledger).await.unwrap();

        assert_eq!(
            payload.field("to"),
            Some(r#""evil1@attacker.com, evil2@attacker.com, Bob" <b@x.com>"#)
        );
        assert_eq!(payload.field("cc"), Some(r#""Doe, Jane" <c@x.com>"#));
    }

    #[tokio::test]
    async fn test_size_cap_applies_to_attachments() {
        let config = ProviderConfig::new(
            ProviderKind::MailGun,
            "https://api.mailgun.net/v3/example.com/messages",
            "key",
        );
        let limits = SendLimits {
            max_mail_size: 10,
            ..SendLimits::default()
        };
        let provider = MailGunProvider::new(&config, limits, Duration::from_secs(5)).unwrap();
        let message = Message::new(
            Address::new("a@x.com"),
            vec![Address::new("b@x.com")],
            "S",
            "B",
        );
        let attachments = vec![Attachment::from_bytes("a.bin", "", vec![0u8; 6])];

        let result = provider
            .send(&message, &attachments)
            .await
            .unwrap_err();
        assert_eq!(result, EmailError::MailSizeExceeded { limit: 10 });
    }
}

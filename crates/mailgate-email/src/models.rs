//! Message, address and attachment types accepted by the gateway

use bytes::Bytes;
use lettre::message::Mailbox;
use mime_guess::mime::Mime;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use utoipa::ToSchema;

use crate::errors::RecipientField;

/// A mailbox: optional display name plus address
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(example = "jane@example.com")]
    pub email: String,
}

impl Address {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, ignoring blank ones
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Syntax check against the RFC 5322 addr-spec grammar
    pub fn is_valid(&self) -> bool {
        !self.email.is_empty() && self.email.parse::<lettre::Address>().is_ok()
    }

    /// `Name <email>` when a display name is set, otherwise the bare address.
    /// Names with specials such as `,` or `@` are rendered as a quoted string.
    pub fn formatted(&self) -> String {
        let name = match self.display_name() {
            Some(name) => name,
            None => return self.email.clone(),
        };

        // Line breaks cannot appear in a quoted string
        let name = name.replace(['\r', '\n'], " ");
        match self.email.parse::<lettre::Address>() {
            Ok(email) => Mailbox::new(Some(name), email).to_string(),
            Err(_) => self.email.clone(),
        }
    }
}

/// A single logical send request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Message {
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub to: Vec<Address>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub cc: Vec<Address>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub bcc: Vec<Address>,
    #[serde(default, deserialize_with = "nullable_string")]
    #[schema(example = "Quarterly report")]
    pub subject: String,
    /// Plain-text body
    #[serde(default, rename = "message", alias = "body", deserialize_with = "nullable_string")]
    #[schema(example = "Please find the report attached.")]
    pub body: String,
}

impl Message {
    pub fn new(from: Address, to: Vec<Address>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: Some(from),
            to,
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn with_cc(mut self, cc: Vec<Address>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<Address>) -> Self {
        self.bcc = bcc;
        self
    }

    /// All recipients in to, cc, bcc order, tagged with their list
    pub fn recipients(&self) -> impl Iterator<Item = (RecipientField, &Address)> {
        self.to
            .iter()
            .map(|a| (RecipientField::To, a))
            .chain(self.cc.iter().map(|a| (RecipientField::Cc, a)))
            .chain(self.bcc.iter().map(|a| (RecipientField::Bcc, a)))
    }
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Address>>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
enum AttachmentContent {
    Bytes(Bytes),
    File(PathBuf),
}

/// A file sent along with the message.
///
/// Content is either held in memory (uploads) or read from disk each time a
/// provider builds its payload.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    content: AttachmentContent,
}

impl Attachment {
    pub fn from_bytes(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: normalize_content_type(content_type.into()),
            content: AttachmentContent::Bytes(bytes.into()),
        }
    }

    /// Attachment read lazily from `path`, with the content type guessed from
    /// the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            filename,
            content_type,
            content: AttachmentContent::File(path.to_path_buf()),
        }
    }

    pub async fn read(&self) -> std::io::Result<Bytes> {
        match &self.content {
            AttachmentContent::Bytes(bytes) => Ok(bytes.clone()),
            AttachmentContent::File(path) => tokio::fs::read(path).await.map(Bytes::from),
        }
    }
}

/// Blank or unparseable media types fall back to [`DEFAULT_CONTENT_TYPE`]
fn normalize_content_type(content_type: String) -> String {
    match content_type.trim().parse::<Mime>() {
        Ok(mime) => mime.to_string(),
        Err(_) => {
            if !content_type.trim().is_empty() {
                warn!(
                    "Unrecognised attachment content type {:?}, using {}",
                    content_type, DEFAULT_CONTENT_TYPE
                );
            }
            DEFAULT_CONTENT_TYPE.to_string()
        }
    }
}

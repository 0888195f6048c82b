//! Error types for the mail gateway
//!
//! Every failure carries a classification that drives failover, an HTTP
//! status, and a fixed human-readable message. Transport details are logged
//! where the error is created and never end up in the message.

use http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// How the dispatch engine reacts to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// The request itself is unacceptable; never retried on another provider
    Client,
    /// The provider rejected or could not take an otherwise valid request
    Provider,
    /// A broken invariant inside the gateway
    Internal,
}

impl ErrorClass {
    /// Problem title shared by every error of this class
    pub fn title(&self) -> &'static str {
        match self {
            ErrorClass::Client => "Invalid Email Request",
            ErrorClass::Provider => "Mail Service Failure",
            ErrorClass::Internal => "Mail Gateway Error",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Client => write!(f, "client"),
            ErrorClass::Provider => write!(f, "provider"),
            ErrorClass::Internal => write!(f, "internal"),
        }
    }
}

/// Recipient list an address came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientField {
    To,
    Cc,
    Bcc,
}

impl fmt::Display for RecipientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipientField::To => write!(f, "To"),
            RecipientField::Cc => write!(f, "CC"),
            RecipientField::Bcc => write!(f, "BCC"),
        }
    }
}

const MIB: u64 = 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email parameters are missing in form data. Please provide parameters json to consume this API.")]
    MissingParams,

    #[error("Email parameters are not in the expected format.")]
    InvalidParams,

    #[error("Unexpected issue while parsing the email params.")]
    ParamsReadFailure,

    #[error("From email not given.")]
    MissingFrom,

    #[error("Invalid address specified in From field.")]
    InvalidFrom,

    #[error("To recipients not given.")]
    MissingTo,

    #[error("Invalid address specified in {field} field. {email}")]
    InvalidRecipient { field: RecipientField, email: String },

    #[error("Duplicate recipients mentioned in to, cc or bcc list. {0}")]
    DuplicateRecipient(String),

    #[error("Target recipients crossed the maximum limit.")]
    MaxRecipientsExceeded,

    #[error("Invalid message. Message size should not be 0.")]
    InvalidMessage,

    #[error("Invalid subject. Subject size should not be 0.")]
    InvalidSubject,

    #[error("Invalid attachment. Attachment size should not be 0.")]
    InvalidAttachment,

    #[error("Mail size exceeded. Mail size including subject, message and attachments should not exceed {} MB.", .limit / MIB)]
    MailSizeExceeded { limit: u64 },

    #[error("Unable to attach the file. {0}")]
    AttachmentFailed(String),

    #[error("Authorization issue in connecting with configured mail service.")]
    ProviderAuth { status: StatusCode },

    #[error("Unable to invoke the send API of configured mail service.")]
    ProviderApi { status: StatusCode },

    #[error("Unable to reach the configured mail service.")]
    ProviderUnavailable,

    #[error("Error in the HTTP protocol used to connect with configured mail service.")]
    ProviderProtocol,

    #[error("Error in the encoding used in connection with configured mail service.")]
    ProviderEncoding,

    #[error("Failure in forming the input to configured mail service.")]
    ProviderJson,

    #[error("Unexpected error in selecting the mail service.")]
    UnexpectedProvider,

    #[error("Mail services are not properly defined in app configuration.")]
    Configuration(String),
}

impl EmailError {
    pub fn classification(&self) -> ErrorClass {
        match self {
            EmailError::MissingParams
            | EmailError::InvalidParams
            | EmailError::MissingFrom
            | EmailError::InvalidFrom
            | EmailError::MissingTo
            | EmailError::InvalidRecipient { .. }
            | EmailError::DuplicateRecipient(_)
            | EmailError::MaxRecipientsExceeded
            | EmailError::InvalidMessage
            | EmailError::InvalidSubject
            | EmailError::InvalidAttachment
            | EmailError::MailSizeExceeded { .. } => ErrorClass::Client,

            EmailError::AttachmentFailed(_)
            | EmailError::ProviderAuth { .. }
            | EmailError::ProviderApi { .. }
            | EmailError::ProviderUnavailable
            | EmailError::ProviderProtocol
            | EmailError::ProviderEncoding
            | EmailError::ProviderJson => ErrorClass::Provider,

            EmailError::ParamsReadFailure
            | EmailError::UnexpectedProvider
            | EmailError::Configuration(_) => ErrorClass::Internal,
        }
    }

    /// Whether the dispatch engine should move on to the next provider
    pub fn is_retryable(&self) -> bool {
        self.classification() == ErrorClass::Provider
    }

    /// Status reported to the caller. Provider rejections pass the upstream
    /// status through.
    pub fn status(&self) -> StatusCode {
        match self {
            EmailError::ProviderAuth { status } | EmailError::ProviderApi { status } => *status,
            EmailError::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => match self.classification() {
                ErrorClass::Client => StatusCode::BAD_REQUEST,
                ErrorClass::Provider | ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Stable machine-readable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            EmailError::MissingParams => "MISSING_PARAMS",
            EmailError::InvalidParams => "INVALID_PARAMS",
            EmailError::ParamsReadFailure => "PARAMS_READ_FAILURE",
            EmailError::MissingFrom => "MISSING_FROM",
            EmailError::InvalidFrom => "INVALID_FROM",
            EmailError::MissingTo => "MISSING_TO",
            EmailError::InvalidRecipient { .. } => "INVALID_RECIPIENT",
            EmailError::DuplicateRecipient(_) => "DUPLICATE_RECIPIENT",
            EmailError::MaxRecipientsExceeded => "MAX_RECIPIENTS_EXCEEDED",
            EmailError::InvalidMessage => "INVALID_MESSAGE",
            EmailError::InvalidSubject => "INVALID_SUBJECT",
            EmailError::InvalidAttachment => "INVALID_ATTACHMENT",
            EmailError::MailSizeExceeded { .. } => "MAIL_SIZE_EXCEEDED",
            EmailError::AttachmentFailed(_) => "ATTACHMENT_FAILED",
            EmailError::ProviderAuth { .. } => "PROVIDER_AUTH_FAILURE",
            EmailError::ProviderApi { .. } => "PROVIDER_API_FAILURE",
            EmailError::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            EmailError::ProviderProtocol => "PROVIDER_PROTOCOL_FAILURE",
            EmailError::ProviderEncoding => "PROVIDER_ENCODING_FAILURE",
            EmailError::ProviderJson => "PROVIDER_JSON_FAILURE",
            EmailError::UnexpectedProvider => "UNEXPECTED_PROVIDER",
            EmailError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

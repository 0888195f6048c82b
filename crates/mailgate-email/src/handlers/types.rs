//! Handler types for the mail gateway

use mailgate_config::SendLimits;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::services::DispatchService;

/// Slack on top of the mail size cap for multipart framing and the params part
const BODY_LIMIT_OVERHEAD: usize = 1024 * 1024;

/// Application state for mail handlers
pub struct AppState {
    pub dispatch_service: Arc<DispatchService>,
    pub limits: SendLimits,
}

impl AppState {
    pub fn new(dispatch_service: Arc<DispatchService>, limits: SendLimits) -> Self {
        Self {
            dispatch_service,
            limits,
        }
    }

    /// Largest request body accepted on `POST /emails`
    pub fn max_body_bytes(&self) -> usize {
        usize::try_from(self.limits.max_mail_size)
            .unwrap_or(usize::MAX)
            .saturating_add(BODY_LIMIT_OVERHEAD)
    }
}

/// Multipart form accepted by `POST /emails`
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SendEmailForm {
    /// JSON encoded [`Message`](crate::models::Message)
    #[schema(example = r#"{"from":{"email":"a@x.com"},"to":[{"email":"b@x.com"}],"subject":"S","message":"B"}"#)]
    pub email_params: String,
    /// Files to attach, one part each
    #[schema(value_type = Vec<String>)]
    pub attachments: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendEmailResponseBody {
    #[schema(example = 202)]
    pub status: u16,
    #[schema(example = "Successfully Queued.")]
    pub message: String,
    /// Provider that accepted the message
    #[schema(example = "sendgrid")]
    pub provider: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Number of configured providers
    pub providers: usize,
}

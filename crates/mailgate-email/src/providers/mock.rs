//! Mock mail provider for testing

use async_trait::async_trait;
use mailgate_config::{ProviderKind, SendLimits};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::EmailError;
use crate::models::{Attachment, Message};
use crate::providers::MailProvider;

/// Mock mail provider for testing
#[derive(Debug, Clone)]
pub struct MockMailProvider {
    /// Counter for tracking calls
    pub send_count: Arc<AtomicUsize>,

    /// Configurable response
    pub send_result: Result<(), EmailError>,
    pub kind: ProviderKind,
    pub limits: SendLimits,
}

impl Default for MockMailProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMailProvider {
    pub fn new() -> Self {
        Self {
            send_count: Arc::new(AtomicUsize::new(0)),
            send_result: Ok(()),
            kind: ProviderKind::SendGrid,
            limits: SendLimits::default(),
        }
    }

    pub fn with_send_failure(mut self, err: EmailError) -> Self {
        self.send_result = Err(err);
        self
    }

    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn send_call_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailProvider for MockMailProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn limits(&self) -> &SendLimits {
        &self.limits
    }

    async fn send(&self, message: &Message, _attachments: &[Attachment]) -> Result<(), EmailError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.validate(message)?;
        self.send_result.clone()
    }
}

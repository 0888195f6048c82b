use tracing::error;

use crate::errors::EmailError;

/// Running size of one send attempt.
///
/// Attachments are charged at their base64 length so the cap means the same
/// thing for providers that take raw multipart parts and providers that take
/// base64 strings. A ledger belongs to a single provider attempt.
#[derive(Debug)]
pub struct SizeLedger {
    total: u64,
    limit: u64,
}

impl SizeLedger {
    pub fn new(limit: u64) -> Self {
        Self { total: 0, limit }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn add(&mut self, bytes: u64) -> Result<(), EmailError> {
        self.total = self.total.saturating_add(bytes);

        if self.total >= self.limit {
            error!(
                "Mail size {} reached the limit of {} bytes",
                self.total, self.limit
            );
            return Err(EmailError::MailSizeExceeded { limit: self.limit });
        }
        Ok(())
    }

    pub fn add_text(&mut self, subject: &str, body: &str) -> Result<(), EmailError> {
        self.add((subject.len() + body.len()) as u64)
    }

    /// Charge an attachment of `raw_len` bytes at its encoded size
    pub fn add_attachment(&mut self, raw_len: usize) -> Result<(), EmailError> {
        self.add(base64_len(raw_len))
    }
}

/// Length of the padded standard base64 encoding of `raw_len` bytes
pub fn base64_len(raw_len: usize) -> u64 {
    base64::encoded_len(raw_len, true)
        .map(|len| len as u64)
        .unwrap_or(u64::MAX)
}

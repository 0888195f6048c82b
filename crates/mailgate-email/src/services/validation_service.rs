//! Message validation shared by every provider adapter.
//!
//! Checks run in a fixed order and stop at the first violation, so the
//! caller always gets the earliest problem in the request.

use mailgate_config::SendLimits;
use std::collections::HashSet;
use tracing::error;

use crate::errors::EmailError;
use crate::models::Message;

pub fn validate(message: &Message, limits: &SendLimits) -> Result<(), EmailError> {
    validate_addresses(message, limits)
        .and_then(|_| validate_content(message))
        .inspect_err(|e| error!("Email validation failed: {}", e))
}

fn validate_addresses(message: &Message, limits: &SendLimits) -> Result<(), EmailError> {
    let from = message.from.as_ref().ok_or(EmailError::MissingFrom)?;
    if !from.is_valid() {
        return Err(EmailError::InvalidFrom);
    }

    if message.to.is_empty() {
        return Err(EmailError::MissingTo);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (field, address) in message.recipients() {
        if !address.is_valid() {
            return Err(EmailError::InvalidRecipient {
                field,
                email: address.email.clone(),
            });
        }

        if !seen.insert(address.email.as_str()) {
            return Err(EmailError::DuplicateRecipient(address.email.clone()));
        }

        if seen.len() > limits.max_recipients {
            return Err(EmailError::MaxRecipientsExceeded);
        }
    }

    Ok(())
}

fn validate_content(message: &Message) -> Result<(), EmailError> {
    if message.body.is_empty() {
        return Err(EmailError::InvalidMessage);
    }
    if message.subject.is_empty() {
        return Err(EmailError::InvalidSubject);
    }
    Ok(())
}

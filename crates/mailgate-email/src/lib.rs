//! Mail gateway with provider failover
//!
//! A message is validated, then offered to each configured provider in
//! order until one accepts it:
//! - SendGrid (JSON, bearer token)
//! - MailGun (multipart form, basic auth)
//!
//! Invalid requests stop at the first provider; provider failures move on to
//! the next one.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod services;

// Re-export main types
pub use errors::{EmailError, ErrorClass, RecipientField};
pub use models::{Address, Attachment, Message};
pub use providers::{MailGunProvider, MailProvider, Provider, SendGridProvider};
pub use services::{DispatchService, SendReceipt, SizeLedger};

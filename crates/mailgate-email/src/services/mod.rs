//! Mail services

mod dispatch_service;
mod size_ledger;
pub mod validation_service;

pub use dispatch_service::{DispatchService, SendReceipt};
pub use size_ledger::{base64_len, SizeLedger};

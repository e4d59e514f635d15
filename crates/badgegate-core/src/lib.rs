pub mod attempt;
pub mod collaborators;
pub mod constants;
pub mod error;
pub mod messages;
pub mod notification;
pub mod types;

pub use attempt::{AttemptOutcome, AttemptRecord, TransactionReceipt, format_cents};
pub use collaborators::{AuditLog, CredentialVerifier, ReceiptEmitter};
pub use error::{Error, Result};
pub use messages::AttemptMessages;
pub use notification::OutboundNotification;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

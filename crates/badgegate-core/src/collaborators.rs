//! Collaborators the coordinator calls once an attempt is submitted.
//!
//! All three traits return `Send` futures so the finalizer can run on a
//! spawned task. Implementations are free to write `async fn`.
//!
//! # Example
//!
//! ```
//! use badgegate_core::{CardId, CredentialVerifier, Pin};
//! use std::convert::Infallible;
//!
//! struct AllowAll;
//!
//! impl CredentialVerifier for AllowAll {
//!     type Error = Infallible;
//!
//!     async fn verify(&self, _card_id: &CardId, _pin: &Pin) -> Result<bool, Infallible> {
//!         Ok(true)
//!     }
//! }
//! ```

use crate::attempt::{AttemptRecord, TransactionReceipt};
use crate::types::{CardId, Pin};
use std::future::Future;
use std::sync::Arc;

/// Checks a card/PIN pair against the credential store.
///
/// Must be safe to call concurrently and holds no session state.
pub trait CredentialVerifier: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `Ok(true)` when the pair matches an enrolled credential.
    fn verify(
        &self,
        card_id: &CardId,
        pin: &Pin,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// Append-only record of resolved attempts.
pub trait AuditLog: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn append(&self, record: &AttemptRecord)
    -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Paper (or paper-like) receipts.
pub trait ReceiptEmitter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Receipt for a resolved authentication attempt.
    fn emit_attempt_receipt(
        &self,
        record: &AttemptRecord,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receipt for a balance inquiry or withdrawal.
    fn emit_transaction_receipt(
        &self,
        receipt: &TransactionReceipt,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<T: CredentialVerifier> CredentialVerifier for Arc<T> {
    type Error = T::Error;

    fn verify(
        &self,
        card_id: &CardId,
        pin: &Pin,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        (**self).verify(card_id, pin)
    }
}

impl<T: AuditLog> AuditLog for Arc<T> {
    type Error = T::Error;

    fn append(
        &self,
        record: &AttemptRecord,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).append(record)
    }
}

impl<T: ReceiptEmitter> ReceiptEmitter for Arc<T> {
    type Error = T::Error;

    fn emit_attempt_receipt(
        &self,
        record: &AttemptRecord,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).emit_attempt_receipt(record)
    }

    fn emit_transaction_receipt(
        &self,
        receipt: &TransactionReceipt,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).emit_transaction_receipt(receipt)
    }
}

//! Attempt finalization: verify, record, print, notify.

use crate::session::PendingAttempt;
use crate::sink::EventSink;
use badgegate_core::{
    AttemptOutcome, AttemptRecord, AuditLog, CredentialVerifier, Error, OutboundNotification,
    ReceiptEmitter,
};
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// Runs the side effects of a submitted attempt.
///
/// Steps run in a fixed order, each at most once: verify the credential,
/// append the audit record, emit the receipt, publish `AttemptResolved`.
/// Audit and receipt failures are logged and skipped. A verifier failure
/// resolves the attempt as [`AttemptOutcome::VerifierUnavailable`].
#[derive(Debug)]
pub struct AttemptFinalizer<V, A, R> {
    verifier: V,
    audit: A,
    receipts: R,
    sink: EventSink,
    collaborator_timeout: Option<Duration>,
}

impl<V, A, R> AttemptFinalizer<V, A, R>
where
    V: CredentialVerifier,
    A: AuditLog,
    R: ReceiptEmitter,
{
    pub fn new(verifier: V, audit: A, receipts: R, sink: EventSink) -> Self {
        Self {
            verifier,
            audit,
            receipts,
            sink,
            collaborator_timeout: None,
        }
    }

    /// Bound every collaborator call by `timeout`.
    pub fn with_collaborator_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn receipts(&self) -> &R {
        &self.receipts
    }

    /// Finalize one attempt. Never fails.
    pub async fn finalize(&self, attempt: PendingAttempt) -> AttemptRecord {
        let card_id = attempt.card_id();

        let outcome = match self
            .bounded("verify", self.verifier.verify(card_id, attempt.pin()))
            .await
        {
            Ok(Ok(true)) => AttemptOutcome::Granted,
            Ok(Ok(false)) => AttemptOutcome::Denied,
            Ok(Err(e)) => {
                error!(card_id = %card_id, error = %e, "Credential verification failed");
                AttemptOutcome::VerifierUnavailable
            }
            Err(e) => {
                error!(card_id = %card_id, error = %e, "Credential verification failed");
                AttemptOutcome::VerifierUnavailable
            }
        };

        let record = AttemptRecord::new(card_id.clone(), outcome, Utc::now());

        match self.bounded("audit append", self.audit.append(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(card_id = %card_id, error = %e, "Failed to record attempt"),
            Err(e) => warn!(card_id = %card_id, error = %e, "Failed to record attempt"),
        }

        match self
            .bounded("receipt", self.receipts.emit_attempt_receipt(&record))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(card_id = %card_id, error = %e, "Failed to print receipt"),
            Err(e) => warn!(card_id = %card_id, error = %e, "Failed to print receipt"),
        }

        self.sink.publish(OutboundNotification::resolved(&record));

        info!(
            card_id = %card_id,
            outcome = %record.outcome(),
            success = record.success(),
            "Authentication attempt resolved"
        );

        record
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = T>,
    ) -> Result<T, Error> {
        match self.collaborator_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::Timeout {
                    operation,
                    duration_ms: limit.as_millis() as u64,
                }),
            None => Ok(call.await),
        }
    }
}

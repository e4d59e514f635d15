//! Resolved authentication attempts and receipt payloads.
//!
//! An [`AttemptRecord`] is created exactly once per finalized session and then
//! handed, unchanged, to the audit log, the receipt emitter and (in reduced
//! form) the UI notification channel.

use crate::messages::AttemptMessages;
use crate::types::CardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a finalized attempt was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The credential store confirmed the card and PIN.
    Granted,

    /// The credential store answered and the PIN did not match.
    Denied,

    /// The credential store failed or timed out; access is not granted.
    VerifierUnavailable,
}

impl AttemptOutcome {
    /// Whether access was granted.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// The user-facing message for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Granted => AttemptMessages::ACCESS_GRANTED,
            Self::Denied => AttemptMessages::INVALID_PIN,
            Self::VerifierUnavailable => AttemptMessages::VERIFICATION_UNAVAILABLE,
        }
    }

    /// Stable code used when persisting the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::VerifierUnavailable => "verifier_unavailable",
        }
    }

    /// Parse a persisted outcome code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "granted" => Some(Self::Granted),
            "denied" => Some(Self::Denied),
            "verifier_unavailable" => Some(Self::VerifierUnavailable),
            _ => None,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable result of a finalized session.
///
/// Fields are private so a record cannot be altered between the audit log
/// and the receipt; `success` and `message` are derived from the outcome.
///
/// # Examples
///
/// ```
/// use badgegate_core::{AttemptOutcome, AttemptRecord, CardId};
/// use chrono::Utc;
///
/// let record = AttemptRecord::new(CardId::new("A1").unwrap(), AttemptOutcome::Granted, Utc::now());
/// assert!(record.success());
/// assert_eq!(record.message(), "Access granted");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct AttemptRecord {
    card_id: CardId,
    success: bool,
    message: String,
    outcome: AttemptOutcome,
    timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    /// Create a record for the given card and outcome.
    pub fn new(card_id: CardId, outcome: AttemptOutcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            card_id,
            success: outcome.is_success(),
            message: outcome.message().to_string(),
            outcome,
            timestamp,
        }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn outcome(&self) -> AttemptOutcome {
        self.outcome
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Wire form of [`AttemptRecord`]; checked against the outcome on the way in.
#[derive(Deserialize)]
struct RecordFields {
    card_id: CardId,
    success: bool,
    message: String,
    outcome: AttemptOutcome,
    timestamp: DateTime<Utc>,
}

impl TryFrom<RecordFields> for AttemptRecord {
    type Error = String;

    fn try_from(fields: RecordFields) -> Result<Self, String> {
        let record = AttemptRecord::new(fields.card_id, fields.outcome, fields.timestamp);
        if record.success != fields.success || record.message != fields.message {
            return Err(format!(
                "success/message do not match outcome {}",
                record.outcome
            ));
        }
        Ok(record)
    }
}

/// Payload for a balance inquiry or withdrawal receipt.
///
/// Amounts are in cents to avoid floating point rounding on printed totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Account identifier or card id.
    pub account_id: String,

    /// Receipt heading (e.g. "Withdrawal", "Balance Inquiry").
    pub title: String,

    /// Transaction amount in cents (0 for a balance inquiry).
    pub amount_cents: i64,

    /// Balance after the transaction, in cents.
    pub balance_cents: i64,

    pub timestamp: DateTime<Utc>,
}

impl TransactionReceipt {
    pub fn new(
        account_id: impl Into<String>,
        title: impl Into<String>,
        amount_cents: i64,
        balance_cents: i64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            title: title.into(),
            amount_cents,
            balance_cents,
            timestamp: Utc::now(),
        }
    }
}

/// Format an amount in cents as `$1234.56` (negative as `-$1.00`).
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

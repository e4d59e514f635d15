use crate::error::{StorageError, StorageResult};
use badgegate_core::{AttemptOutcome, AttemptRecord, CardId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of the `access_logs` audit trail.
///
/// Written once per finalized attempt, granted or not. `timestamp` is when
/// the attempt was resolved; `created_at` is when the row was written.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AccessLog {
    pub id: i64,

    pub card_id: String,

    pub success: bool,

    /// Message shown to the user, e.g. "Access granted".
    pub message: String,

    /// Persisted [`AttemptOutcome`] code.
    pub outcome: String,

    pub timestamp: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl AccessLog {
    pub fn was_granted(&self) -> bool {
        self.success
    }

    /// Rebuild the attempt record this row was written from.
    ///
    /// # Errors
    ///
    /// `StorageError::Corrupted` if the card id or outcome code no longer
    /// parses.
    pub fn to_record(&self) -> StorageResult<AttemptRecord> {
        let card_id = CardId::new(&self.card_id)
            .map_err(|e| StorageError::corrupted("access_logs", e.to_string()))?;

        let outcome = AttemptOutcome::from_code(&self.outcome).ok_or_else(|| {
            StorageError::corrupted("access_logs", format!("unknown outcome '{}'", self.outcome))
        })?;

        Ok(AttemptRecord::new(card_id, outcome, self.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(card_id: &str, outcome: &str) -> AccessLog {
        AccessLog {
            id: 7,
            card_id: card_id.to_string(),
            success: outcome == "granted",
            message: "Access granted".to_string(),
            outcome: outcome.to_string(),
            timestamp: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("granted", AttemptOutcome::Granted)]
    #[case("denied", AttemptOutcome::Denied)]
    #[case("verifier_unavailable", AttemptOutcome::VerifierUnavailable)]
    fn test_to_record(#[case] code: &str, #[case] expected: AttemptOutcome) {
        let log = row("A1", code);
        let record = log.to_record().unwrap();

        assert_eq!(record.card_id().as_str(), "A1");
        assert_eq!(record.outcome(), expected);
        assert_eq!(record.timestamp(), log.timestamp);
        assert_eq!(log.was_granted(), expected.is_success());
    }

    #[test]
    fn test_to_record_rejects_unknown_outcome() {
        let err = row("A1", "maybe").to_record().unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { table: "access_logs", .. }));
    }

    #[test]
    fn test_to_record_rejects_bad_card_id() {
        assert!(row("", "granted").to_record().is_err());
    }
}

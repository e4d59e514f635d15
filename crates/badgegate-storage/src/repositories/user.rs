#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{User, hash_pin};
use badgegate_core::constants::MIN_PIN_LENGTH;
use badgegate_core::{CardId, CredentialVerifier, Pin};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Enrolled card/PIN pairs.
pub trait UserRepository: Send + Sync {
    /// Enroll a card with its PIN.
    ///
    /// Returns `Ok(false)` if the card is already enrolled; the existing
    /// PIN is left untouched.
    ///
    /// # Errors
    ///
    /// `StorageError::Validation` if the PIN is shorter than
    /// `MIN_PIN_LENGTH` digits.
    async fn add_user(&self, card_id: &CardId, pin: &Pin) -> StorageResult<bool>;

    async fn find_by_card(&self, card_id: &CardId) -> StorageResult<Option<User>>;

    /// Whether `pin` matches the PIN enrolled for `card_id`.
    ///
    /// Unknown cards never match.
    async fn verify_pin(&self, card_id: &CardId, pin: &Pin) -> StorageResult<bool>;

    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of UserRepository
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn add_user(&self, card_id: &CardId, pin: &Pin) -> StorageResult<bool> {
        if pin.len() < MIN_PIN_LENGTH {
            return Err(StorageError::validation(format!(
                "PIN must be at least {MIN_PIN_LENGTH} digits"
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (card_id, pin_hash)
            VALUES (?, ?)
            ON CONFLICT (card_id) DO NOTHING
            "#,
        )
        .bind(card_id.as_str())
        .bind(hash_pin(pin))
        .execute(&self.pool)
        .await?;

        let added = result.rows_affected() == 1;
        if added {
            info!(card_id = %card_id, "User enrolled");
        } else {
            info!(card_id = %card_id, "Card already enrolled");
        }

        Ok(added)
    }

    async fn find_by_card(&self, card_id: &CardId) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, card_id, pin_hash, created_at
            FROM users
            WHERE card_id = ?
            "#,
        )
        .bind(card_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn verify_pin(&self, card_id: &CardId, pin: &Pin) -> StorageResult<bool> {
        let Some(user) = self.find_by_card(card_id).await? else {
            debug!(card_id = %card_id, "Card not enrolled");
            return Ok(false);
        };

        Ok(user.verify_pin(pin))
    }

    async fn count(&self) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }
}

impl CredentialVerifier for SqliteUserRepository {
    type Error = StorageError;

    async fn verify(&self, card_id: &CardId, pin: &Pin) -> StorageResult<bool> {
        self.verify_pin(card_id, pin).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use rstest::rstest;

    async fn setup() -> (Database, SqliteUserRepository) {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteUserRepository::new(db.pool().clone());
        (db, repo)
    }

    fn card(id: &str) -> CardId {
        CardId::new(id).unwrap()
    }

    fn pin(digits: &str) -> Pin {
        Pin::new(digits).unwrap()
    }

    #[tokio::test]
    async fn test_add_and_find_user() {
        let (_db, repo) = setup().await;

        assert!(repo.add_user(&card("A1"), &pin("1357")).await.unwrap());

        let user = repo.find_by_card(&card("A1")).await.unwrap().unwrap();
        assert_eq!(user.card_id, "A1");
        assert_eq!(user.pin_hash, hash_pin(&pin("1357")));
        assert!(user.id > 0);
    }

    #[tokio::test]
    async fn test_duplicate_card_is_not_added() {
        let (_db, repo) = setup().await;

        assert!(repo.add_user(&card("A1"), &pin("1357")).await.unwrap());
        assert!(!repo.add_user(&card("A1"), &pin("8642")).await.unwrap());

        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.verify_pin(&card("A1"), &pin("1357")).await.unwrap());
        assert!(!repo.verify_pin(&card("A1"), &pin("8642")).await.unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("1")]
    #[case("123")]
    #[tokio::test]
    async fn test_short_pin_is_rejected(#[case] digits: &str) {
        let (_db, repo) = setup().await;

        let err = repo.add_user(&card("A1"), &pin(digits)).await.unwrap_err();

        assert!(matches!(err, StorageError::Validation(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_verify_pin() {
        let (_db, repo) = setup().await;
        repo.add_user(&card("B2"), &pin("2468")).await.unwrap();

        assert!(repo.verify_pin(&card("B2"), &pin("2468")).await.unwrap());
        assert!(!repo.verify_pin(&card("B2"), &pin("2460")).await.unwrap());
        assert!(!repo.verify_pin(&card("B2"), &Pin::default()).await.unwrap());
        assert!(!repo.verify_pin(&card("ZZ"), &pin("2468")).await.unwrap());
    }

    #[tokio::test]
    async fn test_credential_verifier_impl() {
        let (_db, repo) = setup().await;
        repo.add_user(&card("B2"), &pin("2468")).await.unwrap();

        assert!(CredentialVerifier::verify(&repo, &card("B2"), &pin("2468")).await.unwrap());
        assert!(!CredentialVerifier::verify(&repo, &card("B2"), &pin("1111")).await.unwrap());
    }

    #[tokio::test]
    async fn test_card_ids_are_case_sensitive() {
        let (_db, repo) = setup().await;
        repo.add_user(&card("abc1"), &pin("1234")).await.unwrap();

        assert!(repo.find_by_card(&card("ABC1")).await.unwrap().is_none());
        assert!(repo.add_user(&card("ABC1"), &pin("1234")).await.unwrap());
    }
}

use badgegate_core::Pin;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Enrolled card and the hash of its PIN.
///
/// Maps to the `users` table. `card_id` is unique; the PIN itself is never
/// stored, only its SHA-256 digest as lowercase hex.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    pub card_id: String,

    #[serde(skip_serializing)]
    pub pin_hash: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check `pin` against the stored hash.
    ///
    /// # Security
    ///
    /// The comparison is constant-time via the `subtle` crate.
    ///
    /// ```
    /// use badgegate_core::Pin;
    /// use badgegate_storage::models::{User, hash_pin};
    /// use chrono::Utc;
    ///
    /// let user = User {
    ///     id: 1,
    ///     card_id: "A1".to_string(),
    ///     pin_hash: hash_pin(&Pin::new("1357").unwrap()),
    ///     created_at: Utc::now(),
    /// };
    ///
    /// assert!(user.verify_pin(&Pin::new("1357").unwrap()));
    /// assert!(!user.verify_pin(&Pin::new("1358").unwrap()));
    /// ```
    pub fn verify_pin(&self, pin: &Pin) -> bool {
        let candidate = hash_pin(pin);
        candidate.as_bytes().ct_eq(self.pin_hash.as_bytes()).into()
    }
}

/// SHA-256 of the PIN digits, lowercase hex.
pub fn hash_pin(pin: &Pin) -> String {
    hex::encode(Sha256::digest(pin.as_str().as_bytes()))
}

//! SQLite persistence for the badge + PIN appliance.
//!
//! - [`Database`]: connection pool with embedded migrations.
//! - [`SqliteUserRepository`]: enrolled cards and PIN hashes; also the
//!   appliance's [`CredentialVerifier`](badgegate_core::CredentialVerifier).
//! - [`SqliteAccessLogRepository`]: the audit trail; also the appliance's
//!   [`AuditLog`](badgegate_core::AuditLog).
//!
//! # Example
//!
//! ```no_run
//! use badgegate_core::{CardId, Pin};
//! use badgegate_storage::{Database, DatabaseConfig, SqliteUserRepository, UserRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("app.db")).await?;
//! let users = SqliteUserRepository::new(db.pool().clone());
//!
//! users.add_user(&CardId::new("04A1B2C3")?, &Pin::new("1357")?).await?;
//! assert!(users.verify_pin(&CardId::new("04A1B2C3")?, &Pin::new("1357")?).await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! PINs are stored as SHA-256 digests and compared in constant time via the
//! `subtle` crate. All queries are parameterized.

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AccessLog, User};
pub use repositories::{
    AccessLogRepository, SqliteAccessLogRepository, SqliteUserRepository, UserRepository,
};

#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::AccessLog;
use badgegate_core::{AttemptRecord, AuditLog, CardId};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

/// Append-only audit trail of finalized attempts.
pub trait AccessLogRepository: Send + Sync {
    /// Persist one attempt and return its row id.
    async fn create(&self, record: &AttemptRecord) -> StorageResult<i64>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Most recent entries for one card, newest first.
    async fn find_by_card(&self, card_id: &CardId, limit: i64) -> StorageResult<Vec<AccessLog>>;

    /// Failed attempts for `card_id` at or after `since`.
    async fn count_denied_by_card(
        &self,
        card_id: &CardId,
        since: DateTime<Utc>,
    ) -> StorageResult<i64>;
}

/// SQLite implementation of AccessLogRepository
#[derive(Debug, Clone)]
pub struct SqliteAccessLogRepository {
    pool: SqlitePool,
}

impl SqliteAccessLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessLogRepository for SqliteAccessLogRepository {
    async fn create(&self, record: &AttemptRecord) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_logs (card_id, success, message, outcome, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.card_id().as_str())
        .bind(record.success())
        .bind(record.message())
        .bind(record.outcome().as_str())
        .bind(record.timestamp())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, card_id = %record.card_id(), outcome = %record.outcome(), "Access log written");
        Ok(id)
    }

    async fn recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, card_id, success, message, outcome, timestamp, created_at
            FROM access_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_card(&self, card_id: &CardId, limit: i64) -> StorageResult<Vec<AccessLog>> {
        let logs = sqlx::query_as::<_, AccessLog>(
            r#"
            SELECT id, card_id, success, message, outcome, timestamp, created_at
            FROM access_logs
            WHERE card_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(card_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_denied_by_card(
        &self,
        card_id: &CardId,
        since: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM access_logs WHERE card_id = ? AND success = 0 AND timestamp >= ?",
        )
        .bind(card_id.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}

impl AuditLog for SqliteAccessLogRepository {
    type Error = StorageError;

    async fn append(&self, record: &AttemptRecord) -> StorageResult<()> {
        self.create(record).await.map(|_| ())
    }
}

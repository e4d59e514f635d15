//! Integration tests for the database connection and the two repositories
//! working against the same pool.

use badgegate_core::{AttemptOutcome, AttemptRecord, AuditLog, CardId, CredentialVerifier, Pin};
use badgegate_storage::{
    AccessLogRepository, Database, DatabaseConfig, SqliteAccessLogRepository,
    SqliteUserRepository, UserRepository,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('users', 'access_logs')",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 2);

    db.close().await;
}

#[tokio::test]
async fn test_file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("app.db");
    let config = DatabaseConfig::new(path.to_string_lossy().to_string());

    let card = CardId::new("04A1B2C3").unwrap();
    let pin = Pin::new("1357").unwrap();

    {
        let db = Database::new(config.clone()).await.unwrap();
        let users = SqliteUserRepository::new(db.pool().clone());
        assert!(users.add_user(&card, &pin).await.unwrap());
        db.close().await;
    }

    let db = Database::new(config).await.unwrap();
    let users = SqliteUserRepository::new(db.pool().clone());
    assert!(users.verify_pin(&card, &pin).await.unwrap());
    assert_eq!(users.count().await.unwrap(), 1);
    db.close().await;
}

#[tokio::test]
async fn test_concurrent_audit_appends() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::new(dir.path().join("app.db").to_string_lossy().to_string());
    let db = Database::new(config).await.unwrap();
    let audit = Arc::new(SqliteAccessLogRepository::new(db.pool().clone()));

    const NUM_CONCURRENT_TASKS: usize = 10;
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let mut handles = vec![];
    for i in 0..NUM_CONCURRENT_TASKS {
        let audit = Arc::clone(&audit);
        let barrier = Arc::clone(&barrier);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let record = AttemptRecord::new(
                CardId::new(&format!("CARD{i}")).unwrap(),
                AttemptOutcome::Denied,
                Utc::now(),
            );
            audit.append(&record).await
        }));
    }

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(audit.recent(100).await.unwrap().len(), NUM_CONCURRENT_TASKS);

    db.close().await;
}

#[tokio::test]
async fn test_verify_then_audit_round() {
    let db = Database::in_memory().await.unwrap();
    let users = SqliteUserRepository::new(db.pool().clone());
    let audit = SqliteAccessLogRepository::new(db.pool().clone());

    let card = CardId::new("B2").unwrap();
    users
        .add_user(&card, &Pin::new("2468").unwrap())
        .await
        .unwrap();

    for typed in ["1111", "2468"] {
        let granted = users
            .verify(&card, &Pin::new(typed).unwrap())
            .await
            .unwrap();
        let outcome = if granted {
            AttemptOutcome::Granted
        } else {
            AttemptOutcome::Denied
        };
        audit
            .append(&AttemptRecord::new(card.clone(), outcome, Utc::now()))
            .await
            .unwrap();
    }

    let logs = audit.find_by_card(&card, 10).await.unwrap();
    let messages: Vec<_> = logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages, vec!["Access granted", "Invalid PIN"]);

    db.close().await;
}

//! Appliance wiring.
//!
//! ```text
//!  card reader ─┐
//!  keypad ──────┼─► PeripheralManager ─► AuthCoordinator ─► notifications (log)
//!  console ─────┘                           │
//!                                           ├─► users (SQLite)      verify
//!                                           ├─► access_logs (SQLite) audit
//!                                           └─► printer (stdout)     receipt
//! ```

use crate::config::AppConfig;
use crate::console;
use anyhow::{Context, Result, bail};
use badgegate_core::{CardId, OutboundNotification, Pin};
use badgegate_hardware::mock::{MockCardSensor, MockKeypadSensor};
use badgegate_hardware::{AnyPrinter, DisabledPrinter, PeripheralManager, TextReceiptPrinter};
use badgegate_session::AuthCoordinator;
use badgegate_storage::{
    AccessLog, AccessLogRepository, Database, SqliteAccessLogRepository, SqliteUserRepository,
    UserRepository,
};
use std::sync::Arc;
use tokio::io::{AsyncRead, BufReader};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the appliance until `input` ends or Ctrl-C.
///
/// The card reader and keypad are the mock sensors; `input` is read as
/// console lines (see [`console`]) and merged with their events. On end of
/// input every queued event is still processed before this returns.
pub async fn run<R>(config: &AppConfig, input: R) -> Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let db = Database::new(config.database_config())
        .await
        .context("failed to open database")?;

    let users = SqliteUserRepository::new(db.pool().clone());
    let audit = SqliteAccessLogRepository::new(db.pool().clone());
    let printer = if config.printer_enabled {
        AnyPrinter::Text(TextReceiptPrinter::stdout())
    } else {
        AnyPrinter::Disabled(DisabledPrinter)
    };

    let coordinator = Arc::new(AuthCoordinator::new(
        users,
        audit,
        printer,
        config.coordinator_config(),
    ));
    let notifier = tokio::spawn(log_notifications(coordinator.subscribe()));

    let (card_reader, _card) = MockCardSensor::new();
    let (keypad, _keys) = MockKeypadSensor::new();
    let (mut peripherals, events) =
        PeripheralManager::new(config.peripheral_config(), card_reader, keypad);
    peripherals.start()?;

    let cancel = CancellationToken::new();
    let coordinator_task = tokio::spawn(Arc::clone(&coordinator).run(events, cancel.clone()));
    let mut console_task = tokio::spawn(console::pump(
        BufReader::new(input),
        peripherals.sender(),
        cancel.clone(),
    ));

    info!("Appliance ready");

    let console_finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            cancel.cancel();
            false
        }
        forwarded = &mut console_task => {
            match forwarded {
                Ok(events) => info!(events, "Console input closed"),
                Err(e) => warn!(error = %e, "Console task failed"),
            }
            true
        }
    };

    peripherals.shutdown().await?;
    if !console_finished && let Err(e) = console_task.await {
        warn!(error = %e, "Console task failed");
    }

    // Every event sender is gone now; the coordinator drains what is queued.
    coordinator_task.await.context("coordinator task failed")?;
    drop(coordinator);
    if let Err(e) = notifier.await {
        warn!(error = %e, "Notification task failed");
    }

    db.close().await;
    info!("Appliance stopped");
    Ok(())
}

/// Log every outbound notification as one JSON line, PIN digits masked.
async fn log_notifications(mut rx: broadcast::Receiver<OutboundNotification>) {
    loop {
        match rx.recv().await {
            Ok(notification) => match serde_json::to_string(&notification.redacted()) {
                Ok(json) => info!(event = notification.event_name(), payload = %json, "Notification"),
                Err(e) => warn!(error = %e, "Failed to encode notification"),
            },
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "Notification log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Enroll a card.
///
/// # Errors
///
/// Fails if the card is already enrolled, or the PIN is rejected.
pub async fn add_user(config: &AppConfig, card_id: &str, pin: &str) -> Result<()> {
    let card_id = CardId::new(card_id)?;
    let pin = Pin::new(pin)?;

    let db = Database::new(config.database_config()).await?;
    let users = SqliteUserRepository::new(db.pool().clone());
    let added = users.add_user(&card_id, &pin).await;
    db.close().await;

    if !added? {
        bail!("card {card_id} is already enrolled");
    }
    Ok(())
}

/// Most recent access log entries, newest first, optionally for one card.
pub async fn recent_logs(
    config: &AppConfig,
    limit: u32,
    card_id: Option<&str>,
) -> Result<Vec<AccessLog>> {
    let card_id = card_id.map(CardId::new).transpose()?;

    let db = Database::new(config.database_config()).await?;
    let logs = SqliteAccessLogRepository::new(db.pool().clone());
    let entries = match &card_id {
        Some(card_id) => logs.find_by_card(card_id, i64::from(limit)).await,
        None => logs.recent(i64::from(limit)).await,
    };
    db.close().await;

    Ok(entries?)
}

/// One line per entry: time, card, outcome, message.
pub fn format_log_line(log: &AccessLog) -> String {
    format!(
        "{}  {:<12} {:<20} {}",
        log.timestamp.format("%Y-%m-%d %H:%M:%S"),
        log.card_id,
        log.outcome,
        log.message
    )
}

//! Text receipt printer.
//!
//! Renders attempt and transaction receipts as plain text and writes them to
//! any [`AsyncWrite`] (a thermal printer's device file, stdout, a buffer in
//! tests). The ESC/POS wire protocol is left to whatever sits behind the
//! writer.

use crate::error::{HardwareError, Result};
use badgegate_core::{AttemptRecord, ReceiptEmitter, TransactionReceipt, format_cents};
use chrono::{DateTime, Local, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

const RULE_WIDTH: usize = 30;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// Render the receipt for an authentication attempt.
///
/// ```
/// use badgegate_core::{AttemptOutcome, AttemptRecord, CardId};
/// use badgegate_hardware::printer::render_attempt_receipt;
/// use chrono::Utc;
///
/// let record = AttemptRecord::new(CardId::new("A1").unwrap(), AttemptOutcome::Granted, Utc::now());
/// let text = render_attempt_receipt(&record);
/// assert!(text.contains("Status: SUCCESS"));
/// ```
pub fn render_attempt_receipt(record: &AttemptRecord) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let status = if record.success() { "SUCCESS" } else { "FAILED" };

    format!(
        "{rule}\nAuthentication Result\n===================\nCard ID: {}\nStatus: {status}\nMessage: {}\nTime: {}\n{rule}\n",
        record.card_id(),
        record.message(),
        format_time(record.timestamp()),
    )
}

/// Render a balance inquiry or withdrawal receipt.
pub fn render_transaction_receipt(receipt: &TransactionReceipt) -> String {
    let rule = "=".repeat(RULE_WIDTH);

    format!(
        "{rule}\n{}\n{rule}\nAccount: {}\nAmount: {}\nBalance: {}\nTime: {}\n{rule}\n",
        receipt.title,
        receipt.account_id,
        format_cents(receipt.amount_cents),
        format_cents(receipt.balance_cents),
        format_time(receipt.timestamp),
    )
}

/// Receipt emitter writing rendered text to an async writer.
///
/// Receipts from concurrent attempts never interleave: the writer is held
/// for the whole receipt.
#[derive(Debug)]
pub struct TextReceiptPrinter<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> TextReceiptPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the printer and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn print(&self, text: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl TextReceiptPrinter<tokio::io::Stdout> {
    /// Printer that writes receipts to standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ReceiptEmitter for TextReceiptPrinter<W> {
    type Error = HardwareError;

    async fn emit_attempt_receipt(&self, record: &AttemptRecord) -> Result<()> {
        self.print(&render_attempt_receipt(record)).await
    }

    async fn emit_transaction_receipt(&self, receipt: &TransactionReceipt) -> Result<()> {
        self.print(&render_transaction_receipt(receipt)).await
    }
}

/// Receipt emitter for appliances without a printer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPrinter;

impl ReceiptEmitter for DisabledPrinter {
    type Error = HardwareError;

    async fn emit_attempt_receipt(&self, _record: &AttemptRecord) -> Result<()> {
        Ok(())
    }

    async fn emit_transaction_receipt(&self, _receipt: &TransactionReceipt) -> Result<()> {
        Ok(())
    }
}

/// Either a text printer or nothing, chosen at startup.
#[derive(Debug)]
pub enum AnyPrinter<W> {
    Text(TextReceiptPrinter<W>),
    Disabled(DisabledPrinter),
}

impl<W: AsyncWrite + Unpin + Send> ReceiptEmitter for AnyPrinter<W> {
    type Error = HardwareError;

    async fn emit_attempt_receipt(&self, record: &AttemptRecord) -> Result<()> {
        match self {
            Self::Text(printer) => printer.emit_attempt_receipt(record).await,
            Self::Disabled(printer) => printer.emit_attempt_receipt(record).await,
        }
    }

    async fn emit_transaction_receipt(&self, receipt: &TransactionReceipt) -> Result<()> {
        match self {
            Self::Text(printer) => printer.emit_transaction_receipt(receipt).await,
            Self::Disabled(printer) => printer.emit_transaction_receipt(receipt).await,
        }
    }
}

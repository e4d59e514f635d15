//! Test doubles for the coordinator's collaborators.

#![allow(dead_code)]

use badgegate_core::{
    AttemptRecord, AuditLog, CardId, CredentialVerifier, InputEvent, KeySymbol,
    OutboundNotification, Pin, ReceiptEmitter, TransactionReceipt,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub &'static str);

/// Shared log of collaborator calls, in call order.
pub type Journal = Arc<Mutex<Vec<&'static str>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<&'static str> {
    journal.lock().unwrap().clone()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierMode {
    Normal,
    Fail,
    Delay(Duration),
}

#[derive(Debug)]
pub struct FakeVerifier {
    credentials: HashMap<String, String>,
    mode: VerifierMode,
    calls: Mutex<Vec<(CardId, Pin)>>,
    journal: Journal,
}

impl FakeVerifier {
    pub fn new(journal: Journal) -> Self {
        Self {
            credentials: HashMap::new(),
            mode: VerifierMode::Normal,
            calls: Mutex::new(Vec::new()),
            journal,
        }
    }

    pub fn enroll(mut self, card_id: &str, pin: &str) -> Self {
        self.credentials.insert(card_id.to_string(), pin.to_string());
        self
    }

    pub fn mode(mut self, mode: VerifierMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn calls(&self) -> Vec<(CardId, Pin)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CredentialVerifier for FakeVerifier {
    type Error = FakeError;

    async fn verify(&self, card_id: &CardId, pin: &Pin) -> Result<bool, FakeError> {
        self.calls
            .lock()
            .unwrap()
            .push((card_id.clone(), pin.clone()));
        self.journal.lock().unwrap().push("verify");

        match self.mode {
            VerifierMode::Normal => {}
            VerifierMode::Fail => return Err(FakeError("credential store offline")),
            VerifierMode::Delay(delay) => tokio::time::sleep(delay).await,
        }

        Ok(self
            .credentials
            .get(card_id.as_str())
            .is_some_and(|expected| expected == pin.as_str()))
    }
}

#[derive(Debug)]
pub struct RecordingAudit {
    records: Mutex<Vec<AttemptRecord>>,
    fail: bool,
    journal: Journal,
}

impl RecordingAudit {
    pub fn new(journal: Journal) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: false,
            journal,
        }
    }

    pub fn failing(journal: Journal) -> Self {
        Self {
            fail: true,
            ..Self::new(journal)
        }
    }

    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditLog for RecordingAudit {
    type Error = FakeError;

    async fn append(&self, record: &AttemptRecord) -> Result<(), FakeError> {
        self.journal.lock().unwrap().push("append");
        if self.fail {
            return Err(FakeError("disk full"));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecordingPrinter {
    receipts: Mutex<Vec<AttemptRecord>>,
    transactions: Mutex<Vec<TransactionReceipt>>,
    fail: bool,
    journal: Journal,
}

impl RecordingPrinter {
    pub fn new(journal: Journal) -> Self {
        Self {
            receipts: Mutex::new(Vec::new()),
            transactions: Mutex::new(Vec::new()),
            fail: false,
            journal,
        }
    }

    pub fn failing(journal: Journal) -> Self {
        Self {
            fail: true,
            ..Self::new(journal)
        }
    }

    pub fn receipts(&self) -> Vec<AttemptRecord> {
        self.receipts.lock().unwrap().clone()
    }
}

impl ReceiptEmitter for RecordingPrinter {
    type Error = FakeError;

    async fn emit_attempt_receipt(&self, record: &AttemptRecord) -> Result<(), FakeError> {
        self.journal.lock().unwrap().push("receipt");
        if self.fail {
            return Err(FakeError("paper out"));
        }
        self.receipts.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn emit_transaction_receipt(&self, receipt: &TransactionReceipt) -> Result<(), FakeError> {
        if self.fail {
            return Err(FakeError("paper out"));
        }
        self.transactions.lock().unwrap().push(receipt.clone());
        Ok(())
    }
}

pub fn card(id: &str) -> InputEvent {
    InputEvent::card(CardId::new(id).unwrap())
}

pub fn key(c: char) -> InputEvent {
    InputEvent::key(KeySymbol::from_char(c))
}

pub fn card_id(id: &str) -> CardId {
    CardId::new(id).unwrap()
}

/// Events for presenting `id` and typing `keys` (e.g. `"13#"`).
pub fn script(id: &str, keys: &str) -> Vec<InputEvent> {
    std::iter::once(card(id)).chain(keys.chars().map(key)).collect()
}

/// Drain every notification currently buffered.
pub fn drain(rx: &mut broadcast::Receiver<OutboundNotification>) -> Vec<OutboundNotification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

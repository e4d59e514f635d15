//! Authentication session coordinator.
//!
//! The coordinator owns the single [`Session`] behind a mutex. Every input
//! event is applied inside that critical section and any resulting
//! notification is published before the lock is released, so notifications
//! leave in exactly the order the session changed. On submit the session is
//! snapshotted and reset under the lock; verification, audit logging and
//! receipt printing then run outside it through the [`AttemptFinalizer`].
//!
//! ```text
//!  mpsc<InputEvent> ──► run() ──► apply() ──[lock: Session]──► EventSink
//!                                   │
//!                                   └─ submit ─► spawn finalize()
//!                                                  verify ─► audit ─► receipt ─► AttemptResolved
//! ```
//!
//! # Examples
//!
//! ```
//! use badgegate_core::{AttemptRecord, AuditLog, CardId, CredentialVerifier, InputEvent, KeySymbol, Pin};
//! use badgegate_hardware::DisabledPrinter;
//! use badgegate_session::{AuthCoordinator, CoordinatorConfig};
//! use std::convert::Infallible;
//!
//! struct Pin13;
//!
//! impl CredentialVerifier for Pin13 {
//!     type Error = Infallible;
//!     async fn verify(&self, _card: &CardId, pin: &Pin) -> Result<bool, Infallible> {
//!         Ok(pin.as_str() == "13")
//!     }
//! }
//!
//! struct NoAudit;
//!
//! impl AuditLog for NoAudit {
//!     type Error = Infallible;
//!     async fn append(&self, _record: &AttemptRecord) -> Result<(), Infallible> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let coordinator = AuthCoordinator::new(Pin13, NoAudit, DisabledPrinter, CoordinatorConfig::default());
//!
//! coordinator.handle_event(InputEvent::card(CardId::new("A1").unwrap())).await;
//! coordinator.handle_event(InputEvent::key(KeySymbol::Digit(1))).await;
//! coordinator.handle_event(InputEvent::key(KeySymbol::Digit(3))).await;
//! let record = coordinator.handle_event(InputEvent::key(KeySymbol::Submit)).await.unwrap();
//!
//! assert!(record.success());
//! assert_eq!(record.message(), "Access granted");
//! # }
//! ```

use crate::finalizer::AttemptFinalizer;
use crate::session::{PendingAttempt, Session, SessionState, Transition};
use crate::sink::EventSink;
use badgegate_core::constants::DEFAULT_NOTIFICATION_CAPACITY;
use badgegate_core::{
    AttemptRecord, AuditLog, CardId, CredentialVerifier, InputEvent, OutboundNotification,
    ReceiptEmitter,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Abandon a session after this long without input. `None` keeps a
    /// session open until it is submitted.
    pub session_timeout: Option<Duration>,

    /// Upper bound for each verifier, audit log and receipt call.
    pub collaborator_timeout: Option<Duration>,

    /// Per-subscriber notification buffer.
    pub notification_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            session_timeout: None,
            collaborator_timeout: None,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_session_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_collaborator_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }
}

/// Point-in-time view of the session, without the PIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub card_id: Option<CardId>,
    pub buffer_len: usize,
}

/// Reconciles card and keypad input into one authentication session.
///
/// Construct one per appliance and share it through an `Arc`.
#[derive(Debug)]
pub struct AuthCoordinator<V, A, R> {
    session: Mutex<Session>,
    sink: EventSink,
    finalizer: Arc<AttemptFinalizer<V, A, R>>,
    config: CoordinatorConfig,
}

impl<V, A, R> AuthCoordinator<V, A, R>
where
    V: CredentialVerifier + 'static,
    A: AuditLog + 'static,
    R: ReceiptEmitter + 'static,
{
    pub fn new(verifier: V, audit: A, receipts: R, config: CoordinatorConfig) -> Self {
        let sink = EventSink::new(config.notification_capacity);
        let finalizer = AttemptFinalizer::new(verifier, audit, receipts, sink.clone())
            .with_collaborator_timeout(config.collaborator_timeout);

        Self {
            session: Mutex::new(Session::new()),
            sink,
            finalizer: Arc::new(finalizer),
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Subscribe to outbound notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundNotification> {
        self.sink.subscribe()
    }

    pub fn sink(&self) -> &EventSink {
        &self.sink
    }

    pub fn finalizer(&self) -> &AttemptFinalizer<V, A, R> {
        &self.finalizer
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current session state (no PIN digits).
    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.lock();
        SessionSnapshot {
            state: session.state(),
            card_id: session.active_card().cloned(),
            buffer_len: session.buffer_len(),
        }
    }

    /// Apply one event to the session.
    ///
    /// Publishes `SessionOpened` / `BufferChanged` as appropriate. On submit
    /// the session is already reset when this returns, and the detached
    /// attempt is returned for [`finalize`](Self::finalize).
    pub fn apply(&self, event: &InputEvent) -> Option<PendingAttempt> {
        let mut session = self.lock();
        let transition = session.apply(event, Instant::now());

        if let Some(notification) = transition.notification() {
            self.sink.publish(notification);
        }

        match transition {
            Transition::Opened { card_id } => {
                info!(card_id = %card_id, "Session opened, awaiting PIN");
                None
            }
            Transition::BufferChanged { card_id, buffer } => {
                debug!(card_id = %card_id, length = buffer.len(), "PIN buffer changed");
                None
            }
            Transition::Submitted(attempt) => {
                info!(
                    card_id = %attempt.card_id(),
                    pin_len = attempt.pin().len(),
                    "PIN submitted"
                );
                Some(attempt)
            }
            Transition::Ignored(reason) => {
                debug!(kind = %event.kind(), %reason, "Input ignored");
                None
            }
        }
    }

    /// Run the side effects of a submitted attempt.
    pub async fn finalize(&self, attempt: PendingAttempt) -> AttemptRecord {
        self.finalizer.finalize(attempt).await
    }

    /// Apply an event and, on submit, finalize the attempt before returning.
    pub async fn handle_event(&self, event: InputEvent) -> Option<AttemptRecord> {
        let attempt = self.apply(&event)?;
        Some(self.finalize(attempt).await)
    }

    /// Close the open session without an attempt.
    ///
    /// Publishes `SessionAbandoned` and returns the card, or `None` if idle.
    pub fn abandon(&self) -> Option<CardId> {
        let mut session = self.lock();
        let card_id = session.abandon()?;

        self.sink.publish(OutboundNotification::SessionAbandoned {
            card_id: card_id.clone(),
        });
        info!(card_id = %card_id, "Session abandoned");
        Some(card_id)
    }

    /// Abandon the open session if it exceeded the configured idle timeout.
    pub fn expire_idle(&self) -> Option<CardId> {
        let timeout = self.config.session_timeout?;
        let mut session = self.lock();
        let card_id = session.expire(Instant::now(), timeout)?;

        self.sink.publish(OutboundNotification::SessionAbandoned {
            card_id: card_id.clone(),
        });
        info!(
            card_id = %card_id,
            timeout_secs = timeout.as_secs(),
            "Session timed out"
        );
        Some(card_id)
    }

    fn idle_deadline(&self) -> Option<Instant> {
        let timeout = self.config.session_timeout?;
        self.lock().idle_deadline(timeout)
    }

    /// Consume input events until `cancel` fires or every sender is gone.
    ///
    /// Submitted attempts are finalized on spawned tasks so input keeps
    /// flowing while the verifier and printer work. Attempts still in flight
    /// when the loop ends are awaited before this returns.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<InputEvent>,
        cancel: CancellationToken,
    ) {
        let mut in_flight = JoinSet::new();
        info!("Coordinator started");

        loop {
            let deadline = self.idle_deadline();

            tokio::select! {
                _ = cancel.cancelled() => break,

                event = events.recv() => {
                    let Some(event) = event else { break };

                    if let Some(attempt) = self.apply(&event) {
                        let finalizer = Arc::clone(&self.finalizer);
                        in_flight.spawn(async move { finalizer.finalize(attempt).await });
                    }
                }

                _ = sleep_until_deadline(deadline) => {
                    self.expire_idle();
                }

                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Attempt finalizer task failed");
                    }
                }
            }
        }

        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Attempt finalizer task failed");
            }
        }

        info!("Coordinator stopped");
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

//! Authentication session coordination.
//!
//! Reconciles card and keypad input into a single badge + PIN session and
//! drives what happens when a PIN is submitted:
//!
//! - [`session`]: the `Idle` / `AwaitingPin` state machine (no I/O).
//! - [`sink`]: the broadcast channel for UI notifications.
//! - [`finalizer`]: verify, audit, print, notify; failures are contained.
//! - [`coordinator`]: the shared [`AuthCoordinator`] tying it together.

pub mod coordinator;
pub mod finalizer;
pub mod session;
pub mod sink;

pub use coordinator::{AuthCoordinator, CoordinatorConfig, SessionSnapshot};
pub use finalizer::AttemptFinalizer;
pub use session::{IgnoreReason, PendingAttempt, Session, SessionState, Transition};
pub use sink::EventSink;

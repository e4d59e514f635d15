//! Authentication session state machine.
//!
//! # States
//!
//! - `Idle`: no card presented.
//! - `AwaitingPin`: a card opened the session; digits accumulate until submit.
//!
//! # Transitions
//!
//! | state        | event           | result                              |
//! |--------------|-----------------|-------------------------------------|
//! | Idle         | card            | open session                        |
//! | Idle         | key             | ignored                             |
//! | AwaitingPin  | card            | ignored (session unchanged)         |
//! | AwaitingPin  | digit           | append to buffer                    |
//! | AwaitingPin  | backspace       | drop last digit (no-op when empty)  |
//! | AwaitingPin  | submit          | snapshot, reset to Idle             |
//! | AwaitingPin  | other key       | ignored                             |
//!
//! The machine does no I/O. The coordinator applies events under its lock
//! and turns the returned [`Transition`] into notifications.
//!
//! ```
//! use badgegate_core::{CardId, InputEvent, KeySymbol};
//! use badgegate_session::session::{Session, SessionState, Transition};
//! use tokio::time::Instant;
//!
//! let mut session = Session::new();
//! let now = Instant::now();
//!
//! session.apply(&InputEvent::card(CardId::new("A1").unwrap()), now);
//! session.apply(&InputEvent::key(KeySymbol::Digit(1)), now);
//! assert_eq!(session.state(), SessionState::AwaitingPin);
//!
//! let Transition::Submitted(attempt) = session.apply(&InputEvent::key(KeySymbol::Submit), now) else {
//!     panic!("expected submit");
//! };
//! assert_eq!(attempt.pin().as_str(), "1");
//! assert_eq!(session.state(), SessionState::Idle);
//! ```

use badgegate_core::{CardId, InputEvent, KeySymbol, OutboundNotification, Pin};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingPin,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingPin => write!(f, "AwaitingPin"),
        }
    }
}

/// Card and PIN captured at submit time, detached from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttempt {
    card_id: CardId,
    pin: Pin,
}

impl PendingAttempt {
    pub fn new(card_id: CardId, pin: Pin) -> Self {
        Self { card_id, pin }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn pin(&self) -> &Pin {
        &self.pin
    }
}

/// Why an event left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A key arrived with no card presented.
    NoActiveSession,

    /// A card arrived while another session is open.
    SessionInProgress,

    /// A key that is neither a digit, backspace nor submit.
    UnrecognisedKey,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveSession => write!(f, "no active session"),
            Self::SessionInProgress => write!(f, "session already in progress"),
            Self::UnrecognisedKey => write!(f, "unrecognised key"),
        }
    }
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A new session was opened.
    Opened { card_id: CardId },

    /// The PIN buffer was edited (possibly a no-op backspace).
    BufferChanged { card_id: CardId, buffer: Pin },

    /// The session was submitted and reset to idle.
    Submitted(PendingAttempt),

    /// Nothing changed.
    Ignored(IgnoreReason),
}

impl Transition {
    /// The notification announcing this transition, if any.
    ///
    /// `Submitted` has none here: its `AttemptResolved` is published once the
    /// attempt is finalized.
    pub fn notification(&self) -> Option<OutboundNotification> {
        match self {
            Self::Opened { card_id } => Some(OutboundNotification::SessionOpened {
                card_id: card_id.clone(),
            }),
            Self::BufferChanged { card_id, buffer } => Some(OutboundNotification::BufferChanged {
                card_id: card_id.clone(),
                length: buffer.len(),
                buffer: buffer.as_str().to_string(),
            }),
            Self::Submitted(_) | Self::Ignored(_) => None,
        }
    }
}

#[derive(Debug)]
struct ActiveSession {
    card_id: CardId,
    buffer: Pin,
    last_activity: Instant,
}

/// The single authentication session.
#[derive(Debug, Default)]
pub struct Session {
    active: Option<ActiveSession>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::AwaitingPin
        } else {
            SessionState::Idle
        }
    }

    /// Card of the open session.
    pub fn active_card(&self) -> Option<&CardId> {
        self.active.as_ref().map(|s| &s.card_id)
    }

    /// Number of buffered digits (0 when idle).
    pub fn buffer_len(&self) -> usize {
        self.active.as_ref().map_or(0, |s| s.buffer.len())
    }

    /// Apply one input event at time `now`.
    pub fn apply(&mut self, event: &InputEvent, now: Instant) -> Transition {
        match event {
            InputEvent::CardPresented { id } => self.present_card(id, now),
            InputEvent::KeyPressed { symbol } => self.press_key(*symbol, now),
        }
    }

    fn present_card(&mut self, id: &CardId, now: Instant) -> Transition {
        if self.active.is_some() {
            return Transition::Ignored(IgnoreReason::SessionInProgress);
        }

        self.active = Some(ActiveSession {
            card_id: id.clone(),
            buffer: Pin::default(),
            last_activity: now,
        });

        Transition::Opened {
            card_id: id.clone(),
        }
    }

    fn press_key(&mut self, symbol: KeySymbol, now: Instant) -> Transition {
        let Some(active) = self.active.as_mut() else {
            return Transition::Ignored(IgnoreReason::NoActiveSession);
        };

        match symbol {
            KeySymbol::Digit(d) => {
                if !active.buffer.push_digit(d) {
                    return Transition::Ignored(IgnoreReason::UnrecognisedKey);
                }
            }
            KeySymbol::Backspace => {
                active.buffer.pop();
            }
            KeySymbol::Submit => {
                return match self.active.take() {
                    Some(closed) => {
                        Transition::Submitted(PendingAttempt::new(closed.card_id, closed.buffer))
                    }
                    None => Transition::Ignored(IgnoreReason::NoActiveSession),
                };
            }
            KeySymbol::Other(_) => return Transition::Ignored(IgnoreReason::UnrecognisedKey),
        }

        active.last_activity = now;
        Transition::BufferChanged {
            card_id: active.card_id.clone(),
            buffer: active.buffer.clone(),
        }
    }

    /// Close the open session without an attempt.
    ///
    /// Returns the card of the abandoned session, or `None` when idle.
    pub fn abandon(&mut self) -> Option<CardId> {
        self.active.take().map(|s| s.card_id)
    }

    /// When the open session goes stale under `timeout`, if one is open.
    pub fn idle_deadline(&self, timeout: Duration) -> Option<Instant> {
        self.active.as_ref().map(|s| s.last_activity + timeout)
    }

    /// Abandon the open session if it has been inactive for `timeout`.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Option<CardId> {
        match self.idle_deadline(timeout) {
            Some(deadline) if now >= deadline => self.abandon(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn card(id: &str) -> InputEvent {
        InputEvent::card(CardId::new(id).unwrap())
    }

    fn key(c: char) -> InputEvent {
        InputEvent::key(KeySymbol::from_char(c))
    }

    fn opened(id: &str) -> (Session, Instant) {
        let mut session = Session::new();
        let now = Instant::now();
        session.apply(&card(id), now);
        (session, now)
    }

    #[test]
    fn test_card_opens_session() {
        let mut session = Session::new();
        let transition = session.apply(&card("A1"), Instant::now());

        assert_eq!(
            transition,
            Transition::Opened {
                card_id: CardId::new("A1").unwrap()
            }
        );
        assert_eq!(session.state(), SessionState::AwaitingPin);
        assert_eq!(session.active_card().unwrap().as_str(), "A1");
        assert_eq!(session.buffer_len(), 0);
    }

    #[test]
    fn test_second_card_is_ignored() {
        let (mut session, now) = opened("C3");
        session.apply(&key('4'), now);

        let transition = session.apply(&card("D4"), now);

        assert_eq!(
            transition,
            Transition::Ignored(IgnoreReason::SessionInProgress)
        );
        assert_eq!(session.active_card().unwrap().as_str(), "C3");
        assert_eq!(session.buffer_len(), 1);
    }

    #[rstest]
    #[case('1')]
    #[case('*')]
    #[case('#')]
    #[case('A')]
    fn test_keys_while_idle_are_ignored(#[case] c: char) {
        let mut session = Session::new();
        let transition = session.apply(&key(c), Instant::now());

        assert_eq!(transition, Transition::Ignored(IgnoreReason::NoActiveSession));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_digits_append() {
        let (mut session, now) = opened("A1");

        session.apply(&key('1'), now);
        let transition = session.apply(&key('3'), now);

        let Transition::BufferChanged { buffer, .. } = &transition else {
            panic!("expected buffer change, got {transition:?}");
        };
        assert_eq!(buffer.as_str(), "13");
        assert_eq!(
            transition.notification(),
            Some(OutboundNotification::BufferChanged {
                card_id: CardId::new("A1").unwrap(),
                length: 2,
                buffer: "13".to_string(),
            })
        );
    }

    #[test]
    fn test_no_maximum_buffer_length() {
        let (mut session, now) = opened("A1");

        for _ in 0..64 {
            session.apply(&key('9'), now);
        }
        assert_eq!(session.buffer_len(), 64);
    }

    #[test]
    fn test_backspace_on_empty_buffer_is_noop() {
        let (mut session, now) = opened("A1");

        let transition = session.apply(&key('*'), now);

        assert!(matches!(
            &transition,
            Transition::BufferChanged { buffer, .. } if buffer.is_empty()
        ));
        assert_eq!(session.state(), SessionState::AwaitingPin);
        assert_eq!(session.buffer_len(), 0);
    }

    #[test]
    fn test_backspace_drops_last_digit() {
        let (mut session, now) = opened("A1");

        session.apply(&key('1'), now);
        session.apply(&key('2'), now);
        session.apply(&key('*'), now);

        assert_eq!(session.buffer_len(), 1);
    }

    #[test]
    fn test_unrecognised_key_is_ignored() {
        let (mut session, now) = opened("A1");
        session.apply(&key('5'), now);

        let transition = session.apply(&key('D'), now);

        assert_eq!(transition, Transition::Ignored(IgnoreReason::UnrecognisedKey));
        assert_eq!(session.buffer_len(), 1);
    }

    #[test]
    fn test_out_of_range_digit_is_ignored() {
        let (mut session, now) = opened("A1");

        let transition = session.apply(&InputEvent::key(KeySymbol::Digit(12)), now);

        assert_eq!(transition, Transition::Ignored(IgnoreReason::UnrecognisedKey));
        assert_eq!(session.buffer_len(), 0);
    }

    #[test]
    fn test_submit_snapshots_and_resets() {
        let (mut session, now) = opened("A1");
        session.apply(&key('1'), now);
        session.apply(&key('3'), now);

        let transition = session.apply(&key('#'), now);

        assert_eq!(
            transition,
            Transition::Submitted(PendingAttempt::new(
                CardId::new("A1").unwrap(),
                Pin::new("13").unwrap()
            ))
        );
        assert_eq!(transition.notification(), None);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.active_card(), None);
    }

    #[test]
    fn test_submit_empty_buffer() {
        let (mut session, now) = opened("B2");

        let Transition::Submitted(attempt) = session.apply(&key('#'), now) else {
            panic!("expected submit");
        };

        assert!(attempt.pin().is_empty());
        assert_eq!(attempt.card_id().as_str(), "B2");
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_new_session_after_submit_starts_empty() {
        let (mut session, now) = opened("A1");
        session.apply(&key('7'), now);
        session.apply(&key('#'), now);

        session.apply(&card("B2"), now);

        assert_eq!(session.active_card().unwrap().as_str(), "B2");
        assert_eq!(session.buffer_len(), 0);
    }

    #[test]
    fn test_abandon() {
        let (mut session, _) = opened("A1");

        assert_eq!(session.abandon(), Some(CardId::new("A1").unwrap()));
        assert_eq!(session.abandon(), None);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_expire_uses_last_activity() {
        let (mut session, start) = opened("A1");
        let timeout = Duration::from_secs(30);

        session.apply(&key('1'), start + Duration::from_secs(20));

        assert_eq!(session.expire(start + Duration::from_secs(40), timeout), None);
        assert_eq!(
            session.idle_deadline(timeout),
            Some(start + Duration::from_secs(50))
        );
        assert_eq!(
            session.expire(start + Duration::from_secs(50), timeout),
            Some(CardId::new("A1").unwrap())
        );
        assert_eq!(session.idle_deadline(timeout), None);
    }
}

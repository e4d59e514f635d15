use crate::attempt::AttemptRecord;
use crate::types::CardId;
use serde::{Deserialize, Serialize};

/// Event delivered to the UI notification channel.
///
/// Serialized with an `event` tag using the names the web UI subscribes to
/// (`request_pin`, `pin_updated`, `auth_result`, `session_abandoned`).
///
/// ```
/// use badgegate_core::{CardId, OutboundNotification};
///
/// let event = OutboundNotification::SessionOpened { card_id: CardId::new("A1").unwrap() };
/// let json = serde_json::to_string(&event).unwrap();
/// assert_eq!(json, r#"{"event":"request_pin","card_id":"A1"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum OutboundNotification {
    /// A card opened a new session; the UI should prompt for the PIN.
    #[serde(rename = "request_pin")]
    SessionOpened { card_id: CardId },

    /// The PIN buffer changed.
    #[serde(rename = "pin_updated")]
    BufferChanged {
        card_id: CardId,
        length: usize,
        buffer: String,
    },

    /// The attempt was resolved.
    #[serde(rename = "auth_result")]
    AttemptResolved {
        card_id: CardId,
        success: bool,
        message: String,
    },

    /// The session was closed without a submit (idle timeout or explicit abandon).
    #[serde(rename = "session_abandoned")]
    SessionAbandoned { card_id: CardId },
}

impl OutboundNotification {
    /// Build the `AttemptResolved` notification for a record.
    pub fn resolved(record: &AttemptRecord) -> Self {
        Self::AttemptResolved {
            card_id: record.card_id().clone(),
            success: record.success(),
            message: record.message().to_string(),
        }
    }

    /// The card this notification refers to.
    pub fn card_id(&self) -> &CardId {
        match self {
            Self::SessionOpened { card_id }
            | Self::BufferChanged { card_id, .. }
            | Self::AttemptResolved { card_id, .. }
            | Self::SessionAbandoned { card_id } => card_id,
        }
    }

    /// Event name on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::SessionOpened { .. } => "request_pin",
            Self::BufferChanged { .. } => "pin_updated",
            Self::AttemptResolved { .. } => "auth_result",
            Self::SessionAbandoned { .. } => "session_abandoned",
        }
    }

    /// Copy safe to write to logs: a `BufferChanged` buffer is masked with
    /// one `*` per digit. Other variants are returned unchanged.
    pub fn redacted(&self) -> Self {
        match self {
            Self::BufferChanged {
                card_id, length, ..
            } => Self::BufferChanged {
                card_id: card_id.clone(),
                length: *length,
                buffer: "*".repeat(*length),
            },
            other => other.clone(),
        }
    }

    /// Whether this notification ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AttemptResolved { .. } | Self::SessionAbandoned { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::AttemptOutcome;
    use chrono::Utc;

    #[test]
    fn test_buffer_changed_wire_format() {
        let event = OutboundNotification::BufferChanged {
            card_id: CardId::new("A1").unwrap(),
            length: 2,
            buffer: "12".to_string(),
        };

        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "pin_updated");
        assert_eq!(value["card_id"], "A1");
        assert_eq!(value["length"], 2);
        assert_eq!(value["buffer"], "12");
    }

    #[test]
    fn test_redacted_masks_buffer_only() {
        let card_id = CardId::new("A1").unwrap();
        let event = OutboundNotification::BufferChanged {
            card_id: card_id.clone(),
            length: 4,
            buffer: "8642".to_string(),
        };

        let json = serde_json::to_string(&event.redacted()).unwrap();
        assert!(!json.contains("8642"));
        assert_eq!(
            event.redacted(),
            OutboundNotification::BufferChanged {
                card_id: card_id.clone(),
                length: 4,
                buffer: "****".to_string(),
            }
        );

        let opened = OutboundNotification::SessionOpened { card_id };
        assert_eq!(opened.redacted(), opened);
    }

    #[test]
    fn test_resolved_from_record() {
        let record = AttemptRecord::new(
            CardId::new("B2").unwrap(),
            AttemptOutcome::Denied,
            Utc::now(),
        );

        let event = OutboundNotification::resolved(&record);
        assert_eq!(
            event,
            OutboundNotification::AttemptResolved {
                card_id: CardId::new("B2").unwrap(),
                success: false,
                message: "Invalid PIN".to_string(),
            }
        );
        assert!(event.is_terminal());
        assert_eq!(event.event_name(), "auth_result");
        assert_eq!(event.card_id().as_str(), "B2");
    }

    #[test]
    fn test_event_name_matches_serde_tag() {
        let card_id = CardId::new("C3").unwrap();
        let events = [
            OutboundNotification::SessionOpened {
                card_id: card_id.clone(),
            },
            OutboundNotification::SessionAbandoned { card_id },
        ];

        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], event.event_name());
        }
    }
}

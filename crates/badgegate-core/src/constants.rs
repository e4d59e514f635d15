//! Core constants for the badge + PIN authentication appliance.
//!
//! Timing defaults mirror the behaviour of the deployed appliance: the keypad
//! matrix is scanned every 50ms, the card reader every 100ms, and a detected
//! card is followed by a 2 second quiet period before the same card can be
//! reported again.
//!
//! # Usage
//!
//! ```
//! use badgegate_core::constants::*;
//! use std::time::Duration;
//!
//! let keypad_poll = Duration::from_millis(KEYPAD_POLL_INTERVAL_MS);
//! assert!(keypad_poll < Duration::from_millis(CARD_QUIET_PERIOD_MS));
//! assert_eq!(SUBMIT_KEY, '#');
//! ```

// ============================================================================
// Keypad
// ============================================================================

/// Key that submits the PIN buffer.
pub const SUBMIT_KEY: char = '#';

/// Key that removes the last buffered digit.
pub const BACKSPACE_KEY: char = '*';

/// Layout of the 4x3 membrane keypad, row-major.
pub const KEYPAD_LAYOUT: [[char; 3]; 4] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    [BACKSPACE_KEY, '0', SUBMIT_KEY],
];

/// Number of keypad rows.
pub const KEYPAD_ROWS: usize = 4;

/// Number of keypad columns.
pub const KEYPAD_COLS: usize = 3;

// ============================================================================
// Poll timing (milliseconds)
// ============================================================================

/// Keypad matrix scan interval.
pub const KEYPAD_POLL_INTERVAL_MS: u64 = 50;

/// Settle time after a key press is reported, before the matrix is scanned again.
pub const KEYPAD_PRESS_SETTLE_MS: u64 = 200;

/// Card reader poll interval.
pub const CARD_POLL_INTERVAL_MS: u64 = 100;

/// Quiet period after a card is reported during which the same card is suppressed.
pub const CARD_QUIET_PERIOD_MS: u64 = 2000;

/// Backoff applied after a transient sensor read error.
pub const SENSOR_ERROR_BACKOFF_MS: u64 = 1000;

// ============================================================================
// Credentials
// ============================================================================

/// Maximum accepted length of a card identifier.
///
/// MFRC522 readers report the UID as a decimal integer of up to 20 digits;
/// the extra room accommodates hex-formatted UIDs from other readers.
pub const MAX_CARD_ID_LENGTH: usize = 32;

/// Minimum PIN length accepted at enrollment.
///
/// The coordinator itself accepts any buffer length at submit time.
pub const MIN_PIN_LENGTH: usize = 4;

// ============================================================================
// Channels
// ============================================================================

/// Capacity of the input event queue between sources and the coordinator.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 100;

/// Capacity of the outbound notification broadcast channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

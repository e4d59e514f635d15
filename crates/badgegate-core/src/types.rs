use crate::{
    Result,
    constants::{BACKSPACE_KEY, MAX_CARD_ID_LENGTH, SUBMIT_KEY},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Card/badge identifier as reported by the reader (1-32 ASCII characters).
///
/// The identifier is trimmed before validation; case is preserved because
/// readers differ in how they format UIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardId(String);

impl CardId {
    /// Create a new card id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` if the id is empty, longer than
    /// `MAX_CARD_ID_LENGTH`, or contains non-ASCII or whitespace characters.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();

        if id.is_empty() {
            return Err(Error::InvalidCardId("card id is empty".to_string()));
        }

        if id.len() > MAX_CARD_ID_LENGTH {
            return Err(Error::InvalidCardId(format!(
                "card id must be at most {MAX_CARD_ID_LENGTH} chars, got {}",
                id.len()
            )));
        }

        if !id.chars().all(|c| c.is_ascii_graphic()) {
            return Err(Error::InvalidCardId(
                "card id must be printable ASCII without spaces".to_string(),
            ));
        }

        Ok(CardId(id.to_string()))
    }

    /// Get the card id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardId::new(s)
    }
}

impl TryFrom<String> for CardId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        CardId::new(&value)
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.0
    }
}

/// PIN as typed on the keypad: zero or more ASCII digits.
///
/// An empty PIN is valid here because submitting an empty buffer is a legal
/// attempt; enrollment enforces a minimum length separately.
///
/// # Security
/// Comparison is constant-time and `Debug` never prints the digits.
#[derive(Clone, Eq, Default)]
pub struct Pin(String);

impl Pin {
    /// Create a PIN from a digit string.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the string contains anything but ASCII digits.
    pub fn new(digits: &str) -> Result<Self> {
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidPin("PIN must contain only digits".to_string()));
        }
        Ok(Pin(digits.to_string()))
    }

    /// Get the PIN digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append one digit. Returns `false` (and leaves the PIN unchanged) if
    /// `digit` is greater than 9.
    pub fn push_digit(&mut self, digit: u8) -> bool {
        if digit > 9 {
            return false;
        }
        self.0.push(char::from(b'0' + digit));
        true
    }

    /// Remove the last digit, if any.
    pub fn pop(&mut self) -> Option<char> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin(<{} digits>)", self.0.len())
    }
}

/// Constant-time comparison so response time does not leak matching prefixes.
impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::str::FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pin::new(s)
    }
}

/// A single key symbol reported by the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySymbol {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Remove the last buffered digit (`*` on the membrane keypad).
    Backspace,

    /// Submit the buffered PIN (`#` on the membrane keypad).
    Submit,

    /// Any other key. Carried through so it can be logged, then ignored.
    Other(char),
}

impl KeySymbol {
    /// Create a digit symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use badgegate_core::KeySymbol;
    ///
    /// assert_eq!(KeySymbol::digit(7).unwrap(), KeySymbol::Digit(7));
    /// assert!(KeySymbol::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(Error::InvalidInput(format!("Digit must be 0-9, got {d}")));
        }
        Ok(Self::Digit(d))
    }

    /// Map a keypad legend to a symbol.
    ///
    /// Never fails: unrecognised legends become [`KeySymbol::Other`].
    ///
    /// ```
    /// use badgegate_core::KeySymbol;
    ///
    /// assert_eq!(KeySymbol::from_char('5'), KeySymbol::Digit(5));
    /// assert_eq!(KeySymbol::from_char('#'), KeySymbol::Submit);
    /// assert_eq!(KeySymbol::from_char('*'), KeySymbol::Backspace);
    /// assert_eq!(KeySymbol::from_char('A'), KeySymbol::Other('A'));
    /// ```
    pub fn from_char(c: char) -> Self {
        match c {
            SUBMIT_KEY => Self::Submit,
            BACKSPACE_KEY => Self::Backspace,
            c if c.is_ascii_digit() => Self::Digit(c as u8 - b'0'),
            c => Self::Other(c),
        }
    }

    /// The keypad legend for this symbol; `?` for an out-of-range digit.
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(_) => self.as_digit_char().unwrap_or('?'),
            Self::Backspace => BACKSPACE_KEY,
            Self::Submit => SUBMIT_KEY,
            Self::Other(c) => *c,
        }
    }

    /// Get the digit as a character if this is a digit symbol.
    pub fn as_digit_char(&self) -> Option<char> {
        match self {
            Self::Digit(d) if *d <= 9 => Some(char::from(b'0' + d)),
            _ => None,
        }
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backspace => write!(f, "backspace"),
            Self::Submit => write!(f, "submit"),
            other => write!(f, "{}", other.as_char()),
        }
    }
}

impl std::str::FromStr for KeySymbol {
    type Err = Error;

    /// Parses a single legend (`"7"`, `"#"`, `"*"`) or the names
    /// `"submit"`, `"enter"`, `"backspace"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "submit" | "enter" => return Ok(Self::Submit),
            "backspace" | "clear" => return Ok(Self::Backspace),
            _ => {}
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self::from_char(c)),
            _ => Err(Error::InvalidInput(format!("Not a key symbol: {s:?}"))),
        }
    }
}

/// Which input source produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Card,
    Keypad,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Keypad => write!(f, "keypad"),
        }
    }
}

/// A discrete, already-debounced event from an input source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// A card was presented to the reader.
    CardPresented { id: CardId },

    /// A key was pressed on the keypad.
    KeyPressed { symbol: KeySymbol },
}

impl InputEvent {
    /// Shorthand for a card presentation.
    pub fn card(id: CardId) -> Self {
        Self::CardPresented { id }
    }

    /// Shorthand for a key press.
    pub fn key(symbol: KeySymbol) -> Self {
        Self::KeyPressed { symbol }
    }

    /// The source kind that produces this event.
    pub fn kind(&self) -> InputKind {
        match self {
            Self::CardPresented { .. } => InputKind::Card,
            Self::KeyPressed { .. } => InputKind::Keypad,
        }
    }
}

impl From<CardId> for InputEvent {
    fn from(id: CardId) -> Self {
        Self::card(id)
    }
}

impl From<KeySymbol> for InputEvent {
    fn from(symbol: KeySymbol) -> Self {
        Self::key(symbol)
    }
}

impl std::str::FromStr for InputEvent {
    type Err = Error;

    /// Parses the line format used for simulated input:
    /// `card <id>` or `key <symbol>`.
    ///
    /// ```
    /// use badgegate_core::{InputEvent, KeySymbol};
    ///
    /// let event: InputEvent = "key #".parse().unwrap();
    /// assert_eq!(event, InputEvent::key(KeySymbol::Submit));
    ///
    /// let event: InputEvent = "card A1".parse().unwrap();
    /// assert!(matches!(event, InputEvent::CardPresented { .. }));
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (verb, arg) = s
            .split_once(char::is_whitespace)
            .ok_or_else(|| Error::InvalidInput(format!("Expected '<card|key> <value>', got {s:?}")))?;

        match verb.to_ascii_lowercase().as_str() {
            "card" => Ok(Self::card(CardId::new(arg)?)),
            "key" => Ok(Self::key(arg.parse()?)),
            other => Err(Error::InvalidInput(format!("Unknown event kind: {other}"))),
        }
    }
}

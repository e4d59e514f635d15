//! Mock keypad.

use super::lock;
use crate::{HardwareError, Result, traits::Sensor};
use badgegate_core::{InputKind, KeySymbol};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct KeypadState {
    held: Option<KeySymbol>,
    fail_next: usize,
    releases: usize,
}

/// Mock keypad driven by a [`MockKeypadHandle`].
///
/// The handle holds a key down; the sensor keeps reporting it until the key
/// is let go, exactly like a physical matrix being scanned.
#[derive(Debug)]
pub struct MockKeypadSensor {
    state: Arc<Mutex<KeypadState>>,
    name: String,
}

impl MockKeypadSensor {
    /// Create a new mock keypad with the default name.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_name("Mock Keypad".to_string())
    }

    /// Create a new mock keypad with a custom name.
    pub fn with_name(name: String) -> (Self, MockKeypadHandle) {
        let state = Arc::new(Mutex::new(KeypadState::default()));

        let sensor = Self {
            state: Arc::clone(&state),
            name,
        };

        (sensor, MockKeypadHandle { state })
    }
}

impl Sensor for MockKeypadSensor {
    type Reading = KeySymbol;

    const KIND: InputKind = InputKind::Keypad;

    fn name(&self) -> &str {
        &self.name
    }

    async fn sample(&mut self) -> Result<Option<KeySymbol>> {
        let mut state = lock(&self.state);

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(HardwareError::communication("simulated scan failure"));
        }

        Ok(state.held)
    }

    async fn release(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.releases += 1;
        state.held = None;
        Ok(())
    }
}

/// Handle for controlling a [`MockKeypadSensor`].
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    state: Arc<Mutex<KeypadState>>,
}

impl MockKeypadHandle {
    /// Hold a key down.
    pub fn hold(&self, symbol: KeySymbol) {
        lock(&self.state).held = Some(symbol);
    }

    /// Let go of the held key.
    pub fn let_go(&self) {
        lock(&self.state).held = None;
    }

    /// Make the next `count` scans fail.
    pub fn fail_next(&self, count: usize) {
        lock(&self.state).fail_next = count;
    }

    /// Number of times the keypad was released.
    pub fn release_count(&self) -> usize {
        lock(&self.state).releases
    }
}

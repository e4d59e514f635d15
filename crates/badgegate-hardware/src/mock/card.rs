//! Mock card reader.

use super::lock;
use crate::{HardwareError, Result, traits::Sensor};
use badgegate_core::{CardId, InputKind};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct CardState {
    present: Option<CardId>,
    fail_next: usize,
    samples: usize,
    releases: usize,
}

/// Mock card reader driven by a [`MockCardHandle`].
///
/// # Examples
///
/// ```
/// use badgegate_hardware::mock::MockCardSensor;
/// use badgegate_hardware::traits::Sensor;
/// use badgegate_core::CardId;
///
/// #[tokio::main]
/// async fn main() -> badgegate_hardware::Result<()> {
///     let (mut reader, handle) = MockCardSensor::new();
///
///     assert_eq!(reader.sample().await?, None);
///
///     handle.present(CardId::new("A1").unwrap());
///     assert_eq!(reader.sample().await?, Some(CardId::new("A1").unwrap()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCardSensor {
    state: Arc<Mutex<CardState>>,
    name: String,
}

impl MockCardSensor {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockCardHandle) {
        Self::with_name("Mock Card Reader".to_string())
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockCardHandle) {
        let state = Arc::new(Mutex::new(CardState::default()));

        let sensor = Self {
            state: Arc::clone(&state),
            name,
        };

        (sensor, MockCardHandle { state })
    }
}

impl Sensor for MockCardSensor {
    type Reading = CardId;

    const KIND: InputKind = InputKind::Card;

    fn name(&self) -> &str {
        &self.name
    }

    async fn sample(&mut self) -> Result<Option<CardId>> {
        let mut state = lock(&self.state);
        state.samples += 1;

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(HardwareError::card_read("simulated read failure"));
        }

        Ok(state.present.clone())
    }

    async fn release(&mut self) -> Result<()> {
        lock(&self.state).releases += 1;
        Ok(())
    }
}

/// Handle for controlling a [`MockCardSensor`].
#[derive(Debug, Clone)]
pub struct MockCardHandle {
    state: Arc<Mutex<CardState>>,
}

impl MockCardHandle {
    /// Place a card in the reader's field until [`remove`](Self::remove) is called.
    pub fn present(&self, id: CardId) {
        lock(&self.state).present = Some(id);
    }

    /// Take the card out of the field.
    pub fn remove(&self) {
        lock(&self.state).present = None;
    }

    /// Make the next `count` samples fail with a read error.
    pub fn fail_next(&self, count: usize) {
        lock(&self.state).fail_next = count;
    }

    /// Number of times the reader was sampled.
    pub fn sample_count(&self) -> usize {
        lock(&self.state).samples
    }

    /// Number of times the reader was released.
    pub fn release_count(&self) -> usize {
        lock(&self.state).releases
    }
}

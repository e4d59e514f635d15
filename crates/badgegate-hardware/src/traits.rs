//! Sensor trait definitions.
//!
//! A sensor is sampled, not awaited: each call to [`Sensor::sample`] reports
//! what the hardware sees right now (a card in the field, a key held down) and
//! returns immediately. Turning level readings into discrete events is the job
//! of the [`InputSource`](crate::source::InputSource) worker and its
//! [`Debouncer`](crate::debounce::Debouncer).
//!
//! The methods return `impl Future + Send` (Edition 2024 RPITIT) so sensors can
//! be moved into spawned tasks. Implementations may use plain `async fn`.
//!
//! # Object Safety
//!
//! These traits are NOT object-safe; use generic parameters:
//!
//! ```
//! use badgegate_hardware::traits::CardSensor;
//! use badgegate_hardware::Result;
//!
//! async fn card_in_field<S: CardSensor>(sensor: &mut S) -> Result<bool> {
//!     Ok(sensor.sample().await?.is_some())
//! }
//! ```

use crate::error::Result;
use badgegate_core::{CardId, InputEvent, InputKind, KeySymbol};
use std::fmt::Debug;
use std::future::Future;

/// A polled hardware sensor.
pub trait Sensor: Send + 'static {
    /// What the sensor reports while something is detected.
    type Reading: Clone + PartialEq + Debug + Into<InputEvent> + Send + 'static;

    /// Kind of events this sensor produces.
    const KIND: InputKind;

    /// Human readable device name for logs.
    fn name(&self) -> &str;

    /// Sample the sensor once.
    ///
    /// Returns `Ok(None)` when nothing is detected.
    ///
    /// # Errors
    ///
    /// Returns an error if the device could not be read. Callers treat
    /// errors as transient and retry after a backoff.
    fn sample(&mut self) -> impl Future<Output = Result<Option<Self::Reading>>> + Send;

    /// Release hardware resources (drive outputs low, close the bus).
    ///
    /// Called when the polling worker stops. The sensor must be usable again
    /// if the worker is restarted.
    fn release(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// A card reader: reports the id of the card in the field.
pub trait CardSensor: Sensor<Reading = CardId> {}

impl<T: Sensor<Reading = CardId>> CardSensor for T {}

/// A keypad: reports the key currently held down.
pub trait KeypadSensor: Sensor<Reading = KeySymbol> {}

impl<T: Sensor<Reading = KeySymbol>> KeypadSensor for T {}

/// GPIO lines of a row/column key matrix.
///
/// Rows are outputs, columns are inputs with pull-downs: a pressed key
/// connects its row to its column, so a column reads high only while its row
/// is driven high.
pub trait MatrixPins: Send + 'static {
    /// Number of row lines.
    fn rows(&self) -> usize;

    /// Number of column lines.
    fn cols(&self) -> usize;

    /// Drive a row line high or low.
    fn set_row(&mut self, row: usize, high: bool) -> Result<()>;

    /// Read a column line.
    fn read_col(&mut self, col: usize) -> Result<bool>;

    /// Drive every row low.
    fn reset(&mut self) -> Result<()> {
        for row in 0..self.rows() {
            self.set_row(row, false)?;
        }
        Ok(())
    }
}

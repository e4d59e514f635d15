//! Peripheral layer for the badge + PIN appliance.
//!
//! This crate turns polled hardware (card reader, matrix keypad) into a
//! single ordered stream of debounced [`InputEvent`](badgegate_core::InputEvent)s,
//! and renders receipts for the attached printer.
//!
//! # Layout
//!
//! - [`traits`]: the [`Sensor`] contract plus the [`MatrixPins`] GPIO seam.
//! - [`matrix`]: a 4x3 key matrix scanner implementing [`Sensor`].
//! - [`debounce`]: edge detection for level readings.
//! - [`source`]: the restartable polling worker around one sensor.
//! - [`manager`]: owns both sources and merges their events.
//! - [`printer`]: receipt rendering behind the `ReceiptEmitter` trait.
//! - [`mock`]: scriptable sensors for tests and the stdin-driven appliance.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] using [`HardwareError`].
//! Sensor read errors never stop a worker; they are logged and polling
//! resumes after a backoff.
//!
//! # Example
//!
//! ```no_run
//! use badgegate_hardware::manager::{PeripheralConfig, PeripheralManager};
//! use badgegate_hardware::matrix::MatrixKeypad;
//! use badgegate_hardware::mock::{MockCardSensor, MockMatrixPins};
//!
//! # async fn example() -> badgegate_hardware::Result<()> {
//! let (reader, _card) = MockCardSensor::new();
//! let (pins, _keys) = MockMatrixPins::new(4, 3);
//! let keypad = MatrixKeypad::new(pins)?;
//!
//! let (mut manager, mut events) =
//!     PeripheralManager::new(PeripheralConfig::default(), reader, keypad);
//! manager.start()?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod debounce;
pub mod error;
pub mod manager;
pub mod matrix;
pub mod mock;
pub mod printer;
pub mod source;
pub mod traits;

pub use error::{HardwareError, Result};
pub use manager::{PeripheralConfig, PeripheralManager, PeripheralStats};
pub use matrix::MatrixKeypad;
pub use printer::{AnyPrinter, DisabledPrinter, TextReceiptPrinter};
pub use source::{InputSource, Injector, SourceConfig, SourceState};
pub use traits::{CardSensor, KeypadSensor, MatrixPins, Sensor};

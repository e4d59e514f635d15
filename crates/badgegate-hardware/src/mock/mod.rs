//! Mock sensors for testing and development.
//!
//! Each mock is created together with a handle that changes what the sensor
//! reports (a card in the field, a key held down) and injects read faults.
//! Handles are cheap to clone and can be used from any task.

pub mod card;
pub mod keypad;
pub mod matrix;

pub use card::{MockCardHandle, MockCardSensor};
pub use keypad::{MockKeypadHandle, MockKeypadSensor};
pub use matrix::{MockMatrixHandle, MockMatrixPins};

use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

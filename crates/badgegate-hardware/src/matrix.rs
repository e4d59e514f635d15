//! Row/column matrix keypad scanner.
//!
//! Each row is driven high in turn and every column is sampled; the first
//! column found high identifies the pressed key. The row is driven low again
//! before moving on, so at most one row is ever high.

use crate::error::{HardwareError, Result};
use crate::traits::{MatrixPins, Sensor};
use badgegate_core::constants::KEYPAD_LAYOUT;
use badgegate_core::{InputKind, KeySymbol};

/// Keypad sensor over a GPIO key matrix.
///
/// # Examples
///
/// ```
/// use badgegate_hardware::matrix::MatrixKeypad;
/// use badgegate_hardware::mock::MockMatrixPins;
/// use badgegate_hardware::traits::Sensor;
/// use badgegate_core::KeySymbol;
///
/// # #[tokio::main]
/// # async fn main() -> badgegate_hardware::Result<()> {
/// let (pins, handle) = MockMatrixPins::new(4, 3);
/// let mut keypad = MatrixKeypad::new(pins)?;
///
/// handle.press(3, 2);
/// assert_eq!(keypad.sample().await?, Some(KeySymbol::Submit));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MatrixKeypad<P> {
    pins: P,
    layout: Vec<Vec<char>>,
    name: String,
}

impl<P: MatrixPins> MatrixKeypad<P> {
    /// Create a scanner using the standard 4x3 layout.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pins do not match the layout.
    pub fn new(pins: P) -> Result<Self> {
        let layout = KEYPAD_LAYOUT.iter().map(|row| row.to_vec()).collect();
        Self::with_layout(pins, layout)
    }

    /// Create a scanner with a custom key layout (row-major legends).
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the layout is empty, ragged, or does
    /// not match the pin counts.
    pub fn with_layout(mut pins: P, layout: Vec<Vec<char>>) -> Result<Self> {
        let cols = layout.first().map(Vec::len).unwrap_or(0);

        if layout.is_empty() || cols == 0 {
            return Err(HardwareError::configuration("keypad layout is empty"));
        }
        if layout.iter().any(|row| row.len() != cols) {
            return Err(HardwareError::configuration(
                "keypad layout rows have different lengths",
            ));
        }
        if layout.len() != pins.rows() || cols != pins.cols() {
            return Err(HardwareError::configuration(format!(
                "keypad layout is {}x{} but pins are {}x{}",
                layout.len(),
                cols,
                pins.rows(),
                pins.cols()
            )));
        }

        pins.reset()?;

        Ok(Self {
            name: format!("Matrix Keypad {}x{}", layout.len(), cols),
            pins,
            layout,
        })
    }

    /// Scan the matrix once.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin cannot be driven or read. The row being
    /// scanned is driven low before the error is returned.
    pub fn scan(&mut self) -> Result<Option<KeySymbol>> {
        for (row, legends) in self.layout.iter().enumerate() {
            self.pins.set_row(row, true)?;

            let mut found = None;
            for (col, legend) in legends.iter().enumerate() {
                match self.pins.read_col(col) {
                    Ok(true) => {
                        found = Some(*legend);
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        self.pins.set_row(row, false)?;
                        return Err(e);
                    }
                }
            }

            self.pins.set_row(row, false)?;

            if let Some(legend) = found {
                return Ok(Some(KeySymbol::from_char(legend)));
            }
        }

        Ok(None)
    }

    /// Access the underlying pins.
    pub fn pins(&self) -> &P {
        &self.pins
    }
}

impl<P: MatrixPins> Sensor for MatrixKeypad<P> {
    type Reading = KeySymbol;

    const KIND: InputKind = InputKind::Keypad;

    fn name(&self) -> &str {
        &self.name
    }

    async fn sample(&mut self) -> Result<Option<KeySymbol>> {
        self.scan()
    }

    async fn release(&mut self) -> Result<()> {
        self.pins.reset()
    }
}

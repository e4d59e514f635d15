//! Simulated GPIO lines for a key matrix.

use super::lock;
use crate::{HardwareError, Result, traits::MatrixPins};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct MatrixState {
    driven: Vec<bool>,
    cols: usize,
    pressed: Option<(usize, usize)>,
    fail_reads: usize,
    resets: usize,
}

/// In-memory [`MatrixPins`] for exercising [`MatrixKeypad`](crate::matrix::MatrixKeypad).
#[derive(Debug)]
pub struct MockMatrixPins {
    state: Arc<Mutex<MatrixState>>,
    rows: usize,
    cols: usize,
}

impl MockMatrixPins {
    pub fn new(rows: usize, cols: usize) -> (Self, MockMatrixHandle) {
        let state = Arc::new(Mutex::new(MatrixState {
            driven: vec![false; rows],
            cols,
            pressed: None,
            fail_reads: 0,
            resets: 0,
        }));

        let pins = Self {
            state: Arc::clone(&state),
            rows,
            cols,
        };

        (pins, MockMatrixHandle { state })
    }
}

impl MatrixPins for MockMatrixPins {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn set_row(&mut self, row: usize, high: bool) -> Result<()> {
        let mut state = lock(&self.state);
        let line = state
            .driven
            .get_mut(row)
            .ok_or_else(|| HardwareError::invalid_data(format!("no row line {row}")))?;
        *line = high;
        Ok(())
    }

    fn read_col(&mut self, col: usize) -> Result<bool> {
        let mut state = lock(&self.state);

        if col >= state.cols {
            return Err(HardwareError::invalid_data(format!("no column line {col}")));
        }

        if state.fail_reads > 0 {
            state.fail_reads -= 1;
            return Err(HardwareError::communication("simulated GPIO read failure"));
        }

        Ok(match state.pressed {
            Some((row, pressed_col)) => pressed_col == col && state.driven[row],
            None => false,
        })
    }

    fn reset(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.driven.iter_mut().for_each(|line| *line = false);
        state.resets += 1;
        Ok(())
    }
}

/// Handle for pressing keys on a [`MockMatrixPins`].
#[derive(Debug, Clone)]
pub struct MockMatrixHandle {
    state: Arc<Mutex<MatrixState>>,
}

impl MockMatrixHandle {
    /// Hold the key at `(row, col)`.
    pub fn press(&self, row: usize, col: usize) {
        lock(&self.state).pressed = Some((row, col));
    }

    /// Let go of the held key.
    pub fn release(&self) {
        lock(&self.state).pressed = None;
    }

    /// Make the next `count` column reads fail.
    pub fn fail_next_reads(&self, count: usize) {
        lock(&self.state).fail_reads = count;
    }

    /// Whether every row line is currently low.
    pub fn all_rows_low(&self) -> bool {
        lock(&self.state).driven.iter().all(|line| !line)
    }

    /// Number of times all rows were reset.
    pub fn reset_count(&self) -> usize {
        lock(&self.state).resets
    }
}

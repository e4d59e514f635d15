//! Edge detection for level-sampled sensors.

/// Turns a stream of level samples into discrete presses.
///
/// A reading is reported when it first appears. While the same reading stays
/// present it is reported again only if `repeat_while_held` is set; the
/// polling worker's settle delay then bounds the repeat rate.
///
/// ```
/// use badgegate_hardware::debounce::Debouncer;
///
/// let mut debouncer = Debouncer::new(false);
/// assert_eq!(debouncer.accept(Some('5')), Some('5'));
/// assert_eq!(debouncer.accept(Some('5')), None);
/// assert_eq!(debouncer.accept(None), None);
/// assert_eq!(debouncer.accept(Some('5')), Some('5'));
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer<R> {
    repeat_while_held: bool,
    held: Option<R>,
}

impl<R: Clone + PartialEq> Debouncer<R> {
    pub fn new(repeat_while_held: bool) -> Self {
        Self {
            repeat_while_held,
            held: None,
        }
    }

    /// Feed one sample; returns the reading if it should be emitted.
    pub fn accept(&mut self, sample: Option<R>) -> Option<R> {
        let emit = match (&sample, &self.held) {
            (None, _) => false,
            (Some(current), Some(held)) if current == held => self.repeat_while_held,
            (Some(_), _) => true,
        };

        self.held = sample;

        if emit { self.held.clone() } else { None }
    }

    /// Forget the held reading, e.g. after a read error.
    pub fn reset(&mut self) {
        self.held = None;
    }

    /// The reading currently considered held, if any.
    pub fn held(&self) -> Option<&R> {
        self.held.as_ref()
    }
}

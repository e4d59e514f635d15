//! Debounced input source: one polling worker per sensor.
//!
//! An [`InputSource`] owns a [`Sensor`] and, while started, a tokio task that
//! samples it at a fixed interval, debounces the readings and forwards the
//! resulting [`InputEvent`]s to the channel supplied at construction.
//!
//! ```text
//!            ┌────────────── worker task ──────────────┐
//! sensor ───►│ sample ─► Debouncer ─► settle delay     │──► mpsc<InputEvent>
//! inject ───►│ injected events (no debounce)           │
//!            └─────────────────────────────────────────┘
//! ```
//!
//! Stopping cancels the worker, waits for it to finish, releases the sensor
//! and takes it back so the source can be started again.
//!
//! # Examples
//!
//! ```
//! use badgegate_hardware::mock::MockKeypadSensor;
//! use badgegate_hardware::source::{InputSource, SourceConfig};
//! use badgegate_core::{InputEvent, KeySymbol};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> badgegate_hardware::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(16);
//!     let (keypad, _handle) = MockKeypadSensor::new();
//!     let mut source = InputSource::new(keypad, SourceConfig::keypad(), tx);
//!
//!     source.start()?;
//!     source.inject(InputEvent::key(KeySymbol::Digit(1)))?;
//!     assert_eq!(rx.recv().await, Some(InputEvent::key(KeySymbol::Digit(1))));
//!
//!     source.stop().await?;
//!     source.stop().await?; // idempotent
//!     Ok(())
//! }
//! ```

use crate::debounce::Debouncer;
use crate::error::{HardwareError, Result};
use crate::traits::Sensor;
use badgegate_core::constants::{
    CARD_POLL_INTERVAL_MS, CARD_QUIET_PERIOD_MS, DEFAULT_EVENT_QUEUE_CAPACITY,
    KEYPAD_POLL_INTERVAL_MS, KEYPAD_PRESS_SETTLE_MS, SENSOR_ERROR_BACKOFF_MS,
};
use badgegate_core::{InputEvent, InputKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timing and debounce settings for one input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Interval between sensor samples.
    pub poll_interval: Duration,

    /// Pause after an event is emitted before sampling resumes.
    pub settle_after_event: Duration,

    /// Report a reading again while it is still held (after the settle delay).
    pub repeat_while_held: bool,

    /// Pause after a failed sample.
    pub error_backoff: Duration,

    /// Capacity of the injection queue.
    pub inject_capacity: usize,
}

impl SourceConfig {
    /// Card reader defaults: 100ms polling, 2s quiet period after a card,
    /// a card left in the field is reported again once the quiet period ends.
    pub fn card() -> Self {
        Self {
            poll_interval: Duration::from_millis(CARD_POLL_INTERVAL_MS),
            settle_after_event: Duration::from_millis(CARD_QUIET_PERIOD_MS),
            repeat_while_held: true,
            error_backoff: Duration::from_millis(SENSOR_ERROR_BACKOFF_MS),
            inject_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }

    /// Keypad defaults: 50ms scanning, 200ms settle after a press,
    /// a held key is reported once.
    pub fn keypad() -> Self {
        Self {
            poll_interval: Duration::from_millis(KEYPAD_POLL_INTERVAL_MS),
            settle_after_event: Duration::from_millis(KEYPAD_PRESS_SETTLE_MS),
            repeat_while_held: false,
            error_backoff: Duration::from_millis(SENSOR_ERROR_BACKOFF_MS),
            inject_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }

    /// Defaults for the given source kind.
    pub fn for_kind(kind: InputKind) -> Self {
        match kind {
            InputKind::Card => Self::card(),
            InputKind::Keypad => Self::keypad(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_settle_after_event(mut self, settle: Duration) -> Self {
        self.settle_after_event = settle;
        self
    }

    pub fn with_repeat_while_held(mut self, repeat: bool) -> Self {
        self.repeat_while_held = repeat;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero poll interval or a zero
    /// injection capacity.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(HardwareError::configuration("poll interval must be non-zero"));
        }
        if self.inject_capacity == 0 {
            return Err(HardwareError::configuration(
                "injection queue capacity must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Lifecycle state of an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Not polling; the sensor is owned by the source.
    Stopped,

    /// Worker task is polling the sensor.
    Running,

    /// The worker died and the sensor was lost; the source cannot restart.
    Failed,
}

/// Cloneable handle for pushing synthetic events into a source.
///
/// Injected events skip the sensor and the debouncer, and are delivered by
/// the worker in the order they were injected. Events injected while the
/// source is stopped are delivered once it starts.
#[derive(Debug, Clone)]
pub struct Injector {
    kind: InputKind,
    tx: mpsc::Sender<InputEvent>,
}

impl Injector {
    /// Source kind this injector feeds.
    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// Queue an event without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the event kind does not match the source, or the
    /// injection queue is full.
    pub fn inject(&self, event: InputEvent) -> Result<()> {
        self.check_kind(&event)?;
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                HardwareError::communication(format!("{} injection queue is full", self.kind))
            }
            mpsc::error::TrySendError::Closed(_) => {
                HardwareError::disconnected(format!("{} input source", self.kind))
            }
        })
    }

    /// Queue an event, waiting for room in the injection queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the event kind does not match the source or the
    /// source has been dropped.
    pub async fn send(&self, event: InputEvent) -> Result<()> {
        self.check_kind(&event)?;
        self.tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected(format!("{} input source", self.kind)))
    }

    fn check_kind(&self, event: &InputEvent) -> Result<()> {
        if event.kind() != self.kind {
            return Err(HardwareError::invalid_data(format!(
                "cannot inject a {} event into the {} source",
                event.kind(),
                self.kind
            )));
        }
        Ok(())
    }
}

struct Worker<S> {
    cancel: CancellationToken,
    task: JoinHandle<Parked<S>>,
}

/// What a stopped source keeps between runs.
struct Parked<S> {
    sensor: S,
    inject_rx: mpsc::Receiver<InputEvent>,
    /// Injected event taken off the queue but not yet forwarded.
    held: Option<InputEvent>,
}

/// A restartable polling worker around one sensor.
pub struct InputSource<S: Sensor> {
    name: String,
    config: SourceConfig,
    events: mpsc::Sender<InputEvent>,
    inject_tx: mpsc::Sender<InputEvent>,
    parked: Option<Parked<S>>,
    worker: Option<Worker<S>>,
}

impl<S: Sensor> InputSource<S> {
    /// Create a stopped source that will forward events to `events`.
    pub fn new(sensor: S, config: SourceConfig, events: mpsc::Sender<InputEvent>) -> Self {
        let (inject_tx, inject_rx) = mpsc::channel(config.inject_capacity.max(1));

        Self {
            name: sensor.name().to_string(),
            config,
            events,
            inject_tx,
            parked: Some(Parked {
                sensor,
                inject_rx,
                held: None,
            }),
            worker: None,
        }
    }

    /// Device name of the underlying sensor.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InputKind {
        S::KIND
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn state(&self) -> SourceState {
        if self.worker.is_some() {
            SourceState::Running
        } else if self.parked.is_some() {
            SourceState::Stopped
        } else {
            SourceState::Failed
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start polling. Starting a running source is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the sensor was
    /// lost when a previous worker failed.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            debug!(source = %self.name, "Input source already running");
            return Ok(());
        }

        self.config.validate()?;

        let parked = self.parked.take().ok_or_else(|| {
            HardwareError::worker_failed(&self.name, "sensor lost after worker failure")
        })?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            parked,
            self.events.clone(),
            self.config.clone(),
            cancel.clone(),
        ));

        info!(source = %self.name, kind = %S::KIND, "Input source started");
        self.worker = Some(Worker { cancel, task });
        Ok(())
    }

    /// Stop polling and release the sensor.
    ///
    /// Returns once the worker has exited, which takes at most about one
    /// poll interval. Stopping a stopped (or never started) source is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker panicked; the sensor is lost and the
    /// source moves to [`SourceState::Failed`].
    pub async fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        worker.cancel.cancel();

        match worker.task.await {
            Ok(parked) => {
                self.parked = Some(parked);
                info!(source = %self.name, "Input source stopped");
                Ok(())
            }
            Err(e) => Err(HardwareError::worker_failed(&self.name, e.to_string())),
        }
    }

    /// Push a synthetic event; see [`Injector::inject`].
    pub fn inject(&self, event: InputEvent) -> Result<()> {
        self.injector().inject(event)
    }

    /// Get a cloneable injection handle.
    pub fn injector(&self) -> Injector {
        Injector {
            kind: S::KIND,
            tx: self.inject_tx.clone(),
        }
    }
}

impl<S: Sensor> Drop for InputSource<S> {
    fn drop(&mut self) {
        if let Some(worker) = &self.worker {
            worker.cancel.cancel();
        }
    }
}

impl<S: Sensor> std::fmt::Debug for InputSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSource")
            .field("name", &self.name)
            .field("kind", &S::KIND)
            .field("state", &self.state())
            .finish()
    }
}

enum Forwarded {
    Sent,
    /// Cancelled while waiting for room; the event is handed back.
    Cancelled(InputEvent),
    Closed,
}

/// Forward an event, giving up if cancelled or the consumer is gone.
async fn forward(
    events: &mpsc::Sender<InputEvent>,
    event: InputEvent,
    cancel: &CancellationToken,
) -> Forwarded {
    tokio::select! {
        _ = cancel.cancelled() => Forwarded::Cancelled(event),
        permit = events.reserve() => match permit {
            Ok(permit) => {
                permit.send(event);
                Forwarded::Sent
            }
            Err(_) => Forwarded::Closed,
        },
    }
}

/// Sleep unless cancelled first. Returns `false` on cancellation.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

async fn poll_loop<S: Sensor>(
    parked: Parked<S>,
    events: mpsc::Sender<InputEvent>,
    config: SourceConfig,
    cancel: CancellationToken,
) -> Parked<S> {
    let Parked {
        mut sensor,
        mut inject_rx,
        mut held,
    } = parked;
    let name = sensor.name().to_string();
    let mut debouncer = Debouncer::new(config.repeat_while_held);
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // An injected event left over from the previous run goes out first.
    let resumed = match held.take() {
        Some(event) => match forward(&events, event, &cancel).await {
            Forwarded::Sent => true,
            Forwarded::Cancelled(event) => {
                held = Some(event);
                false
            }
            Forwarded::Closed => false,
        },
        None => true,
    };
    if !resumed {
        return park(sensor, inject_rx, held, &name).await;
    }

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            Some(event) = inject_rx.recv() => {
                debug!(source = %name, kind = %event.kind(), "Injected event");
                match forward(&events, event, &cancel).await {
                    Forwarded::Sent => {}
                    Forwarded::Cancelled(event) => {
                        debug!(source = %name, "Holding injected event until restart");
                        held = Some(event);
                        break;
                    }
                    Forwarded::Closed => break,
                }
            }

            _ = ticker.tick() => {
                let sample = tokio::select! {
                    _ = cancel.cancelled() => break,
                    sample = sensor.sample() => sample,
                };

                match sample {
                    Ok(reading) => {
                        let Some(reading) = debouncer.accept(reading) else {
                            continue;
                        };

                        debug!(source = %name, kind = %S::KIND, "Sensor event");
                        if !matches!(
                            forward(&events, reading.into(), &cancel).await,
                            Forwarded::Sent
                        ) {
                            break;
                        }
                        if !pause(config.settle_after_event, &cancel).await {
                            break;
                        }
                        ticker.reset();
                    }
                    Err(e) => {
                        warn!(
                            source = %name,
                            error = %e,
                            transient = e.is_transient(),
                            backoff_ms = config.error_backoff.as_millis() as u64,
                            "Sensor read failed"
                        );
                        debouncer.reset();
                        if !pause(config.error_backoff, &cancel).await {
                            break;
                        }
                        ticker.reset();
                    }
                }
            }
        }
    }

    park(sensor, inject_rx, held, &name).await
}

/// Release the sensor and hand everything back to the source.
async fn park<S: Sensor>(
    mut sensor: S,
    inject_rx: mpsc::Receiver<InputEvent>,
    held: Option<InputEvent>,
    name: &str,
) -> Parked<S> {
    if let Err(e) = sensor.release().await {
        warn!(source = %name, error = %e, "Failed to release sensor");
    }

    Parked {
        sensor,
        inject_rx,
        held,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCardSensor, MockKeypadSensor};
    use badgegate_core::{CardId, KeySymbol};

    #[test]
    fn test_source_config_defaults() {
        let card = SourceConfig::card();
        assert_eq!(card.poll_interval, Duration::from_millis(100));
        assert_eq!(card.settle_after_event, Duration::from_secs(2));
        assert!(card.repeat_while_held);

        let keypad = SourceConfig::keypad();
        assert_eq!(keypad.poll_interval, Duration::from_millis(50));
        assert_eq!(keypad.settle_after_event, Duration::from_millis(200));
        assert!(!keypad.repeat_while_held);
        assert_eq!(keypad.error_backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_source_config_validation() {
        let config = SourceConfig::keypad().with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_err());
        assert!(SourceConfig::card().validate().is_ok());
    }

    #[test]
    fn test_new_source_is_stopped() {
        let (tx, _rx) = mpsc::channel(1);
        let (keypad, _handle) = MockKeypadSensor::new();
        let source = InputSource::new(keypad, SourceConfig::keypad(), tx);

        assert_eq!(source.state(), SourceState::Stopped);
        assert_eq!(source.kind(), InputKind::Keypad);
        assert_eq!(source.name(), "Mock Keypad");
    }

    #[tokio::test]
    async fn test_stop_never_started_is_noop() {
        let (tx, _rx) = mpsc::channel(1);
        let (reader, handle) = MockCardSensor::new();
        let mut source = InputSource::new(reader, SourceConfig::card(), tx);

        source.stop().await.unwrap();
        source.stop().await.unwrap();
        assert_eq!(source.state(), SourceState::Stopped);
        assert_eq!(handle.release_count(), 0);
    }

    #[test]
    fn test_inject_rejects_wrong_kind() {
        let (tx, _rx) = mpsc::channel(1);
        let (keypad, _handle) = MockKeypadSensor::new();
        let source = InputSource::new(keypad, SourceConfig::keypad(), tx);

        let result = source.inject(InputEvent::card(CardId::new("A1").unwrap()));
        assert!(matches!(result, Err(HardwareError::InvalidData { .. })));
        assert!(source.inject(InputEvent::key(KeySymbol::Submit)).is_ok());
    }
}

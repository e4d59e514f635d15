//! Peripheral manager.
//!
//! The `PeripheralManager` owns the card and keypad input sources and merges
//! their events into one channel consumed by the authentication coordinator.
//!
//! ```text
//! ┌──────────┐       ┌─────────────────┐
//! │ Card     │──────►│                 │
//! │ worker   │       │  Event Channel  │
//! └──────────┘       │  (mpsc)         │──────► AuthCoordinator
//! ┌──────────┐       │                 │
//! │ Keypad   │──────►│                 │
//! │ worker   │       └─────────────────┘
//! └──────────┘
//! ```
//!
//! Events from one source keep their order; events from the two sources
//! interleave in arrival order.
//!
//! # Examples
//!
//! ```
//! use badgegate_hardware::manager::{PeripheralConfig, PeripheralManager};
//! use badgegate_hardware::mock::{MockCardSensor, MockKeypadSensor};
//! use badgegate_core::{CardId, InputEvent};
//!
//! #[tokio::main]
//! async fn main() -> badgegate_hardware::Result<()> {
//!     let (reader, _card) = MockCardSensor::new();
//!     let (keypad, _keys) = MockKeypadSensor::new();
//!
//!     let (mut manager, mut events) =
//!         PeripheralManager::new(PeripheralConfig::default(), reader, keypad);
//!     manager.start()?;
//!
//!     manager.inject(InputEvent::card(CardId::new("A1").unwrap()))?;
//!     assert!(matches!(events.recv().await, Some(InputEvent::CardPresented { .. })));
//!
//!     manager.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::error::{HardwareError, Result};
use crate::source::{InputSource, Injector, SourceConfig, SourceState};
use crate::traits::{CardSensor, KeypadSensor};
use badgegate_core::constants::DEFAULT_EVENT_QUEUE_CAPACITY;
use badgegate_core::{InputEvent, InputKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Configuration for the peripheral manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Enable the card reader.
    pub card_enabled: bool,

    /// Enable the keypad.
    pub keypad_enabled: bool,

    /// Card source timing.
    pub card: SourceConfig,

    /// Keypad source timing.
    pub keypad: SourceConfig,

    /// Capacity of the merged event channel.
    pub event_capacity: usize,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            card_enabled: true,
            keypad_enabled: true,
            card: SourceConfig::card(),
            keypad: SourceConfig::keypad(),
            event_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl PeripheralConfig {
    pub fn with_card_enabled(mut self, enabled: bool) -> Self {
        self.card_enabled = enabled;
        self
    }

    pub fn with_keypad_enabled(mut self, enabled: bool) -> Self {
        self.keypad_enabled = enabled;
        self
    }

    pub fn with_card_source(mut self, config: SourceConfig) -> Self {
        self.card = config;
        self
    }

    pub fn with_keypad_source(mut self, config: SourceConfig) -> Self {
        self.keypad = config;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

/// Status of the managed sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralStats {
    pub card: SourceState,
    pub keypad: SourceState,
}

/// Owns the card and keypad sources.
#[derive(Debug)]
pub struct PeripheralManager<C: CardSensor, K: KeypadSensor> {
    card: InputSource<C>,
    keypad: InputSource<K>,
    events: mpsc::Sender<InputEvent>,
    config: PeripheralConfig,
}

impl<C: CardSensor, K: KeypadSensor> PeripheralManager<C, K> {
    /// Create a manager and the receiving end of its event channel.
    pub fn new(
        config: PeripheralConfig,
        card: C,
        keypad: K,
    ) -> (Self, mpsc::Receiver<InputEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));

        let manager = Self {
            card: InputSource::new(card, config.card.clone(), event_tx.clone()),
            keypad: InputSource::new(keypad, config.keypad.clone(), event_tx.clone()),
            events: event_tx,
            config,
        };

        (manager, event_rx)
    }

    /// Start every enabled source.
    ///
    /// # Errors
    ///
    /// Returns an error if a source fails to start; sources started before
    /// the failure keep running until [`stop`](Self::stop).
    pub fn start(&mut self) -> Result<()> {
        if self.config.card_enabled {
            self.card.start()?;
        }
        if self.config.keypad_enabled {
            self.keypad.start()?;
        }

        info!(
            card = self.card.is_running(),
            keypad = self.keypad.is_running(),
            "Peripherals started"
        );
        Ok(())
    }

    /// Stop both sources. Safe to call repeatedly.
    ///
    /// Both sources are stopped even if the first one fails; the first
    /// error is returned.
    pub async fn stop(&mut self) -> Result<()> {
        let card = self.card.stop().await;
        let keypad = self.keypad.stop().await;

        if let Err(e) = &card {
            warn!(error = %e, "Card source did not stop cleanly");
        }
        if let Err(e) = &keypad {
            warn!(error = %e, "Keypad source did not stop cleanly");
        }

        card.and(keypad)
    }

    /// Stop both sources and drop the manager, closing the event channel.
    pub async fn shutdown(mut self) -> Result<()> {
        self.stop().await
    }

    /// Route a synthetic event to the matching source.
    ///
    /// # Errors
    ///
    /// Returns an error if the matching source is disabled or its injection
    /// queue is full.
    pub fn inject(&self, event: InputEvent) -> Result<()> {
        self.injector(event.kind())?.inject(event)
    }

    /// Injection handle for one source.
    ///
    /// # Errors
    ///
    /// Returns an error if that source is disabled.
    pub fn injector(&self, kind: InputKind) -> Result<Injector> {
        if !self.is_enabled(kind) {
            return Err(HardwareError::unsupported(format!("{kind} input is disabled")));
        }
        Ok(match kind {
            InputKind::Card => self.card.injector(),
            InputKind::Keypad => self.keypad.injector(),
        })
    }

    /// Sender into the merged stream for producers other than the two
    /// sources, such as an operator console.
    ///
    /// Events sent here skip debouncing and keep the order they were sent
    /// in. The stream stays open while any clone is alive.
    pub fn sender(&self) -> mpsc::Sender<InputEvent> {
        self.events.clone()
    }

    pub fn is_enabled(&self, kind: InputKind) -> bool {
        match kind {
            InputKind::Card => self.config.card_enabled,
            InputKind::Keypad => self.config.keypad_enabled,
        }
    }

    pub fn stats(&self) -> PeripheralStats {
        PeripheralStats {
            card: self.card.state(),
            keypad: self.keypad.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCardSensor, MockKeypadSensor};
    use badgegate_core::KeySymbol;

    #[test]
    fn test_default_config() {
        let config = PeripheralConfig::default();
        assert!(config.card_enabled);
        assert!(config.keypad_enabled);
        assert_eq!(config.event_capacity, 100);
    }

    #[test]
    fn test_disabled_source_rejects_injection() {
        let (reader, _) = MockCardSensor::new();
        let (keypad, _) = MockKeypadSensor::new();
        let config = PeripheralConfig::default().with_keypad_enabled(false);

        let (manager, _events) = PeripheralManager::new(config, reader, keypad);

        assert!(!manager.is_enabled(InputKind::Keypad));
        assert!(matches!(
            manager.inject(InputEvent::key(KeySymbol::Submit)),
            Err(HardwareError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_only_enabled_sources() {
        let (reader, _) = MockCardSensor::new();
        let (keypad, _) = MockKeypadSensor::new();
        let config = PeripheralConfig::default().with_card_enabled(false);

        let (mut manager, _events) = PeripheralManager::new(config, reader, keypad);
        manager.start().unwrap();

        let stats = manager.stats();
        assert_eq!(stats.card, SourceState::Stopped);
        assert_eq!(stats.keypad, SourceState::Running);

        manager.stop().await.unwrap();
        assert_eq!(manager.stats().keypad, SourceState::Stopped);
    }

    #[tokio::test]
    async fn test_sender_feeds_merged_stream_in_order() {
        let (reader, _) = MockCardSensor::new();
        let (keypad, _) = MockKeypadSensor::new();

        let (manager, mut events) = PeripheralManager::new(PeripheralConfig::default(), reader, keypad);
        let console = manager.sender();

        let card = InputEvent::card(badgegate_core::CardId::new("A1").unwrap());
        let key = InputEvent::key(KeySymbol::Digit(1));
        console.send(card.clone()).await.unwrap();
        console.send(key.clone()).await.unwrap();

        assert_eq!(events.recv().await, Some(card));
        assert_eq!(events.recv().await, Some(key));

        drop(manager);
        drop(console);
        assert_eq!(events.recv().await, None);
    }
}

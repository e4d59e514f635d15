//! Appliance configuration from environment variables.
//!
//! | variable               | default | meaning                                  |
//! |------------------------|---------|------------------------------------------|
//! | `DATABASE_PATH`        | app.db  | SQLite file for users and access logs    |
//! | `RFID_READER_ENABLED`  | true    | poll the card reader                     |
//! | `KEYPAD_ENABLED`       | true    | scan the keypad                          |
//! | `PRINTER_ENABLED`      | true    | print receipts to stdout                 |
//! | `KEYPAD_POLL_MS`       | 50      | keypad scan interval                     |
//! | `CARD_POLL_MS`         | 100     | card reader poll interval                |
//! | `CARD_QUIET_MS`        | 2000    | quiet period after a card is read        |
//! | `SENSOR_BACKOFF_MS`    | 1000    | pause after a failed sensor read         |
//! | `SESSION_TIMEOUT_SECS` | unset   | abandon an idle session after this long  |
//! | `NOTIFICATION_CAPACITY`| 64      | per-subscriber notification buffer       |

use badgegate_core::constants::{
    CARD_POLL_INTERVAL_MS, CARD_QUIET_PERIOD_MS, DEFAULT_NOTIFICATION_CAPACITY,
    KEYPAD_POLL_INTERVAL_MS, SENSOR_ERROR_BACKOFF_MS,
};
use badgegate_core::{Error, Result};
use badgegate_hardware::{PeripheralConfig, SourceConfig};
use badgegate_session::CoordinatorConfig;
use badgegate_storage::DatabaseConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: String,
    pub rfid_reader_enabled: bool,
    pub keypad_enabled: bool,
    pub printer_enabled: bool,
    pub keypad_poll: Duration,
    pub card_poll: Duration,
    pub card_quiet: Duration,
    pub sensor_backoff: Duration,
    pub session_timeout: Option<Duration>,
    pub notification_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "app.db".to_string(),
            rfid_reader_enabled: true,
            keypad_enabled: true,
            printer_enabled: true,
            keypad_poll: Duration::from_millis(KEYPAD_POLL_INTERVAL_MS),
            card_poll: Duration::from_millis(CARD_POLL_INTERVAL_MS),
            card_quiet: Duration::from_millis(CARD_QUIET_PERIOD_MS),
            sensor_backoff: Duration::from_millis(SENSOR_ERROR_BACKOFF_MS),
            session_timeout: None,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Read the process environment.
    ///
    /// # Errors
    ///
    /// `Error::Config` for a value that does not parse, `Error::MissingConfig`
    /// for an empty `DATABASE_PATH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = Self::default();

        let database_path = match vars.get("DATABASE_PATH") {
            Some(path) if path.is_empty() => {
                return Err(Error::MissingConfig("DATABASE_PATH".to_string()));
            }
            Some(path) => path,
            None => defaults.database_path,
        };

        Ok(Self {
            database_path,
            rfid_reader_enabled: vars.parse(
                "RFID_READER_ENABLED",
                parse_bool,
                defaults.rfid_reader_enabled,
            )?,
            keypad_enabled: vars.parse("KEYPAD_ENABLED", parse_bool, defaults.keypad_enabled)?,
            printer_enabled: vars.parse("PRINTER_ENABLED", parse_bool, defaults.printer_enabled)?,
            keypad_poll: vars.parse("KEYPAD_POLL_MS", parse_interval_ms, defaults.keypad_poll)?,
            card_poll: vars.parse("CARD_POLL_MS", parse_interval_ms, defaults.card_poll)?,
            card_quiet: vars.parse("CARD_QUIET_MS", parse_millis, defaults.card_quiet)?,
            sensor_backoff: vars.parse("SENSOR_BACKOFF_MS", parse_millis, defaults.sensor_backoff)?,
            session_timeout: vars.parse(
                "SESSION_TIMEOUT_SECS",
                parse_timeout_secs,
                defaults.session_timeout,
            )?,
            notification_capacity: vars.parse(
                "NOTIFICATION_CAPACITY",
                parse_capacity,
                defaults.notification_capacity,
            )?,
        })
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_path.clone())
    }

    pub fn peripheral_config(&self) -> PeripheralConfig {
        PeripheralConfig::default()
            .with_card_enabled(self.rfid_reader_enabled)
            .with_keypad_enabled(self.keypad_enabled)
            .with_card_source(
                SourceConfig::card()
                    .with_poll_interval(self.card_poll)
                    .with_settle_after_event(self.card_quiet)
                    .with_error_backoff(self.sensor_backoff),
            )
            .with_keypad_source(
                SourceConfig::keypad()
                    .with_poll_interval(self.keypad_poll)
                    .with_error_backoff(self.sensor_backoff),
            )
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::default()
            .with_session_timeout(self.session_timeout)
            .with_notification_capacity(self.notification_capacity)
    }
}

type Parser<T> = fn(&str) -> std::result::Result<T, &'static str>;

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string())
    }

    fn parse<T>(&self, key: &str, parse: Parser<T>, default: T) -> Result<T> {
        match self.get(key) {
            Some(value) => parse(&value)
                .map_err(|reason| Error::Config(format!("{key}={value:?}: {reason}"))),
            None => Ok(default),
        }
    }
}

fn parse_bool(value: &str) -> std::result::Result<bool, &'static str> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err("expected true or false"),
    }
}

fn parse_millis(value: &str) -> std::result::Result<Duration, &'static str> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| "expected a whole number of milliseconds")
}

fn parse_interval_ms(value: &str) -> std::result::Result<Duration, &'static str> {
    let interval = parse_millis(value)?;
    if interval.is_zero() {
        return Err("poll interval must be greater than zero");
    }
    Ok(interval)
}

/// `0` disables the timeout.
fn parse_timeout_secs(value: &str) -> std::result::Result<Option<Duration>, &'static str> {
    let secs = value
        .parse::<u64>()
        .map_err(|_| "expected a whole number of seconds")?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_capacity(value: &str) -> std::result::Result<usize, &'static str> {
    match value.parse::<usize>() {
        Ok(0) | Err(_) => Err("expected a positive integer"),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database_path, "app.db");
        assert!(config.rfid_reader_enabled && config.keypad_enabled && config.printer_enabled);
        assert_eq!(config.keypad_poll, Duration::from_millis(50));
        assert_eq!(config.card_poll, Duration::from_millis(100));
        assert_eq!(config.card_quiet, Duration::from_secs(2));
        assert_eq!(config.sensor_backoff, Duration::from_secs(1));
        assert_eq!(config.session_timeout, None);
        assert_eq!(config.notification_capacity, 64);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_PATH", "/var/lib/badgegate/app.db"),
            ("RFID_READER_ENABLED", "false"),
            ("PRINTER_ENABLED", "FALSE"),
            ("KEYPAD_POLL_MS", "20"),
            ("CARD_QUIET_MS", "0"),
            ("SESSION_TIMEOUT_SECS", "30"),
            ("NOTIFICATION_CAPACITY", "8"),
        ])
        .unwrap();

        assert_eq!(config.database_path, "/var/lib/badgegate/app.db");
        assert!(!config.rfid_reader_enabled);
        assert!(config.keypad_enabled);
        assert!(!config.printer_enabled);
        assert_eq!(config.keypad_poll, Duration::from_millis(20));
        assert_eq!(config.card_quiet, Duration::ZERO);
        assert_eq!(config.session_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.notification_capacity, 8);
    }

    #[rstest]
    #[case("RFID_READER_ENABLED", "maybe")]
    #[case("KEYPAD_ENABLED", "")]
    #[case("KEYPAD_POLL_MS", "0")]
    #[case("CARD_POLL_MS", "-5")]
    #[case("SENSOR_BACKOFF_MS", "1s")]
    #[case("SESSION_TIMEOUT_SECS", "soon")]
    #[case("NOTIFICATION_CAPACITY", "0")]
    fn test_invalid_values_are_config_errors(#[case] key: &str, #[case] value: &str) {
        let err = config_from(&[(key, value)]).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(key));
    }

    #[test]
    fn test_empty_database_path_is_missing() {
        let err = config_from(&[("DATABASE_PATH", "  ")]).unwrap_err();
        assert!(matches!(err, Error::MissingConfig(key) if key == "DATABASE_PATH"));
    }

    #[test]
    fn test_zero_session_timeout_disables_it() {
        let config = config_from(&[("SESSION_TIMEOUT_SECS", "0")]).unwrap();
        assert_eq!(config.session_timeout, None);
    }

    #[test]
    fn test_component_configs() {
        let config = config_from(&[
            ("KEYPAD_ENABLED", "no"),
            ("CARD_POLL_MS", "250"),
            ("CARD_QUIET_MS", "500"),
            ("SENSOR_BACKOFF_MS", "300"),
            ("SESSION_TIMEOUT_SECS", "45"),
        ])
        .unwrap();

        let peripherals = config.peripheral_config();
        assert!(peripherals.card_enabled);
        assert!(!peripherals.keypad_enabled);
        assert_eq!(peripherals.card.poll_interval, Duration::from_millis(250));
        assert_eq!(peripherals.card.settle_after_event, Duration::from_millis(500));
        assert_eq!(peripherals.card.error_backoff, Duration::from_millis(300));
        assert!(peripherals.card.repeat_while_held);
        assert_eq!(peripherals.keypad.error_backoff, Duration::from_millis(300));
        assert!(!peripherals.keypad.repeat_while_held);

        let coordinator = config.coordinator_config();
        assert_eq!(coordinator.session_timeout, Some(Duration::from_secs(45)));
        assert_eq!(coordinator.notification_capacity, 64);

        assert_eq!(config.database_config().database_path, "app.db");
    }
}

//! Badge + PIN access appliance.
//!
//! Wires the peripheral layer, the session coordinator and the SQLite store
//! into one process, and provides the admin operations behind the
//! `badgegate` binary.

pub mod app;
pub mod config;
pub mod console;

pub use config::AppConfig;

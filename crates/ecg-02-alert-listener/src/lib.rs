//! # ECG-02 Alert Listener
//!
//! Downstream consumer of the record ledger's events. Runs independently
//! of the writer and never blocks it.
//!
//! ```text
//! Record Ledger ──emit──► Event Bus ──subscribe──► AlertListener
//!                                                      │
//!                                       ┌──────────────┴──────────────┐
//!                                       ▼                             ▼
//!                               EventLog (JSONL)              AlertSink (console)
//!                         {receivedAt,eventType,rawPayload}   "ACCESS GRANTED ALERT"
//! ```
//!
//! Identities are shortened to their `CN=` component for display, content
//! hashes to their first 20 characters. Missing fields show as `Unknown`.
//!
//! An event is a notification, not proof of durable ledger state.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::adapters::{CollectingAlertSink, ConsoleAlertSink, JsonlEventLog};
    pub use crate::config::ListenerConfig;
    pub use crate::domain::{shorten_hash, Alert, LogEntry};
    pub use crate::errors::ListenerError;
    pub use crate::ports::outbound::{AlertSink, EventLog};
    pub use crate::service::{AlertListener, ListenerStats};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Alert Listener";

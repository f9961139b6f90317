//! # ECG Node Library
//!
//! Runtime wiring for the ECG record ledger. The main entry point is the
//! `main.rs` binary; the modules are exposed here for tests.
//!
//! ## Event Flow
//!
//! ```text
//! storeRecord ──► RecordService ──► BusEventSink ──► InMemoryEventBus
//!                       ▲                                 │
//!                       │                 ┌───────────────┴───────────────┐
//!                       │                 ↓                               ↓
//!                 confirmRecord   VerificationHandler                AlertListener
//!                       │         (VERIFICATION_REQUESTED)           (all channels)
//!                       │                 │                               │
//!                       └─────────────────┘                     alerts + JSONL event log
//!                                   ContentStore
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod config;
pub mod demo;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod ports;
pub mod runtime;

pub use config::{load_config, NodeConfig};
pub use runtime::{NodeRuntime, ShutdownReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

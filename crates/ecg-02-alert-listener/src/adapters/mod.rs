//! # Adapters Layer
//!
//! Console and in-memory alert sinks, and the JSONL file event log.

pub mod jsonl_log;
pub mod sinks;

pub use jsonl_log::*;
pub use sinks::*;

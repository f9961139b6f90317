//! # Domain Layer
//!
//! Alert rendering and event-log entries. Pure, no I/O.

pub mod alert;
pub mod log_entry;

pub use alert::*;
pub use log_entry::*;

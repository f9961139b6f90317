//! # Shared Types Crate
//!
//! Vocabulary shared by the record ledger and its event consumers.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: The event payload schema lives here, so the
//!   writer and every listener agree on field names without a lookup.
//! - **Opaque Identity**: Caller identities are compared as strings; the only
//!   structure ever read out of them is the display name.
//! - **Self-Contained Events**: Every payload carries the patient id and the
//!   actor identities it refers to.

pub mod entities;
pub mod errors;
pub mod events;
pub mod identity;

pub use entities::*;
pub use errors::*;
pub use events::*;
pub use identity::*;

//! # Domain Layer (Inner Hexagon)
//!
//! Pure record logic: entities, invariants and the escrow state machine.
//! NO I/O, NO async. Adapters depend on this, never the reverse.

pub mod audit;
pub mod entities;
pub mod invariants;
pub mod transitions;
pub mod value_objects;

pub use audit::*;
pub use entities::*;
pub use invariants::*;
pub use transitions::*;
pub use value_objects::*;

//! # Shared Bus - Contract Event Transport
//!
//! Carries named contract events from the record ledger to any number of
//! independent consumers (alert listener, verification worker).
//!
//! ```text
//! ┌──────────────┐                    ┌────────────────┐
//! │ Record       │                    │ Alert listener │
//! │ ledger       │    publish()       │ Verifier       │
//! │              │ ──────┐            │                │
//! └──────────────┘       │            └────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - Publishing never blocks the writer; events sent with no subscriber are dropped.
//! - Each subscriber has a bounded buffer. A slow subscriber lags and the
//!   number of skipped events is logged, the publisher is never slowed down.
//! - Events are not durable. A received event is a notification, not proof
//!   of ledger state.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ContractEvent, EventFilter};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

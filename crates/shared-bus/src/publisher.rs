//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{ContractEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
///
/// Publishing is synchronous and never waits on consumers, so the ledger's
/// unit of work can call it directly after its write.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the event.
    fn publish(&self, event: ContractEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Stands in for the ledger's event service on a single node.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<ContractEvent>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Only events published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        debug!(
            contracts = ?filter.contracts,
            events = ?filter.event_names,
            "New subscription created"
        );
        Subscription::new(receiver, filter)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: ContractEvent) -> usize {
        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let contract = event.contract.clone();
        let event_name = event.event_name.clone();
        let tx_id = event.tx_id.clone();

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    contract = %contract,
                    event = %event_name,
                    tx_id = %tx_id,
                    receivers = receiver_count,
                    "Event published"
                );
                receiver_count
            }
            Err(_) => {
                warn!(
                    contract = %contract,
                    event = %event_name,
                    tx_id = %tx_id,
                    "Event dropped (no receivers)"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

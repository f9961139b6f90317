//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{ContractEvent, EventFilter};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// A subscription handle for receiving events.
pub struct Subscription {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<ContractEvent>,

    /// Filter for this subscription.
    filter: EventFilter,

    /// Events skipped because this subscriber fell behind.
    skipped: u64,
}

impl Subscription {
    /// Create a new subscription.
    pub(crate) fn new(receiver: broadcast::Receiver<ContractEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            skipped: 0,
        }
    }

    /// Receive the next event that matches the filter.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next matching event
    /// - `None` - The channel was closed (bus dropped)
    pub async fn recv(&mut self) -> Option<ContractEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.skipped += count;
                    warn!(skipped = count, "Subscriber lagged, events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
            // Event doesn't match filter, continue waiting
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available and matched
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<ContractEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    self.skipped += count;
                    warn!(skipped = count, "Subscriber lagged, events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Total events this subscriber missed by lagging.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(
            contracts = ?self.filter.contracts,
            events = ?self.filter.event_names,
            skipped = self.skipped,
            "Subscription dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{EventPublisher, InMemoryEventBus};
    use shared_types::events::channels;
    use std::time::Duration;
    use tokio::time::timeout;

    fn event(name: &str) -> ContractEvent {
        ContractEvent::new("ecgcontract", name, b"{}".to_vec(), "tx-1")
    }

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(event(channels::RECORD_STORED));

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert_eq!(received.event_name, channels::RECORD_STORED);
        assert_eq!(received.tx_id, "tx-1");
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let bus = InMemoryEventBus::new();

        let mut sub = bus.subscribe(
            EventFilter::contract("ecgcontract").with_events([channels::ACCESS_GRANTED]),
        );

        // Filtered out
        bus.publish(event(channels::RECORD_STORED));
        bus.publish(ContractEvent::new(
            "basic",
            channels::ACCESS_GRANTED,
            Vec::new(),
            "tx-2",
        ));
        // Delivered
        bus.publish(event(channels::ACCESS_GRANTED));

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert_eq!(received.event_name, channels::ACCESS_GRANTED);
        assert_eq!(received.contract, "ecgcontract");
    }

    #[tokio::test]
    async fn test_subscription_drop_cleanup() {
        let bus = InMemoryEventBus::new();

        {
            let _sub1 = bus.subscribe(EventFilter::all());
            let _sub2 = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }

        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_bus_dropped() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        drop(bus);

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout");
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_counts_skipped() {
        let bus = InMemoryEventBus::with_capacity(2);
        let mut sub = bus.subscribe(EventFilter::all());

        for _ in 0..5 {
            bus.publish(event(channels::DATA_ACCESSED));
        }

        // Oldest three were overwritten
        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout");
        assert!(received.is_some());
        assert_eq!(sub.skipped(), 3);
    }

    #[test]
    fn test_try_recv_empty() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[test]
    fn test_try_recv_event() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(event(channels::ACCESS_REVOKED));

        let result = sub.try_recv();
        assert!(matches!(
            result,
            Ok(Some(ContractEvent { ref event_name, .. })) if event_name == channels::ACCESS_REVOKED
        ));
    }

    #[test]
    fn test_try_recv_closed() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        drop(bus);

        assert_eq!(sub.try_recv(), Err(SubscriptionError::Closed));
    }
}

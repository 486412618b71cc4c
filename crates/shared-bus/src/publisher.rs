//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{DispatchEvent, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing events to the bus.
///
/// Publishing is fire-and-forget: it never blocks and never fails the
/// caller. Slow subscribers lag and lose events rather than applying
/// backpressure to the dispatch state machine.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the event.
    fn publish(&self, event: DispatchEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// Broadcast-backed bus. Every subscriber sees every event and filters
/// on its own side.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<DispatchEvent>,
    events_published: AtomicU64,
    /// Events published while nobody was listening.
    events_dropped: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is the per-subscriber backlog before the oldest events
    /// are dropped.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            capacity,
        }
    }

    /// Events published from now on that match `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Same as [`subscribe`](Self::subscribe), as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        debug!(topics = ?filter.topics, "New event stream created");
        EventStream::new(self.sender.subscribe(), filter)
    }

    /// Live subscriptions and streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events that found no receiver.
    #[must_use]
    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: DispatchEvent) -> usize {
        let topic = event.topic();
        let source = event.source_subsystem();

        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receiver_count) => {
                trace!(
                    topic = ?topic,
                    source = source,
                    receivers = receiver_count,
                    "Event published"
                );
                receiver_count
            }
            Err(_) => {
                // No receivers: observability is best-effort.
                self.events_dropped.fetch_add(1, Ordering::Relaxed);
                trace!(topic = ?topic, source = source, "Event dropped (no receivers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

/// Publisher that discards everything. For embedding the pipeline without
/// an observability consumer.
#[derive(Debug, Default)]
pub struct NullPublisher {
    published: AtomicU64,
}

impl EventPublisher for NullPublisher {
    fn publish(&self, _event: DispatchEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        0
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

//! # Shared Bus - Observability Event Bus
//!
//! Every subsystem of the dispatch pipeline publishes what it did here:
//! capability changes, strategy decisions, admission verdicts, job
//! lifecycle transitions and completed dispatch records.
//!
//! ## Delivery Rules
//!
//! - Publishing is synchronous and fire-and-forget. It never blocks the
//!   dispatch state machine and never fails it.
//! - Subscribers that fall behind lose the oldest events (`lagged`).
//! - Filtering happens on the receiving side (`EventFilter`).
//!
//! ```text
//! ┌──────────────┐    publish()     ┌──────────────┐   subscribe()   ┌─────────────┐
//! │ Orchestrator │ ───────────────→ │  Event Bus   │ ──────────────→ │ Metrics /   │
//! │ Store, ...   │                  │  (broadcast) │                 │ Audit log   │
//! └──────────────┘                  └──────────────┘                 └─────────────┘
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{sources, DispatchEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus, NullPublisher};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Events buffered per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

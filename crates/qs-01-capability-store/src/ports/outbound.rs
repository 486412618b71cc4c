//! Outbound Ports (Driven Ports / SPI)

use async_trait::async_trait;
use shared_types::CapabilityUpdate;

/// Source of capability telemetry.
///
/// Each record is self-contained. `None` means the feed is exhausted.
#[async_trait]
pub trait CapabilityFeed: Send {
    async fn next_update(&mut self) -> Option<CapabilityUpdate>;
}

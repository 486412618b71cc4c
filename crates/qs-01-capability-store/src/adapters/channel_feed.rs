//! Channel-backed capability feed.

use crate::ports::outbound::CapabilityFeed;
use async_trait::async_trait;
use shared_types::CapabilityUpdate;
use tokio::sync::mpsc;

/// Producer half: telemetry sources push updates here.
#[derive(Clone)]
pub struct FeedSender {
    tx: mpsc::Sender<CapabilityUpdate>,
}

impl FeedSender {
    /// Push an update, waiting for channel capacity.
    ///
    /// Returns the update back if the feed was dropped.
    pub async fn send(&self, update: CapabilityUpdate) -> Result<(), CapabilityUpdate> {
        self.tx.send(update).await.map_err(|e| e.0)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, implementing [`CapabilityFeed`].
pub struct ChannelFeed {
    rx: mpsc::Receiver<CapabilityUpdate>,
}

#[async_trait]
impl CapabilityFeed for ChannelFeed {
    async fn next_update(&mut self) -> Option<CapabilityUpdate> {
        self.rx.recv().await
    }
}

/// Bounded feed channel.
pub fn channel_feed(capacity: usize) -> (FeedSender, ChannelFeed) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (FeedSender { tx }, ChannelFeed { rx })
}

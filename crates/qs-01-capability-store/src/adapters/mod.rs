//! Adapters for the Capability Store
//!
//! - `channel_feed`: `CapabilityFeed` over a tokio mpsc channel
//! - `knowledge_base`: seeding targets from the hardware knowledge graph
//! - `calibration`: summarising per-qubit calibration reports

pub mod calibration;
pub mod channel_feed;
pub mod knowledge_base;

pub use calibration::{CalibrationReport, QubitCalibration};
pub use channel_feed::{channel_feed, ChannelFeed, FeedSender};
pub use knowledge_base::KnowledgeBase;

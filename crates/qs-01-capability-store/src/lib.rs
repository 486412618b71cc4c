//! # QS-01: Capability Store Subsystem
//!
//! Holds the last known quality metrics (coherence time, gate fidelity,
//! queue depth) of every execution target.
//!
//! ## Architecture
//!
//! - **Domain**: Update receipts, errors, invariants
//! - **Ports**: Inbound (`CapabilityStoreApi`) and Outbound (`CapabilityFeed`)
//! - **Adapters**: Channel-backed feed, knowledge-base seeding, calibration reports
//! - **Application**: `CapabilityStore`, the `parking_lot` guarded target map
//!
//! ## Rules
//!
//! - Updates replace, never merge. Last writer wins.
//! - A regressing timestamp is accepted but flagged.
//! - Metrics that violate the target invariant are refused and leave the
//!   previous entry untouched.
//! - Readers only ever receive copies.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{
    channel_feed, CalibrationReport, ChannelFeed, FeedSender, KnowledgeBase, QubitCalibration,
};
pub use application::store::CapabilityStore;
pub use config::CapabilityStoreConfig;
pub use domain::entities::UpdateReceipt;
pub use domain::errors::{CapabilityError, KnowledgeBaseError};
pub use ports::inbound::CapabilityStoreApi;
pub use ports::outbound::CapabilityFeed;

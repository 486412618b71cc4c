//! Capability store entities

use shared_types::{TargetId, Timestamp};

/// What an accepted update did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReceipt {
    pub target_id: TargetId,
    /// Revision of the entry after the update (first update = 1).
    pub revision: u64,
    /// Source timestamp of the applied update.
    pub timestamp: Timestamp,
    /// This update was older than the entry it replaced.
    pub timestamp_regressed: bool,
    /// The target was not known before this update.
    pub created: bool,
}

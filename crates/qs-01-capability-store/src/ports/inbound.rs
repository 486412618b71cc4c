//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::UpdateReceipt;
use crate::domain::errors::CapabilityError;
use shared_types::{CapabilityUpdate, ExecutionTarget, TargetId};

/// Primary Capability Store API
///
/// All operations are synchronous: the only blocking is a short critical
/// section on the target map.
pub trait CapabilityStoreApi: Send + Sync {
    /// Replace the stored metrics of `update.target_id`.
    ///
    /// Creates the target on its first update. Refuses metrics that violate
    /// the execution target invariant without touching the previous entry.
    fn update(&self, update: CapabilityUpdate) -> Result<UpdateReceipt, CapabilityError>;

    /// Copy of the current entry, or `None` for an unknown target.
    fn snapshot(&self, target_id: &TargetId) -> Option<ExecutionTarget>;

    /// Ids of all known targets, sorted.
    fn targets(&self) -> Vec<TargetId>;

    /// Number of known targets.
    fn len(&self) -> usize;

    /// Bound on the number of distinct targets.
    fn max_targets(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

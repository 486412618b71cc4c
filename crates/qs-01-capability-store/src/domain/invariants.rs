//! Domain invariants for the Capability Store

use shared_types::{CapabilityUpdate, ExecutionTarget};

/// INVARIANT-1: Stored entries always satisfy the metrics invariant.
pub fn invariant_valid_metrics(target: &ExecutionTarget) -> bool {
    target.metrics().validate().is_ok()
}

/// INVARIANT-2: Replace, never merge.
/// After applying `update`, the entry equals the update's metrics exactly.
pub fn invariant_replaced(target: &ExecutionTarget, update: &CapabilityUpdate) -> bool {
    target.id == update.target_id
        && target.metrics() == update.metrics
        && target.last_updated == update.timestamp
}

/// INVARIANT-3: Revisions count applied updates, starting at 1.
pub fn invariant_revision_advanced(before: Option<&ExecutionTarget>, after: &ExecutionTarget) -> bool {
    match before {
        Some(prev) => after.revision == prev.revision + 1,
        None => after.revision == 1,
    }
}

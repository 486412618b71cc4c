//! Invariants of the dispatch lifecycle.

use shared_types::{AdapterResult, AdmissionVerdict, DispatchRecord, JobState};

/// A job may only be dispatched on an APPROVE verdict.
pub fn invariant_dispatch_requires_approval(verdict: &AdmissionVerdict) -> bool {
    verdict.is_approved()
}

/// A completed record carries exactly one terminal result and a completion time.
pub fn invariant_record_completed(record: &DispatchRecord) -> bool {
    record.adapter_result.is_terminal() && record.completed_at.is_some()
}

/// History ends in exactly one terminal state, and only as its last entry.
pub fn invariant_single_terminal(history: &[JobState]) -> bool {
    match history.split_last() {
        Some((last, rest)) => last.is_terminal() && !rest.iter().any(|s| s.is_terminal()),
        None => false,
    }
}

/// Each consecutive pair of states is a lifecycle edge.
pub fn invariant_valid_path(history: &[JobState]) -> bool {
    history.first() == Some(&JobState::Received)
        && history.windows(2).all(|w| w[0].can_transition_to(w[1]))
}

/// Failed records always carry a failure reason.
pub fn invariant_failure_has_reason(record: &DispatchRecord) -> bool {
    match record.state() {
        JobState::Failed => matches!(record.adapter_result, AdapterResult::Failure(_)),
        _ => true,
    }
}

//! # Error Types
//!
//! Defines error types shared across subsystems.

use crate::entities::JobId;
use crate::lifecycle::JobState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capability metrics that violate the `ExecutionTarget` invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// Coherence time must be finite and strictly positive.
    #[error("Invalid coherence time: {0} (must be finite and > 0)")]
    InvalidCoherenceTime(f64),

    /// Fidelity must be finite and inside [0, 1].
    #[error("Invalid gate fidelity: {0} (must be within [0, 1])")]
    InvalidFidelity(f64),
}

/// Failure reported by an execution adapter.
///
/// Retrying is the adapter's own business; the orchestrator records these
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AdapterError {
    /// The backend ran the job and reported an error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend could not be reached or has no capacity.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the payload.
    #[error("Payload rejected by backend: {0}")]
    Rejected(String),

    /// The backend honoured a cancellation request.
    #[error("Cancelled by backend")]
    Cancelled,
}

/// Misuse of a `DispatchRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A terminal result was already recorded.
    #[error("Dispatch record {0} already completed")]
    AlreadyCompleted(JobId),

    /// `Pending` is not a terminal result.
    #[error("Dispatch record {0} can only be completed with a terminal result")]
    NotTerminal(JobId),
}

/// A lifecycle edge that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid job transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: JobState,
    pub to: JobState,
}

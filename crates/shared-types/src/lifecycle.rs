//! # Job Lifecycle
//!
//! ```text
//! RECEIVED ──→ STRATEGY_SELECTED ──→ APPROVED ──→ DISPATCHED ──→ SUCCEEDED
//!    │                │                               │
//!    │                │                               └──────→ FAILED
//!    └────────────────┴──→ REJECTED
//! ```
//!
//! `SUCCEEDED`, `FAILED` and `REJECTED` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::TransitionError;

/// State of a job inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Received,
    StrategySelected,
    Approved,
    Dispatched,
    Succeeded,
    Failed,
    Rejected,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed | JobState::Rejected)
    }

    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Received, StrategySelected)
                | (Received, Rejected)
                | (StrategySelected, Approved)
                | (StrategySelected, Rejected)
                | (Approved, Dispatched)
                | (Dispatched, Succeeded)
                | (Dispatched, Failed)
        )
    }

    /// Checked transition.
    pub fn transition(self, next: JobState) -> Result<JobState, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError { from: self, to: next })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Received => "RECEIVED",
            JobState::StrategySelected => "STRATEGY_SELECTED",
            JobState::Approved => "APPROVED",
            JobState::Dispatched => "DISPATCHED",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job ended in `REJECTED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// No capability snapshot exists for the target.
    UnknownTarget,
    /// Metrics or configuration failed validation (fail-safe reject).
    InvalidMetrics(String),
    /// Estimated duration not below `margin_factor * coherence_time`.
    CoherenceExceeded { margin: f64 },
    /// The target's adapter circuit is open.
    CircuitOpen,
    /// Cancelled by the submitter before dispatch.
    Cancelled,
}

impl RejectReason {
    /// Short label, used as a metric/event label.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::UnknownTarget => "unknown_target",
            RejectReason::InvalidMetrics(_) => "invalid_metrics",
            RejectReason::CoherenceExceeded { .. } => "coherence_exceeded",
            RejectReason::CircuitOpen => "circuit_open",
            RejectReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownTarget => f.write_str("unknown target"),
            RejectReason::InvalidMetrics(msg) => write!(f, "invalid metrics: {msg}"),
            RejectReason::CoherenceExceeded { margin } => {
                write!(f, "coherence margin {margin:.3} exceeds safety factor")
            }
            RejectReason::CircuitOpen => f.write_str("adapter circuit open"),
            RejectReason::Cancelled => f.write_str("cancelled before dispatch"),
        }
    }
}

//! # Dispatch Events
//!
//! Defines all event types that flow through the shared bus. The bus is the
//! observability sink of the pipeline: every capability change, admission
//! verdict and lifecycle transition is published here, fire-and-forget.

use serde::{Deserialize, Serialize};
use shared_types::{
    AdmissionVerdict, DispatchRecord, JobId, JobState, StrategyDecision, TargetId, Timestamp,
};

/// Subsystem identifiers used as event sources.
pub mod sources {
    pub const CAPABILITY_STORE: u8 = 1;
    pub const STRATEGY_INFERENCE: u8 = 2;
    pub const COHERENCE_VERIFIER: u8 = 3;
    pub const DISPATCH_ORCHESTRATOR: u8 = 4;
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DispatchEvent {
    // =========================================================================
    // SUBSYSTEM 1: CAPABILITY STORE
    // =========================================================================
    /// A capability update replaced the stored metrics of a target.
    CapabilityUpdated {
        target_id: TargetId,
        /// Revision after applying the update.
        revision: u64,
        /// Source timestamp of the update.
        timestamp: Timestamp,
        /// The update was older than the entry it replaced.
        timestamp_regressed: bool,
    },

    /// A capability update was refused (invalid metrics, store full).
    CapabilityRejected {
        target_id: TargetId,
        reason: String,
    },

    // =========================================================================
    // SUBSYSTEM 2: STRATEGY INFERENCE
    // =========================================================================
    /// A strategy was chosen for a job.
    StrategySelected(StrategyDecision),

    // =========================================================================
    // SUBSYSTEM 3: COHERENCE VERIFIER
    // =========================================================================
    /// An admission verdict was produced. Emitted for approvals and rejections.
    VerdictIssued {
        target_id: TargetId,
        verdict: AdmissionVerdict,
    },

    // =========================================================================
    // SUBSYSTEM 4: DISPATCH ORCHESTRATOR
    // =========================================================================
    /// A job moved to a new lifecycle state.
    JobStateChanged {
        job_id: JobId,
        target_id: TargetId,
        state: JobState,
        /// Rejection or failure reason, if any.
        reason: Option<String>,
        /// Admission margin, once known.
        margin: Option<f64>,
        timestamp: Timestamp,
    },

    /// A dispatch record received its terminal adapter result.
    RecordCompleted(DispatchRecord),

    /// The adapter circuit of a target changed state.
    CircuitStateChanged {
        target_id: TargetId,
        /// `closed`, `open` or `half-open`.
        state: String,
    },
}

impl DispatchEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::CapabilityUpdated { .. } | Self::CapabilityRejected { .. } => {
                EventTopic::Capability
            }
            Self::StrategySelected(_) | Self::VerdictIssued { .. } => EventTopic::Admission,
            Self::JobStateChanged { .. } => EventTopic::Lifecycle,
            Self::RecordCompleted(_) => EventTopic::Records,
            Self::CircuitStateChanged { .. } => EventTopic::Health,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::CapabilityUpdated { .. } | Self::CapabilityRejected { .. } => {
                sources::CAPABILITY_STORE
            }
            Self::StrategySelected(_) => sources::STRATEGY_INFERENCE,
            Self::VerdictIssued { .. } => sources::COHERENCE_VERIFIER,
            Self::JobStateChanged { .. }
            | Self::RecordCompleted(_)
            | Self::CircuitStateChanged { .. } => sources::DISPATCH_ORCHESTRATOR,
        }
    }

    /// Job the event refers to, if any.
    #[must_use]
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::StrategySelected(d) => Some(&d.job_id),
            Self::VerdictIssued { verdict, .. } => Some(&verdict.job_id),
            Self::JobStateChanged { job_id, .. } => Some(job_id),
            Self::RecordCompleted(r) => Some(&r.job_id),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Capability store changes.
    Capability,
    /// Strategy decisions and admission verdicts.
    Admission,
    /// Job state transitions.
    Lifecycle,
    /// Completed dispatch records.
    Records,
    /// Adapter circuit breaker changes.
    Health,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &DispatchEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}

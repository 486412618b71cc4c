//! # Core Domain Entities
//!
//! Defines the entities of the dispatch pipeline.
//!
//! ## Clusters
//!
//! - **Hardware**: `TargetId`, `CapabilityMetrics`, `CapabilityUpdate`, `ExecutionTarget`
//! - **Jobs**: `JobId`, `JobClass`, `Payload`, `JobRequest`
//! - **Decisions**: `Strategy`, `StrategyDecision`, `AdmissionVerdict`
//! - **Execution**: `PayloadResult`, `AdapterResult`, `DispatchRecord`

use crate::errors::{AdapterError, MetricsError, RecordError};
use crate::lifecycle::JobState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Current wall-clock time as a [`Timestamp`].
pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// CLUSTER A: HARDWARE
// =============================================================================

/// Identifier of an execution target (a physical or simulated backend).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TargetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Quality metrics reported by telemetry for one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapabilityMetrics {
    /// T1 coherence time in seconds.
    pub coherence_time: f64,
    /// Gate fidelity in `[0, 1]`.
    pub gate_fidelity: f64,
    /// Jobs waiting in the backend queue.
    pub queue_depth: u32,
}

impl CapabilityMetrics {
    pub fn new(coherence_time: f64, gate_fidelity: f64) -> Self {
        Self {
            coherence_time,
            gate_fidelity,
            queue_depth: 0,
        }
    }

    pub fn with_queue_depth(mut self, queue_depth: u32) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    /// Check the `ExecutionTarget` invariant: coherence time finite and
    /// positive, fidelity finite and within `[0, 1]`.
    pub fn validate(&self) -> Result<(), MetricsError> {
        if !self.coherence_time.is_finite() || self.coherence_time <= 0.0 {
            return Err(MetricsError::InvalidCoherenceTime(self.coherence_time));
        }
        if !self.gate_fidelity.is_finite() || !(0.0..=1.0).contains(&self.gate_fidelity) {
            return Err(MetricsError::InvalidFidelity(self.gate_fidelity));
        }
        Ok(())
    }
}

/// One self-contained record of the capability feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityUpdate {
    pub target_id: TargetId,
    pub metrics: CapabilityMetrics,
    /// Time the telemetry was sampled at the source.
    pub timestamp: Timestamp,
}

impl CapabilityUpdate {
    pub fn new(target_id: impl Into<TargetId>, metrics: CapabilityMetrics, timestamp: Timestamp) -> Self {
        Self {
            target_id: target_id.into(),
            metrics,
            timestamp,
        }
    }
}

/// Last known state of an execution target.
///
/// Only the capability store creates or replaces these; everybody else
/// works on copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTarget {
    pub id: TargetId,
    /// T1 coherence time in seconds.
    pub coherence_time: f64,
    pub gate_fidelity: f64,
    pub queue_depth: u32,
    /// Source timestamp of the update that produced this entry.
    pub last_updated: Timestamp,
    /// Number of updates applied to this target so far (first update = 1).
    pub revision: u64,
    /// Set when some update carried a timestamp older than its predecessor.
    pub timestamp_regressed: bool,
}

impl ExecutionTarget {
    pub fn metrics(&self) -> CapabilityMetrics {
        CapabilityMetrics {
            coherence_time: self.coherence_time,
            gate_fidelity: self.gate_fidelity,
            queue_depth: self.queue_depth,
        }
    }
}

// =============================================================================
// CLUSTER B: JOBS
// =============================================================================

/// Identifier of a job submission. Unique per submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for callers that do not bring their own.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Workload family of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobClass {
    /// Option pricing (amplitude estimation).
    #[serde(rename = "PRICING")]
    Pricing,
    /// Hedge optimisation (QAOA).
    #[serde(rename = "HEDGE_OPT")]
    HedgeOptimization,
}

impl JobClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobClass::Pricing => "PRICING",
            JobClass::HedgeOptimization => "HEDGE_OPT",
        }
    }
}

impl fmt::Display for JobClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque job payload. Cloning shares the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload(Arc<Vec<u8>>);

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::new(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Self::new(value.to_vec())
    }
}

/// A job as submitted. Immutable after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub id: JobId,
    /// Reference into the capability store, not ownership.
    pub target_id: TargetId,
    /// Estimated execution time on the device, in seconds.
    pub estimated_duration: f64,
    pub payload: Payload,
    pub job_class: JobClass,
    pub submitted_at: Timestamp,
}

impl JobRequest {
    pub fn new(
        id: impl Into<JobId>,
        target_id: impl Into<TargetId>,
        estimated_duration: f64,
        job_class: JobClass,
    ) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            estimated_duration,
            payload: Payload::default(),
            job_class,
            submitted_at: now_millis(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_submitted_at(mut self, ts: Timestamp) -> Self {
        self.submitted_at = ts;
        self
    }
}

// =============================================================================
// CLUSTER C: DECISIONS
// =============================================================================

/// Depth/complexity tier chosen for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strategy {
    /// Minimal depth, most noise-tolerant.
    #[serde(rename = "SHALLOW")]
    Shallow,
    #[serde(rename = "MEDIUM")]
    Medium,
    /// Maximal algorithmic depth.
    #[serde(rename = "DEEP")]
    Deep,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Shallow => "SHALLOW",
            Strategy::Medium => "MEDIUM",
            Strategy::Deep => "DEEP",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which inference rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdRule {
    FidelityDeep,
    FidelityMedium,
    Fallback,
}

/// Why a strategy was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    pub rule: ThresholdRule,
    pub observed_fidelity: f64,
    /// Threshold that fired; `None` for the fallback rule.
    pub threshold: Option<f64>,
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold {
            Some(t) => write!(
                f,
                "{:?}: fidelity {:.4} >= {:.4}",
                self.rule, self.observed_fidelity, t
            ),
            None => write!(
                f,
                "{:?}: fidelity {:.4} below all thresholds",
                self.rule, self.observed_fidelity
            ),
        }
    }
}

/// Output of the strategy inference engine. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub job_id: JobId,
    pub target_id: TargetId,
    pub job_class: JobClass,
    pub strategy: Strategy,
    /// Algorithmic depth (layers) for the chosen tier.
    pub depth: u32,
    pub rationale: Rationale,
    /// Revision of the capability snapshot the decision was made on.
    pub target_revision: u64,
}

/// Admit or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionOutcome {
    #[serde(rename = "APPROVE")]
    Approve,
    #[serde(rename = "REJECT")]
    Reject,
}

impl fmt::Display for AdmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionOutcome::Approve => f.write_str("APPROVE"),
            AdmissionOutcome::Reject => f.write_str("REJECT"),
        }
    }
}

/// Output of the coherence verifier. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionVerdict {
    pub job_id: JobId,
    pub outcome: AdmissionOutcome,
    /// `estimated_duration / coherence_time`.
    pub margin: f64,
    /// Safety factor the margin was compared against.
    pub margin_factor: f64,
    pub timestamp: Timestamp,
}

impl AdmissionVerdict {
    pub fn is_approved(&self) -> bool {
        self.outcome == AdmissionOutcome::Approve
    }
}

// =============================================================================
// CLUSTER D: EXECUTION
// =============================================================================

/// Opaque adapter output, passed through to the submitter untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadResult(Arc<Vec<u8>>);

impl PayloadResult {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::new(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Why a dispatched job failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The adapter reported a failure.
    Adapter(AdapterError),
    /// The dispatch deadline passed before the adapter answered.
    Timeout { deadline: Timestamp },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Adapter(e) => write!(f, "adapter error: {e}"),
            FailureReason::Timeout { deadline } => write!(f, "adapter timeout (deadline {deadline})"),
        }
    }
}

/// Adapter side of a dispatch record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdapterResult {
    Pending,
    Success(PayloadResult),
    Failure(FailureReason),
}

impl AdapterResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AdapterResult::Pending)
    }
}

/// The unit persisted for every admitted job.
///
/// Created with `AdapterResult::Pending` when the job is approved, completed
/// exactly once with its terminal result, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub job_id: JobId,
    pub target_id: TargetId,
    pub decision: StrategyDecision,
    pub verdict: AdmissionVerdict,
    pub adapter_result: AdapterResult,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl DispatchRecord {
    pub fn new(decision: StrategyDecision, verdict: AdmissionVerdict, created_at: Timestamp) -> Self {
        Self {
            job_id: decision.job_id.clone(),
            target_id: decision.target_id.clone(),
            decision,
            verdict,
            adapter_result: AdapterResult::Pending,
            created_at,
            completed_at: None,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.decision.strategy
    }

    /// Record the terminal adapter result. Allowed exactly once.
    pub fn complete(&mut self, result: AdapterResult, at: Timestamp) -> Result<(), RecordError> {
        if self.adapter_result.is_terminal() {
            return Err(RecordError::AlreadyCompleted(self.job_id.clone()));
        }
        if !result.is_terminal() {
            return Err(RecordError::NotTerminal(self.job_id.clone()));
        }
        self.adapter_result = result;
        self.completed_at = Some(at);
        Ok(())
    }

    /// `Succeeded` / `Failed` once completed, `Dispatched` while pending.
    pub fn state(&self) -> JobState {
        match self.adapter_result {
            AdapterResult::Pending => JobState::Dispatched,
            AdapterResult::Success(_) => JobState::Succeeded,
            AdapterResult::Failure(_) => JobState::Failed,
        }
    }
}

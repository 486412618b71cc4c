//! Error types for the Dispatch Orchestrator

use shared_types::{AdapterError, JobId, JobState, TargetId, Timestamp};
use thiserror::Error;

/// All errors a job submission can end in.
///
/// `UnknownTarget`, `InvalidMetrics`, `DuplicateJob` and `Stopped` are
/// returned synchronously from `submit`, `StoreFull` from `apply_update`;
/// the others surface through the job's outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// No capability telemetry was ever seen for the target
    #[error("Unknown target: {0}")]
    UnknownTarget(TargetId),

    /// Malformed or non-positive metrics or job duration (fail-safe reject)
    #[error("Invalid metrics: {0}")]
    InvalidMetrics(String),

    /// A new target would exceed the capability store bound
    #[error("Capability store full: {max} targets")]
    StoreFull { max: usize },

    /// The job id was already submitted
    #[error("Duplicate job: {0}")]
    DuplicateJob(JobId),

    /// The adapter reported a failure
    #[error("Adapter error: {0}")]
    Adapter(AdapterError),

    /// The dispatch deadline passed
    #[error("Adapter timeout (deadline {deadline})")]
    AdapterTimeout { deadline: Timestamp },

    /// The target's adapter circuit is open
    #[error("Adapter circuit open for target {0}")]
    CircuitOpen(TargetId),

    /// Cancelled before dispatch
    #[error("Job cancelled: {0}")]
    Cancelled(JobId),

    /// The orchestrator is shutting down
    #[error("Orchestrator stopped")]
    Stopped,
}

/// Errors from `cancel`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelError {
    #[error("Unknown job: {0}")]
    UnknownJob(JobId),

    /// Only jobs still waiting in their lane can be cancelled
    #[error("Job {job_id} is {state} and can no longer be cancelled")]
    NotCancellable { job_id: JobId, state: JobState },
}

/// Errors from record sinks
#[derive(Debug, Error)]
pub enum RecordSinkError {
    #[error("Record log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

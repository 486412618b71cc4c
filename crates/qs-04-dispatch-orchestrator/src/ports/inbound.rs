//! Inbound Ports (Driving Ports / API)

use crate::domain::errors::{CancelError, DispatchError};
use crate::domain::outcome::JobTicket;
use crate::domain::registry::StateTransition;
use async_trait::async_trait;
use shared_types::{
    CapabilityUpdate, DispatchRecord, ExecutionTarget, JobId, JobRequest, JobState, TargetId,
};

/// Primary Dispatch Orchestrator API
#[async_trait]
pub trait DispatchApi: Send + Sync {
    /// Route a capability update to its target's lane.
    ///
    /// The update is applied before any job submitted after this call
    /// returns is decided. Invalid metrics, and a new target the capability
    /// store has no room for, are refused here without opening a lane.
    fn apply_update(&self, update: CapabilityUpdate) -> Result<(), DispatchError>;

    /// Queue a job on its target's lane.
    ///
    /// `DuplicateJob`, `UnknownTarget` and `InvalidMetrics` (non-finite or
    /// negative duration) are returned synchronously; every other outcome
    /// arrives through the ticket.
    fn submit(&self, job: JobRequest) -> Result<JobTicket, DispatchError>;

    /// Cancel a job that is still waiting in its lane.
    fn cancel(&self, job_id: &JobId) -> Result<(), CancelError>;

    /// Copy of the current capability entry.
    fn snapshot(&self, target_id: &TargetId) -> Option<ExecutionTarget>;

    fn job_state(&self, job_id: &JobId) -> Option<JobState>;

    /// Lifecycle transitions of a job, oldest first.
    fn transitions(&self, job_id: &JobId) -> Option<Vec<StateTransition>>;

    /// Completed dispatch records, in completion order.
    fn records(&self) -> Vec<DispatchRecord>;

    /// Stop accepting work and wait until lanes and in-flight dispatches
    /// have drained.
    async fn shutdown(&self);
}

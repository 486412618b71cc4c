//! Job tickets and outcomes.

use crate::domain::errors::DispatchError;
use serde::{Deserialize, Serialize};
use shared_types::{
    AdapterResult, AdmissionVerdict, DispatchRecord, FailureReason, JobId, JobState,
    RejectReason, StrategyDecision, TargetId,
};
use tokio::sync::oneshot;

/// Terminal result of a submitted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobOutcome {
    /// Dispatched and finished: SUCCEEDED or FAILED.
    Completed(DispatchRecord),
    /// Never dispatched.
    Rejected {
        job_id: JobId,
        target_id: TargetId,
        reason: RejectReason,
        /// Present once a strategy was selected.
        decision: Option<StrategyDecision>,
        /// Present once the verifier ran.
        verdict: Option<AdmissionVerdict>,
    },
}

impl JobOutcome {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobOutcome::Completed(record) => &record.job_id,
            JobOutcome::Rejected { job_id, .. } => job_id,
        }
    }

    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Completed(record) => record.state(),
            JobOutcome::Rejected { .. } => JobState::Rejected,
        }
    }

    pub fn record(&self) -> Option<&DispatchRecord> {
        match self {
            JobOutcome::Completed(record) => Some(record),
            JobOutcome::Rejected { .. } => None,
        }
    }

    pub fn verdict(&self) -> Option<&AdmissionVerdict> {
        match self {
            JobOutcome::Completed(record) => Some(&record.verdict),
            JobOutcome::Rejected { verdict, .. } => verdict.as_ref(),
        }
    }

    pub fn decision(&self) -> Option<&StrategyDecision> {
        match self {
            JobOutcome::Completed(record) => Some(&record.decision),
            JobOutcome::Rejected { decision, .. } => decision.as_ref(),
        }
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            JobOutcome::Rejected { reason, .. } => Some(reason),
            JobOutcome::Completed(_) => None,
        }
    }

    /// The error this outcome represents, if any.
    ///
    /// A coherence rejection is a verdict, not an error, and maps to `None`.
    pub fn error(&self) -> Option<DispatchError> {
        match self {
            JobOutcome::Completed(record) => match &record.adapter_result {
                AdapterResult::Failure(FailureReason::Adapter(e)) => {
                    Some(DispatchError::Adapter(e.clone()))
                }
                AdapterResult::Failure(FailureReason::Timeout { deadline }) => {
                    Some(DispatchError::AdapterTimeout {
                        deadline: *deadline,
                    })
                }
                AdapterResult::Success(_) | AdapterResult::Pending => None,
            },
            JobOutcome::Rejected {
                job_id,
                target_id,
                reason,
                ..
            } => match reason {
                RejectReason::UnknownTarget => Some(DispatchError::UnknownTarget(target_id.clone())),
                RejectReason::InvalidMetrics(msg) => Some(DispatchError::InvalidMetrics(msg.clone())),
                RejectReason::CircuitOpen => Some(DispatchError::CircuitOpen(target_id.clone())),
                RejectReason::Cancelled => Some(DispatchError::Cancelled(job_id.clone())),
                RejectReason::CoherenceExceeded { .. } => None,
            },
        }
    }
}

/// Handle returned by `submit`; resolves to the job's terminal outcome.
#[derive(Debug)]
pub struct JobTicket {
    job_id: JobId,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobTicket {
    pub(crate) fn new(job_id: JobId, rx: oneshot::Receiver<JobOutcome>) -> Self {
        Self { job_id, rx }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Wait for the terminal outcome.
    ///
    /// Fails with `Stopped` only if the orchestrator was dropped before the
    /// job finished.
    pub async fn outcome(self) -> Result<JobOutcome, DispatchError> {
        self.rx.await.map_err(|_| DispatchError::Stopped)
    }
}

//! Job registry
//!
//! Tracks every submitted job's lifecycle state and transition history, and
//! holds the one-shot channel its terminal outcome is delivered on.

use crate::domain::errors::{CancelError, DispatchError};
use crate::domain::outcome::JobOutcome;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::{JobId, JobState, TargetId, Timestamp};
use tokio::sync::oneshot;

/// One edge of a job's lifecycle, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition {
    /// `None` for the initial RECEIVED entry.
    pub from: Option<JobState>,
    pub to: JobState,
    pub at: Timestamp,
    pub reason: Option<String>,
}

#[derive(Debug)]
struct JobEntry {
    target_id: TargetId,
    state: JobState,
    history: Vec<StateTransition>,
    outcome_tx: Option<oneshot::Sender<JobOutcome>>,
}

impl JobEntry {
    fn advance(&mut self, to: JobState, at: Timestamp, reason: Option<String>) -> bool {
        if !self.state.can_transition_to(to) {
            return false;
        }
        self.history.push(StateTransition {
            from: Some(self.state),
            to,
            at,
            reason,
        });
        self.state = to;
        true
    }
}

/// Concurrent map of job id to lifecycle entry.
///
/// Entries are kept after completion so that a job id can never be reused.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<JobId, JobEntry>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job in RECEIVED.
    pub fn register(
        &self,
        job_id: JobId,
        target_id: TargetId,
        outcome_tx: oneshot::Sender<JobOutcome>,
        now: Timestamp,
    ) -> Result<(), DispatchError> {
        match self.jobs.entry(job_id) {
            Entry::Occupied(e) => Err(DispatchError::DuplicateJob(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(JobEntry {
                    target_id,
                    state: JobState::Received,
                    history: vec![StateTransition {
                        from: None,
                        to: JobState::Received,
                        at: now,
                        reason: None,
                    }],
                    outcome_tx: Some(outcome_tx),
                });
                Ok(())
            }
        }
    }

    /// Move a job along a non-terminal edge.
    ///
    /// Returns `false` if the job is unknown or the edge does not exist from
    /// its current state (for instance because it was cancelled meanwhile).
    pub fn transition(&self, job_id: &JobId, to: JobState, now: Timestamp) -> bool {
        match self.jobs.get_mut(job_id) {
            Some(mut entry) => entry.advance(to, now, None),
            None => false,
        }
    }

    /// Move a job into a terminal state and deliver its outcome.
    ///
    /// Both happen under the entry lock, so exactly one terminal state is
    /// ever recorded and exactly one outcome sent.
    pub fn complete(
        &self,
        job_id: &JobId,
        to: JobState,
        reason: Option<String>,
        outcome: JobOutcome,
        now: Timestamp,
    ) -> bool {
        debug_assert!(to.is_terminal());
        let Some(mut entry) = self.jobs.get_mut(job_id) else {
            return false;
        };
        if !entry.advance(to, now, reason) {
            return false;
        }
        if let Some(tx) = entry.outcome_tx.take() {
            // The submitter may have dropped its ticket.
            let _ = tx.send(outcome);
        }
        true
    }

    /// Cancel a job that has not left RECEIVED yet.
    pub fn cancel(&self, job_id: &JobId, now: Timestamp) -> Result<TargetId, CancelError> {
        let Some(mut entry) = self.jobs.get_mut(job_id) else {
            return Err(CancelError::UnknownJob(job_id.clone()));
        };
        if entry.state != JobState::Received {
            return Err(CancelError::NotCancellable {
                job_id: job_id.clone(),
                state: entry.state,
            });
        }
        let target_id = entry.target_id.clone();
        entry.advance(
            JobState::Rejected,
            now,
            Some(shared_types::RejectReason::Cancelled.to_string()),
        );
        if let Some(tx) = entry.outcome_tx.take() {
            let _ = tx.send(JobOutcome::Rejected {
                job_id: job_id.clone(),
                target_id: target_id.clone(),
                reason: shared_types::RejectReason::Cancelled,
                decision: None,
                verdict: None,
            });
        }
        Ok(target_id)
    }

    pub fn state(&self, job_id: &JobId) -> Option<JobState> {
        self.jobs.get(job_id).map(|e| e.state)
    }

    /// Transition history of a job, oldest first.
    pub fn transitions(&self, job_id: &JobId) -> Option<Vec<StateTransition>> {
        self.jobs.get(job_id).map(|e| e.history.clone())
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.jobs.contains_key(job_id)
    }

    /// Forget a job. Only used to roll back a submission that never reached
    /// its lane.
    pub(crate) fn remove(&self, job_id: &JobId) {
        self.jobs.remove(job_id);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

//! Inbound Ports (Driving Ports / API)

use crate::domain::errors::VerificationError;
use shared_types::{AdmissionVerdict, ExecutionTarget, JobId, Timestamp};

/// Primary Coherence Verifier API
pub trait CoherenceVerifierApi: Send + Sync {
    /// Admit or reject `job_id` against the snapshot's coherence budget.
    ///
    /// Pure given the same `now`.
    fn verify(
        &self,
        job_id: &JobId,
        estimated_duration: f64,
        snapshot: &ExecutionTarget,
        now: Timestamp,
    ) -> Result<AdmissionVerdict, VerificationError>;
}

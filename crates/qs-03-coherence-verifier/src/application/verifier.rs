//! Coherence Verifier
//!
//! Main service implementing `CoherenceVerifierApi`.

use crate::algorithms::margin::evaluate;
use crate::config::VerifierConfig;
use crate::domain::errors::VerificationError;
use crate::ports::inbound::CoherenceVerifierApi;
use shared_types::{AdmissionVerdict, ExecutionTarget, JobId, Timestamp};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CoherenceVerifier {
    config: VerifierConfig,
}

impl CoherenceVerifier {
    /// Create a new verifier with the default 0.5 margin factor
    pub fn new() -> Self {
        Self {
            config: VerifierConfig::default(),
        }
    }

    /// Create a new verifier with custom config
    pub fn with_config(config: VerifierConfig) -> Result<Self, VerificationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }
}

impl Default for CoherenceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CoherenceVerifierApi for CoherenceVerifier {
    fn verify(
        &self,
        job_id: &JobId,
        estimated_duration: f64,
        snapshot: &ExecutionTarget,
        now: Timestamp,
    ) -> Result<AdmissionVerdict, VerificationError> {
        let (outcome, margin) = evaluate(
            estimated_duration,
            snapshot.coherence_time,
            self.config.margin_factor,
        )?;

        let verdict = AdmissionVerdict {
            job_id: job_id.clone(),
            outcome,
            margin,
            margin_factor: self.config.margin_factor,
            timestamp: now,
        };

        if verdict.is_approved() {
            debug!(
                job_id = %job_id,
                target_id = %snapshot.id,
                margin,
                "Coherence check passed"
            );
        } else {
            warn!(
                job_id = %job_id,
                target_id = %snapshot.id,
                margin,
                margin_factor = self.config.margin_factor,
                estimated_duration,
                coherence_time = snapshot.coherence_time,
                "Coherence violation: job exceeds T1 safety budget"
            );
        }

        Ok(verdict)
    }
}

//! Inbound Ports (Driving Ports / API)

use crate::domain::errors::InferenceError;
use shared_types::{ExecutionTarget, JobClass, JobId, StrategyDecision};

/// Primary Strategy Inference API
pub trait StrategyInferenceApi: Send + Sync {
    /// Choose a strategy for `job_id` on the given snapshot.
    ///
    /// Pure and idempotent: no state is read besides the arguments and the
    /// engine's configuration.
    fn select(
        &self,
        job_id: &JobId,
        snapshot: Option<&ExecutionTarget>,
        job_class: JobClass,
    ) -> Result<StrategyDecision, InferenceError>;
}

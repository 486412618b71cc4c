//! Strategy Engine
//!
//! Main service implementing `StrategyInferenceApi`.

use crate::algorithms::rules::select_strategy;
use crate::config::InferenceConfig;
use crate::domain::errors::InferenceError;
use crate::ports::inbound::StrategyInferenceApi;
use shared_types::{ExecutionTarget, JobClass, JobId, StrategyDecision};
use tracing::debug;

/// Holds a validated [`InferenceConfig`].
#[derive(Debug, Clone)]
pub struct StrategyEngine {
    config: InferenceConfig,
}

impl StrategyEngine {
    /// Create a new engine with default thresholds
    pub fn new() -> Self {
        Self {
            config: InferenceConfig::default(),
        }
    }

    /// Create a new engine with custom thresholds
    pub fn with_config(config: InferenceConfig) -> Result<Self, InferenceError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
}

impl Default for StrategyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyInferenceApi for StrategyEngine {
    fn select(
        &self,
        job_id: &JobId,
        snapshot: Option<&ExecutionTarget>,
        job_class: JobClass,
    ) -> Result<StrategyDecision, InferenceError> {
        let decision = select_strategy(job_id, snapshot, job_class, &self.config)?;
        debug!(
            job_id = %decision.job_id,
            target_id = %decision.target_id,
            strategy = %decision.strategy,
            depth = decision.depth,
            rationale = %decision.rationale,
            "Strategy selected"
        );
        Ok(decision)
    }
}

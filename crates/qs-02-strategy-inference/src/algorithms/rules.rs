//! Fidelity threshold table.

use crate::config::InferenceConfig;
use crate::domain::errors::InferenceError;
use shared_types::{
    ExecutionTarget, JobClass, JobId, Rationale, Strategy, StrategyDecision, ThresholdRule,
};

/// Apply the ordered rule table to a snapshot.
///
/// Thresholds are inclusive. A missing snapshot is `UnknownTarget`.
pub fn select_strategy(
    job_id: &JobId,
    snapshot: Option<&ExecutionTarget>,
    job_class: JobClass,
    config: &InferenceConfig,
) -> Result<StrategyDecision, InferenceError> {
    let target = snapshot.ok_or_else(|| InferenceError::UnknownTarget {
        job_id: job_id.clone(),
    })?;
    let fidelity = target.gate_fidelity;

    let (strategy, rule, threshold) = if fidelity >= config.fidelity_deep {
        (Strategy::Deep, ThresholdRule::FidelityDeep, Some(config.fidelity_deep))
    } else if fidelity >= config.fidelity_medium {
        (
            Strategy::Medium,
            ThresholdRule::FidelityMedium,
            Some(config.fidelity_medium),
        )
    } else {
        (Strategy::Shallow, ThresholdRule::Fallback, None)
    };

    Ok(StrategyDecision {
        job_id: job_id.clone(),
        target_id: target.id.clone(),
        job_class,
        strategy,
        depth: config.depths.depth(strategy),
        rationale: Rationale {
            rule,
            observed_fidelity: fidelity,
            threshold,
        },
        target_revision: target.revision,
    })
}

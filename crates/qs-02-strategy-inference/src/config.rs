//! Configuration for Strategy Inference

use crate::domain::errors::InferenceError;
use serde::{Deserialize, Serialize};
use shared_types::Strategy;

/// Algorithmic depth (layers) per strategy tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDepths {
    pub shallow: u32,
    pub medium: u32,
    pub deep: u32,
}

impl TierDepths {
    pub fn depth(&self, strategy: Strategy) -> u32 {
        match strategy {
            Strategy::Shallow => self.shallow,
            Strategy::Medium => self.medium,
            Strategy::Deep => self.deep,
        }
    }
}

impl Default for TierDepths {
    fn default() -> Self {
        Self {
            shallow: 1,
            medium: 2,
            deep: 4,
        }
    }
}

/// Inference configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Minimum fidelity (inclusive) for DEEP
    pub fidelity_deep: f64,
    /// Minimum fidelity (inclusive) for MEDIUM
    pub fidelity_medium: f64,
    /// Depth per tier
    #[serde(default)]
    pub depths: TierDepths,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            fidelity_deep: 0.99,
            fidelity_medium: 0.95,
            depths: TierDepths::default(),
        }
    }
}

impl InferenceConfig {
    /// Both thresholds inside `[0, 1]` and ordered.
    pub fn validate(&self) -> Result<(), InferenceError> {
        for (name, value) in [
            ("fidelity_deep", self.fidelity_deep),
            ("fidelity_medium", self.fidelity_medium),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(InferenceError::InvalidThresholds(format!(
                    "{name} = {value} is outside [0, 1]"
                )));
            }
        }
        if self.fidelity_deep < self.fidelity_medium {
            return Err(InferenceError::InvalidThresholds(format!(
                "fidelity_deep ({}) < fidelity_medium ({})",
                self.fidelity_deep, self.fidelity_medium
            )));
        }
        Ok(())
    }
}

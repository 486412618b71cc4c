//! Configuration for the Coherence Verifier

use crate::domain::errors::VerificationError;
use serde::{Deserialize, Serialize};

/// Verifier configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Fraction of T1 a job may use
    pub margin_factor: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self { margin_factor: 0.5 }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<(), VerificationError> {
        if !self.margin_factor.is_finite() || self.margin_factor <= 0.0 {
            return Err(VerificationError::InvalidMetrics(format!(
                "margin_factor must be finite and > 0, got {}",
                self.margin_factor
            )));
        }
        Ok(())
    }
}

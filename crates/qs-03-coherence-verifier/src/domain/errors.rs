//! Error types for the Coherence Verifier

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerificationError {
    /// Inputs that make the margin meaningless (zero or non-finite T1,
    /// negative or non-finite duration, bad margin factor)
    #[error("Invalid verification input: {0}")]
    InvalidMetrics(String),
}

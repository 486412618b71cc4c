//! Error types for the Capability Store

use shared_types::TargetId;
use thiserror::Error;

/// Errors from applying capability updates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapabilityError {
    /// Metrics violate the execution target invariant
    #[error("Invalid metrics for target {target_id}: {reason}")]
    InvalidMetrics { target_id: TargetId, reason: String },

    /// A new target would exceed the configured bound
    #[error("Capability store full: {max} targets")]
    StoreFull { max: usize },
}

/// Errors from loading the hardware knowledge base
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("Failed to read knowledge base: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse knowledge base: {0}")]
    Parse(#[from] serde_json::Error),
}

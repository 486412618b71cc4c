//! Error types for Strategy Inference

use shared_types::JobId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// No capability snapshot exists for the job's target
    #[error("Unknown target for job {job_id}")]
    UnknownTarget { job_id: JobId },

    /// Thresholds out of range or inverted
    #[error("Invalid inference thresholds: {0}")]
    InvalidThresholds(String),
}

//! Coherence margin.

use crate::domain::errors::VerificationError;
use shared_types::AdmissionOutcome;

/// `estimated_duration / coherence_time`, after checking both inputs.
pub fn compute_margin(estimated_duration: f64, coherence_time: f64) -> Result<f64, VerificationError> {
    if !coherence_time.is_finite() || coherence_time <= 0.0 {
        return Err(VerificationError::InvalidMetrics(format!(
            "coherence_time must be finite and > 0, got {coherence_time}"
        )));
    }
    if !estimated_duration.is_finite() || estimated_duration < 0.0 {
        return Err(VerificationError::InvalidMetrics(format!(
            "estimated_duration must be finite and >= 0, got {estimated_duration}"
        )));
    }
    Ok(estimated_duration / coherence_time)
}

/// Outcome and margin for one job.
///
/// Compares `estimated_duration < margin_factor * coherence_time` directly
/// rather than through the rounded margin.
pub fn evaluate(
    estimated_duration: f64,
    coherence_time: f64,
    margin_factor: f64,
) -> Result<(AdmissionOutcome, f64), VerificationError> {
    if !margin_factor.is_finite() || margin_factor <= 0.0 {
        return Err(VerificationError::InvalidMetrics(format!(
            "margin_factor must be finite and > 0, got {margin_factor}"
        )));
    }
    let margin = compute_margin(estimated_duration, coherence_time)?;
    let outcome = if estimated_duration < margin_factor * coherence_time {
        AdmissionOutcome::Approve
    } else {
        AdmissionOutcome::Reject
    };
    Ok((outcome, margin))
}

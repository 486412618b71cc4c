//! Simulated telemetry and job traffic, so the runtime runs without hardware.

pub mod drift;
pub mod jobs;

pub use drift::{CalibrationDrift, TargetProfile};
pub use jobs::JobGenerator;

//! Per-qubit calibration reports.
//!
//! Calibration scanners publish one report per backend:
//!
//! ```json
//! {"backend": "ibm-a", "last_update": "2025-12-07T00:00:00Z",
//!  "qubits": [{"id": 0, "t1": 120.5, "t2": 98.1, "readout_error": 0.02, "operational": true}]}
//! ```
//!
//! T1 values are microseconds. A report is reduced to one capability update:
//! the median T1 of the operational qubits becomes the target's coherence time.

use crate::domain::errors::CapabilityError;
use serde::{Deserialize, Serialize};
use shared_types::{CapabilityMetrics, CapabilityUpdate, TargetId, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QubitCalibration {
    pub id: u32,
    /// Microseconds.
    pub t1: f64,
    #[serde(default)]
    pub t2: Option<f64>,
    #[serde(default)]
    pub readout_error: f64,
    #[serde(default = "operational_default")]
    pub operational: bool,
}

fn operational_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub backend: String,
    #[serde(default)]
    pub last_update: Option<String>,
    pub qubits: Vec<QubitCalibration>,
    #[serde(default)]
    pub queue_depth: u32,
}

impl CalibrationReport {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Median T1 of operational qubits with a usable value, in microseconds.
    pub fn median_t1_micros(&self) -> Option<f64> {
        let mut t1s: Vec<f64> = self
            .qubits
            .iter()
            .filter(|q| q.operational && q.t1.is_finite() && q.t1 > 0.0)
            .map(|q| q.t1)
            .collect();
        if t1s.is_empty() {
            return None;
        }
        t1s.sort_by(f64::total_cmp);

        let mid = t1s.len() / 2;
        Some(if t1s.len() % 2 == 0 {
            (t1s[mid - 1] + t1s[mid]) / 2.0
        } else {
            t1s[mid]
        })
    }

    /// Summarise the report into an update for `target_id`.
    ///
    /// `gate_error` is the device-level error per layered gate; fidelity is
    /// `1 - gate_error`.
    pub fn to_update(
        &self,
        target_id: impl Into<TargetId>,
        gate_error: f64,
        timestamp: Timestamp,
    ) -> Result<CapabilityUpdate, CapabilityError> {
        let target_id = target_id.into();
        let t1 = self
            .median_t1_micros()
            .ok_or_else(|| CapabilityError::InvalidMetrics {
                target_id: target_id.clone(),
                reason: "no operational qubits".to_string(),
            })?;

        let metrics =
            CapabilityMetrics::new(t1 * 1e-6, 1.0 - gate_error).with_queue_depth(self.queue_depth);
        metrics
            .validate()
            .map_err(|e| CapabilityError::InvalidMetrics {
                target_id: target_id.clone(),
                reason: e.to_string(),
            })?;

        Ok(CapabilityUpdate {
            target_id,
            metrics,
            timestamp,
        })
    }
}

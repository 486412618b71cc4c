//! Calibration drift.
//!
//! Each step produces a per-qubit calibration report for every target. T1
//! follows a bounded random walk around the target's nominal value and
//! qubits occasionally drop out. Reports go through
//! `CalibrationReport::to_update` exactly like real scanner output.

use qs_01_capability_store::{CalibrationReport, FeedSender, QubitCalibration};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{now_millis, CapabilityUpdate, TargetId};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Nominal device characteristics of a simulated target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetProfile {
    pub target_id: TargetId,
    /// Microseconds.
    pub nominal_t1: f64,
    pub gate_error: f64,
    pub qubits: u32,
}

impl TargetProfile {
    pub fn new(target_id: impl Into<TargetId>, nominal_t1: f64, gate_error: f64) -> Self {
        Self {
            target_id: target_id.into(),
            nominal_t1,
            gate_error,
            qubits: 7,
        }
    }

    /// Targets used when no knowledge base is configured.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("ibm-a", 100.0, 0.03),
            Self::new("ibm-b", 150.0, 0.008),
            Self::new("ibm-c", 60.0, 0.045),
        ]
    }
}

const MIN_SCALE: f64 = 0.3;
const MAX_SCALE: f64 = 1.5;
const DROPOUT: f64 = 0.05;

pub struct CalibrationDrift {
    targets: Vec<(TargetProfile, f64)>,
    rng: StdRng,
}

impl CalibrationDrift {
    pub fn new(profiles: Vec<TargetProfile>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            targets: profiles.into_iter().map(|p| (p, 1.0)).collect(),
            rng,
        }
    }

    pub fn profiles(&self) -> impl Iterator<Item = &TargetProfile> {
        self.targets.iter().map(|(p, _)| p)
    }

    /// Advance every target by one step.
    pub fn step(&mut self) -> Vec<CalibrationReport> {
        let rng = &mut self.rng;
        self.targets
            .iter_mut()
            .map(|(profile, scale)| {
                *scale = (*scale + rng.gen_range(-0.1..=0.1)).clamp(MIN_SCALE, MAX_SCALE);
                let t1 = profile.nominal_t1 * *scale;
                let qubits = (0..profile.qubits)
                    .map(|id| QubitCalibration {
                        id,
                        t1: t1 * rng.gen_range(0.85..=1.15),
                        t2: Some(t1 * rng.gen_range(0.5..=0.9)),
                        readout_error: rng.gen_range(0.005..=0.04),
                        operational: !rng.gen_bool(DROPOUT),
                    })
                    .collect();
                CalibrationReport {
                    backend: profile.target_id.to_string(),
                    last_update: None,
                    qubits,
                    queue_depth: rng.gen_range(0..20),
                }
            })
            .collect()
    }

    /// One step reduced to capability updates. Reports without a usable
    /// qubit are skipped.
    pub fn next_updates(&mut self) -> Vec<CapabilityUpdate> {
        let now = now_millis();
        let gate_errors: Vec<f64> = self.profiles().map(|p| p.gate_error).collect();
        self.step()
            .into_iter()
            .zip(gate_errors)
            .filter_map(|(report, gate_error)| {
                match report.to_update(report.backend.clone(), gate_error, now) {
                    Ok(update) => Some(update),
                    Err(e) => {
                        warn!(backend = %report.backend, error = %e, "Calibration report skipped");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Push drifted calibrations into the feed until shutdown or until the
/// feed is closed.
pub async fn run_drift(
    mut drift: CalibrationDrift,
    sender: FeedSender,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for update in drift.next_updates() {
                    debug!(
                        target_id = %update.target_id,
                        t1_us = update.metrics.coherence_time * 1e6,
                        fidelity = update.metrics.gate_fidelity,
                        "Calibration drift"
                    );
                    if sender.send(update).await.is_err() {
                        return;
                    }
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}

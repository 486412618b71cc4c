//! Per-target adapter health gate.
//!
//! Repeated adapter failures or timeouts on a target open its circuit.
//! While open, jobs the verifier approved are rejected before dispatch
//! instead of being handed to a backend that keeps failing.
//!
//! ```text
//!      ┌──────────┐ failures ┌──────────┐ open_timeout ┌───────────┐
//!      │  CLOSED  │ ───────► │   OPEN   │ ───────────► │ HALF-OPEN │
//!      └──────────┘          └──────────┘              └───────────┘
//!            ▲                     ▲        failure          │
//!            │                     └─────────────────────────┤
//!            └───────────────────────────────────────────────┘
//!                               successes
//! ```

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use shared_types::TargetId;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Jobs are dispatched normally
    Closed,
    /// Jobs are rejected without reaching the adapter
    Open,
    /// One probe dispatch at a time tests whether the target recovered
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Successful probes in half-open needed to close it again. Probes run
    /// one after another.
    pub success_threshold: u32,
    /// Time spent open before probing
    pub open_timeout: Duration,
    pub enabled: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            open_timeout: Duration::from_secs(30),
            enabled: true,
        }
    }
}

struct TargetCircuit {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    probe_in_flight: bool,
    opened_at: Option<Instant>,
    total_dispatches: u64,
    total_failures: u64,
}

impl TargetCircuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            half_open_successes: 0,
            probe_in_flight: false,
            opened_at: None,
            total_dispatches: 0,
            total_failures: 0,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
        self.half_open_successes = 0;
        self.probe_in_flight = false;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.half_open_successes = 0;
        self.probe_in_flight = false;
        self.opened_at = None;
    }
}

/// Circuit breakers for all targets.
pub struct CircuitBreakerManager {
    circuits: RwLock<HashMap<TargetId, TargetCircuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether a job may be dispatched to `target_id` now.
    ///
    /// An open circuit whose timeout elapsed moves to half-open and lets the
    /// job through as a probe. While half-open, further jobs are refused
    /// until the probe's result is recorded.
    pub fn should_allow(&self, target_id: &TargetId) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut circuits = self.circuits.write();
        let circuit = circuits
            .entry(target_id.clone())
            .or_insert_with(TargetCircuit::new);

        let allowed = match (circuit.state, circuit.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                let elapsed = opened_at.elapsed();
                if elapsed >= self.config.open_timeout {
                    info!(target_id = %target_id, "Adapter circuit half-open, probing");
                    circuit.state = CircuitState::HalfOpen;
                    circuit.half_open_successes = 0;
                    circuit.probe_in_flight = true;
                    true
                } else {
                    debug!(
                        target_id = %target_id,
                        remaining_ms = self.config.open_timeout.saturating_sub(elapsed).as_millis() as u64,
                        "Adapter circuit open"
                    );
                    false
                }
            }
            (CircuitState::HalfOpen, _) => {
                if circuit.probe_in_flight {
                    debug!(target_id = %target_id, "Adapter circuit half-open, probe in flight");
                    false
                } else {
                    circuit.probe_in_flight = true;
                    true
                }
            }
            _ => true,
        };
        if allowed {
            circuit.total_dispatches += 1;
        }
        allowed
    }

    pub fn record_success(&self, target_id: &TargetId) {
        if !self.config.enabled {
            return;
        }

        let mut circuits = self.circuits.write();
        let Some(circuit) = circuits.get_mut(target_id) else {
            return;
        };
        match circuit.state {
            CircuitState::Closed => circuit.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                circuit.probe_in_flight = false;
                circuit.half_open_successes += 1;
                if circuit.half_open_successes >= self.config.success_threshold {
                    info!(
                        target_id = %target_id,
                        probes = circuit.half_open_successes,
                        "Adapter circuit closed"
                    );
                    circuit.close();
                }
            }
            // A dispatch admitted before the circuit opened finished late.
            CircuitState::Open => {}
        }
    }

    /// Adapter failures and timeouts both count.
    pub fn record_failure(&self, target_id: &TargetId) {
        if !self.config.enabled {
            return;
        }

        let mut circuits = self.circuits.write();
        let circuit = circuits
            .entry(target_id.clone())
            .or_insert_with(TargetCircuit::new);
        circuit.total_failures += 1;

        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures += 1;
                if circuit.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        target_id = %target_id,
                        failures = circuit.consecutive_failures,
                        open_secs = self.config.open_timeout.as_secs(),
                        "Adapter circuit opened"
                    );
                    circuit.open();
                }
            }
            CircuitState::HalfOpen => {
                warn!(target_id = %target_id, "Adapter circuit reopened after failed probe");
                circuit.open();
            }
            CircuitState::Open => circuit.opened_at = Some(Instant::now()),
        }
    }

    pub fn state(&self, target_id: &TargetId) -> CircuitState {
        self.circuits
            .read()
            .get(target_id)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Number of targets whose circuit is currently open.
    pub fn open_count(&self) -> usize {
        self.circuits
            .read()
            .values()
            .filter(|c| c.state == CircuitState::Open)
            .count()
    }

    pub fn stats(&self) -> Vec<CircuitStats> {
        let mut stats: Vec<_> = self
            .circuits
            .read()
            .iter()
            .map(|(target_id, c)| CircuitStats {
                target_id: target_id.clone(),
                state: c.state,
                consecutive_failures: c.consecutive_failures,
                total_dispatches: c.total_dispatches,
                total_failures: c.total_failures,
            })
            .collect();
        stats.sort_by(|a, b| a.target_id.cmp(&b.target_id));
        stats
    }

    /// Force a target's circuit closed.
    pub fn reset(&self, target_id: &TargetId) {
        if let Some(circuit) = self.circuits.write().get_mut(target_id) {
            info!(target_id = %target_id, "Adapter circuit manually reset");
            circuit.close();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitStats {
    pub target_id: TargetId,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_dispatches: u64,
    pub total_failures: u64,
}

//! Configuration for the Dispatch Orchestrator

use crate::adapters::circuit_breaker::CircuitBreakerConfig;
use std::time::Duration;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Deadline for one adapter call, measured from DISPATCHED
    pub dispatch_timeout: Duration,
    /// Per-target adapter health gate
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(30),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

//! # Runtime Configuration
//!
//! Unified configuration for the pipeline subsystems and the simulation.
//! Every value has a default and can be overridden through `QS_*`
//! environment variables.

use qs_02_strategy_inference::InferenceConfig;
use qs_03_coherence_verifier::VerifierConfig;
use qs_04_dispatch_orchestrator::{DigitalTwinConfig, OrchestratorConfig};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub inference: InferenceConfig,
    pub verifier: VerifierConfig,
    pub orchestrator: OrchestratorConfig,
    /// JSON knowledge graph used to seed targets at startup.
    pub knowledge_base: Option<PathBuf>,
    /// JSON-lines file receiving completed dispatch records.
    pub record_log: Option<PathBuf>,
    pub twin: DigitalTwinConfig,
    pub simulation: SimulationConfig,
    /// Admin endpoint (`/health`, `/metrics`, `/targets`, `/circuits`).
    pub admin_addr: SocketAddr,
}

/// Simulated telemetry and job traffic.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub drift_interval: Duration,
    pub job_interval: Duration,
    /// Stop generating jobs after this many; `None` runs until shutdown.
    pub max_jobs: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            drift_interval: Duration::from_secs(5),
            job_interval: Duration::from_millis(500),
            max_jobs: None,
            seed: None,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            verifier: VerifierConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            knowledge_base: None,
            record_log: None,
            twin: DigitalTwinConfig::default(),
            simulation: SimulationConfig::default(),
            admin_addr: SocketAddr::from(([127, 0, 0, 1], 9100)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    Parse { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl RuntimeConfig {
    /// Configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `QS_FIDELITY_DEEP` / `QS_FIDELITY_MEDIUM`: strategy thresholds
    /// - `QS_MARGIN_FACTOR`: coherence safety factor
    /// - `QS_DISPATCH_TIMEOUT_MS`: adapter deadline
    /// - `QS_KNOWLEDGE_BASE`: knowledge graph path
    /// - `QS_RECORD_LOG`: JSON-lines record log path
    /// - `QS_FAILURE_RATE`: digital twin failure probability
    /// - `QS_DRIFT_INTERVAL_MS` / `QS_JOB_INTERVAL_MS` / `QS_MAX_JOBS` / `QS_SEED`
    /// - `QS_METRICS_PORT`: admin endpoint port (shared with telemetry)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("QS_FIDELITY_DEEP") {
            config.inference.fidelity_deep = parse("QS_FIDELITY_DEEP", &v)?;
        }
        if let Some(v) = get("QS_FIDELITY_MEDIUM") {
            config.inference.fidelity_medium = parse("QS_FIDELITY_MEDIUM", &v)?;
        }
        if let Some(v) = get("QS_MARGIN_FACTOR") {
            config.verifier.margin_factor = parse("QS_MARGIN_FACTOR", &v)?;
        }
        if let Some(v) = get("QS_DISPATCH_TIMEOUT_MS") {
            config.orchestrator.dispatch_timeout =
                Duration::from_millis(parse("QS_DISPATCH_TIMEOUT_MS", &v)?);
        }
        config.knowledge_base = get("QS_KNOWLEDGE_BASE").map(PathBuf::from);
        config.record_log = get("QS_RECORD_LOG").map(PathBuf::from);
        if let Some(v) = get("QS_FAILURE_RATE") {
            config.twin.failure_rate = parse("QS_FAILURE_RATE", &v)?;
        }
        if let Some(v) = get("QS_DRIFT_INTERVAL_MS") {
            config.simulation.drift_interval =
                Duration::from_millis(parse("QS_DRIFT_INTERVAL_MS", &v)?);
        }
        if let Some(v) = get("QS_JOB_INTERVAL_MS") {
            config.simulation.job_interval = Duration::from_millis(parse("QS_JOB_INTERVAL_MS", &v)?);
        }
        if let Some(v) = get("QS_MAX_JOBS") {
            config.simulation.max_jobs = Some(parse("QS_MAX_JOBS", &v)?);
        }
        if let Some(v) = get("QS_SEED") {
            let seed = parse("QS_SEED", &v)?;
            config.simulation.seed = Some(seed);
            config.twin.seed = Some(seed);
        }
        if let Some(v) = get("QS_METRICS_PORT") {
            config.admin_addr.set_port(parse("QS_METRICS_PORT", &v)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.inference
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.verifier
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !(0.0..=1.0).contains(&self.twin.failure_rate) {
            return Err(ConfigError::Invalid(format!(
                "failure rate {} outside [0, 1]",
                self.twin.failure_rate
            )));
        }
        if self.orchestrator.dispatch_timeout.is_zero() {
            return Err(ConfigError::Invalid("dispatch timeout must be > 0".into()));
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        var,
        value: value.to_string(),
    })
}

//! Simulated execution backend.
//!
//! Stands in for real hardware: every call sleeps for a random latency and
//! fails with a configurable probability.

use crate::ports::outbound::ExecutionAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{AdapterError, Payload, PayloadResult, Strategy, TargetId, Timestamp};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DigitalTwinConfig {
    pub min_latency: Duration,
    pub max_latency: Duration,
    /// Probability in [0, 1] that a call fails.
    pub failure_rate: f64,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for DigitalTwinConfig {
    fn default() -> Self {
        Self {
            min_latency: Duration::from_millis(5),
            max_latency: Duration::from_millis(50),
            failure_rate: 0.0,
            seed: None,
        }
    }
}

pub struct DigitalTwinAdapter {
    config: DigitalTwinConfig,
    rng: Mutex<StdRng>,
}

impl DigitalTwinAdapter {
    pub fn new(config: DigitalTwinConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &DigitalTwinConfig {
        &self.config
    }

    /// Latency and failure for the next call.
    fn draw(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock();
        let latency = if self.config.max_latency > self.config.min_latency {
            rng.gen_range(self.config.min_latency..=self.config.max_latency)
        } else {
            self.config.min_latency
        };
        let fails = rng.gen_bool(self.config.failure_rate.clamp(0.0, 1.0));
        (latency, fails)
    }
}

impl Default for DigitalTwinAdapter {
    fn default() -> Self {
        Self::new(DigitalTwinConfig::default())
    }
}

#[async_trait]
impl ExecutionAdapter for DigitalTwinAdapter {
    async fn execute(
        &self,
        target_id: &TargetId,
        strategy: Strategy,
        payload: Payload,
        _deadline: Timestamp,
    ) -> Result<PayloadResult, AdapterError> {
        let (latency, fails) = self.draw();
        tokio::time::sleep(latency).await;

        debug!(
            target_id = %target_id,
            strategy = %strategy,
            latency_ms = latency.as_millis() as u64,
            fails,
            "Digital twin executed payload"
        );

        if fails {
            return Err(AdapterError::Backend(format!(
                "simulated decoherence on {target_id}"
            )));
        }

        let result = serde_json::json!({
            "target": target_id.as_str(),
            "strategy": strategy.as_str(),
            "payload_bytes": payload.len(),
            "latency_ms": latency.as_millis() as u64,
        });
        Ok(PayloadResult::new(result.to_string().into_bytes()))
    }
}

//! Synthetic job traffic.

use qs_03_coherence_verifier::DurationModel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{JobClass, JobId, JobRequest, TargetId};

/// Layers per generated job. At the default 50 ns per layer this spans
/// 5 µs to 100 µs, enough to hit both verdicts on typical targets.
const MIN_LAYERS: u32 = 100;
const MAX_LAYERS: u32 = 2000;

pub struct JobGenerator {
    targets: Vec<TargetId>,
    model: DurationModel,
    rng: StdRng,
    issued: u64,
}

impl JobGenerator {
    pub fn new(targets: Vec<TargetId>, model: DurationModel, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            targets,
            model,
            rng,
            issued: 0,
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Next job, or `None` when there is no target to send it to.
    pub fn next_job(&mut self) -> Option<JobRequest> {
        if self.targets.is_empty() {
            return None;
        }
        let target = self.targets[self.rng.gen_range(0..self.targets.len())].clone();
        let layers = self.rng.gen_range(MIN_LAYERS..=MAX_LAYERS);
        let class = if self.rng.gen_bool(0.5) {
            JobClass::Pricing
        } else {
            JobClass::HedgeOptimization
        };
        self.issued += 1;

        let payload = serde_json::json!({ "class": class.as_str(), "layers": layers });
        Some(
            JobRequest::new(
                JobId::generate(),
                target,
                self.model.estimate(layers),
                class,
            )
            .with_payload(payload.to_string().into_bytes()),
        )
    }
}

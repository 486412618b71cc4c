//! Shared wiring for the integration tests and benchmarks.
//!
//! [`Pipeline`] assembles the four subsystems the way the runtime does, with
//! an in-memory record log and an [`EchoAdapter`] standing in for hardware.

use async_trait::async_trait;
use parking_lot::Mutex;
use qs_01_capability_store::CapabilityStore;
use qs_02_strategy_inference::StrategyEngine;
use qs_03_coherence_verifier::CoherenceVerifier;
use qs_04_dispatch_orchestrator::{
    DispatchDependencies, DispatchOrchestrator, ExecutionAdapter, InMemoryRecordLog,
    OrchestratorConfig,
};
use shared_bus::InMemoryEventBus;
use shared_types::{
    AdapterError, CapabilityMetrics, CapabilityUpdate, JobClass, JobRequest, Payload,
    PayloadResult, Strategy, TargetId, Timestamp,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Adapter that returns the payload it was given.
///
/// Targets marked with [`EchoAdapter::fail_target`] answer with
/// `AdapterError::Unavailable` instead.
#[derive(Default)]
pub struct EchoAdapter {
    delay: Duration,
    failing: Mutex<HashSet<TargetId>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(TargetId, Strategy)>>,
}

impl EchoAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail_target(&self, target_id: impl Into<TargetId>) {
        self.failing.lock().insert(target_id.into());
    }

    pub fn heal_target(&self, target_id: &TargetId) {
        self.failing.lock().remove(target_id);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Target and strategy of every call, in call order.
    pub fn seen(&self) -> Vec<(TargetId, Strategy)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ExecutionAdapter for EchoAdapter {
    async fn execute(
        &self,
        target_id: &TargetId,
        strategy: Strategy,
        payload: Payload,
        _deadline: Timestamp,
    ) -> Result<PayloadResult, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push((target_id.clone(), strategy));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.lock().contains(target_id) {
            return Err(AdapterError::Unavailable(format!("{target_id} offline")));
        }
        Ok(PayloadResult::new(payload.as_bytes().to_vec()))
    }
}

/// The four subsystems wired together over one bus.
pub struct Pipeline {
    pub orchestrator: Arc<DispatchOrchestrator>,
    pub store: Arc<CapabilityStore>,
    pub adapter: Arc<EchoAdapter>,
    pub sink: Arc<InMemoryRecordLog>,
    pub bus: Arc<InMemoryEventBus>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with(EchoAdapter::new(), OrchestratorConfig::default())
    }

    pub fn with(adapter: EchoAdapter, config: OrchestratorConfig) -> Self {
        let store = Arc::new(CapabilityStore::new());
        let adapter = Arc::new(adapter);
        let sink = Arc::new(InMemoryRecordLog::new());
        let bus = Arc::new(InMemoryEventBus::new());

        let orchestrator = DispatchOrchestrator::new(DispatchDependencies {
            store: store.clone(),
            engine: Arc::new(StrategyEngine::new()),
            verifier: Arc::new(CoherenceVerifier::new()),
            adapter: adapter.clone(),
            sink: sink.clone(),
            publisher: bus.clone(),
            config,
        });

        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            adapter,
            sink,
            bus,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference target: T1 = 100 µs, F = 0.97.
pub fn ibm_a(timestamp: Timestamp) -> CapabilityUpdate {
    target_update("ibm-a", 100e-6, 0.97, timestamp)
}

pub fn target_update(
    target_id: &str,
    coherence_time: f64,
    gate_fidelity: f64,
    timestamp: Timestamp,
) -> CapabilityUpdate {
    CapabilityUpdate::new(
        target_id,
        CapabilityMetrics::new(coherence_time, gate_fidelity),
        timestamp,
    )
}

/// A pricing job whose payload is its own id.
pub fn job(id: &str, target_id: &str, duration_micros: f64) -> JobRequest {
    JobRequest::new(id, target_id, duration_micros * 1e-6, JobClass::Pricing)
        .with_payload(id.as_bytes().to_vec())
}

//! The dispatch orchestrator service.

use crate::adapters::circuit_breaker::{CircuitBreakerManager, CircuitState, CircuitStats};
use crate::application::lane::{run_lane, LaneMessage};
use crate::config::OrchestratorConfig;
use crate::domain::errors::{CancelError, DispatchError};
use crate::domain::outcome::JobTicket;
use crate::domain::registry::{JobRegistry, StateTransition};
use crate::ports::inbound::DispatchApi;
use crate::ports::outbound::{ExecutionAdapter, RecordSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use qs_01_capability_store::CapabilityStoreApi;
use qs_02_strategy_inference::StrategyInferenceApi;
use qs_03_coherence_verifier::CoherenceVerifierApi;
use shared_bus::{DispatchEvent, EventPublisher};
use shared_types::{
    now_millis, CapabilityUpdate, DispatchRecord, ExecutionTarget, JobId, JobRequest, JobState,
    RejectReason, TargetId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Dependencies for `DispatchOrchestrator`
pub struct DispatchDependencies {
    pub store: Arc<dyn CapabilityStoreApi>,
    pub engine: Arc<dyn StrategyInferenceApi>,
    pub verifier: Arc<dyn CoherenceVerifierApi>,
    pub adapter: Arc<dyn ExecutionAdapter>,
    pub sink: Arc<dyn RecordSink>,
    pub publisher: Arc<dyn EventPublisher>,
    pub config: OrchestratorConfig,
}

/// State shared by the service, its lanes and its dispatch tasks.
pub(crate) struct Core {
    pub store: Arc<dyn CapabilityStoreApi>,
    pub engine: Arc<dyn StrategyInferenceApi>,
    pub verifier: Arc<dyn CoherenceVerifierApi>,
    pub adapter: Arc<dyn ExecutionAdapter>,
    pub sink: Arc<dyn RecordSink>,
    pub publisher: Arc<dyn EventPublisher>,
    pub breakers: CircuitBreakerManager,
    pub registry: JobRegistry,
    pub config: OrchestratorConfig,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Core {
    pub fn publish_state(
        &self,
        job_id: &JobId,
        target_id: &TargetId,
        state: JobState,
        reason: Option<String>,
        margin: Option<f64>,
    ) {
        self.publisher.publish(DispatchEvent::JobStateChanged {
            job_id: job_id.clone(),
            target_id: target_id.clone(),
            state,
            reason,
            margin,
            timestamp: now_millis(),
        });
    }

    /// Breaker admission check; publishes a state change if it caused one.
    pub fn circuit_allows(&self, target_id: &TargetId) -> bool {
        let before = self.breakers.state(target_id);
        let allowed = self.breakers.should_allow(target_id);
        self.note_circuit_change(target_id, before);
        allowed
    }

    pub fn record_adapter_health(&self, target_id: &TargetId, healthy: bool) {
        let before = self.breakers.state(target_id);
        if healthy {
            self.breakers.record_success(target_id);
        } else {
            self.breakers.record_failure(target_id);
        }
        self.note_circuit_change(target_id, before);
    }

    fn note_circuit_change(&self, target_id: &TargetId, before: CircuitState) {
        let after = self.breakers.state(target_id);
        if after != before {
            self.publisher.publish(DispatchEvent::CircuitStateChanged {
                target_id: target_id.clone(),
                state: after.to_string(),
            });
        }
    }

    /// Count a spawned dispatch until the guard drops.
    pub fn track_dispatch(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            core: Arc::clone(self),
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

pub(crate) struct InFlightGuard {
    core: Arc<Core>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.core.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.core.idle.notify_waiters();
        }
    }
}

/// Admits jobs against live capability telemetry and dispatches them.
///
/// Every target gets its own lane: one task draining a FIFO queue that
/// carries both the target's capability updates and its jobs. An update
/// routed before a job is therefore always applied before that job decides,
/// while different targets proceed in parallel. Adapter calls run in their
/// own tasks and never hold up a lane.
pub struct DispatchOrchestrator {
    core: Arc<Core>,
    lanes: Mutex<HashMap<TargetId, mpsc::UnboundedSender<LaneMessage>>>,
    lane_handles: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl DispatchOrchestrator {
    pub fn new(deps: DispatchDependencies) -> Self {
        let breakers = CircuitBreakerManager::new(deps.config.circuit_breaker.clone());
        Self {
            core: Arc::new(Core {
                store: deps.store,
                engine: deps.engine,
                verifier: deps.verifier,
                adapter: deps.adapter,
                sink: deps.sink,
                publisher: deps.publisher,
                breakers,
                registry: JobRegistry::new(),
                config: deps.config,
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
            lanes: Mutex::new(HashMap::new()),
            lane_handles: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.core.config
    }

    /// Targets that have a lane, sorted.
    pub fn targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<_> = self.lanes.lock().keys().cloned().collect();
        targets.sort();
        targets
    }

    /// Dispatches currently waiting on an adapter.
    pub fn in_flight(&self) -> usize {
        self.core.in_flight.load(Ordering::SeqCst)
    }

    pub fn circuit_state(&self, target_id: &TargetId) -> CircuitState {
        self.core.breakers.state(target_id)
    }

    pub fn circuit_stats(&self) -> Vec<CircuitStats> {
        self.core.breakers.stats()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn reject_update(&self, update: &CapabilityUpdate, error: DispatchError) -> DispatchError {
        warn!(target_id = %update.target_id, error = %error, "Capability update refused");
        self.core.publisher.publish(DispatchEvent::CapabilityRejected {
            target_id: update.target_id.clone(),
            reason: error.to_string(),
        });
        error
    }

    /// Whether a lane may be opened for one more target.
    ///
    /// Lanes whose first update is still queued already hold a store slot,
    /// so they are counted alongside the targets the store knows. Called
    /// with the lane table locked.
    fn has_room_for_target(
        &self,
        lanes: &HashMap<TargetId, mpsc::UnboundedSender<LaneMessage>>,
    ) -> Result<(), DispatchError> {
        let store = &self.core.store;
        let pending = lanes
            .keys()
            .filter(|target_id| store.snapshot(target_id).is_none())
            .count();
        let max = store.max_targets();
        if store.len() + pending >= max {
            return Err(DispatchError::StoreFull { max });
        }
        Ok(())
    }

    fn spawn_lane(&self, target_id: &TargetId) -> mpsc::UnboundedSender<LaneMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_lane(Arc::clone(&self.core), target_id.clone(), rx));
        self.lane_handles.lock().push(handle);
        info!(target_id = %target_id, "Lane opened for new target");
        tx
    }
}

#[async_trait]
impl DispatchApi for DispatchOrchestrator {
    /// Must be called from within a Tokio runtime: the first update for a
    /// target spawns its lane.
    fn apply_update(&self, update: CapabilityUpdate) -> Result<(), DispatchError> {
        if let Err(e) = update.metrics.validate() {
            return Err(self.reject_update(&update, DispatchError::InvalidMetrics(e.to_string())));
        }

        let mut lanes = self.lanes.lock();
        if self.is_stopped() {
            return Err(DispatchError::Stopped);
        }
        let target_id = update.target_id.clone();
        let existing = lanes.get(&target_id).cloned();
        let lane = match existing {
            Some(lane) => lane,
            None => {
                if let Err(e) = self.has_room_for_target(&lanes) {
                    drop(lanes);
                    return Err(self.reject_update(&update, e));
                }
                let lane = self.spawn_lane(&target_id);
                lanes.insert(target_id.clone(), lane.clone());
                lane
            }
        };
        lane.send(LaneMessage::Update(update))
            .map_err(|_| DispatchError::Stopped)
    }

    fn submit(&self, job: JobRequest) -> Result<JobTicket, DispatchError> {
        if !job.estimated_duration.is_finite() || job.estimated_duration < 0.0 {
            return Err(DispatchError::InvalidMetrics(format!(
                "estimated duration {} must be finite and non-negative",
                job.estimated_duration
            )));
        }

        let lanes = self.lanes.lock();
        if self.is_stopped() {
            return Err(DispatchError::Stopped);
        }
        let Some(lane) = lanes.get(&job.target_id) else {
            debug!(job_id = %job.id, target_id = %job.target_id, "Job for unknown target refused");
            return Err(DispatchError::UnknownTarget(job.target_id.clone()));
        };

        let (tx, rx) = oneshot::channel();
        let now = now_millis();
        self.core
            .registry
            .register(job.id.clone(), job.target_id.clone(), tx, now)?;
        self.core
            .publish_state(&job.id, &job.target_id, JobState::Received, None, None);

        let job_id = job.id.clone();
        debug!(job_id = %job_id, target_id = %job.target_id, class = %job.job_class, "Job received");
        if lane.send(LaneMessage::Job(job)).is_err() {
            self.core.registry.remove(&job_id);
            return Err(DispatchError::Stopped);
        }
        Ok(JobTicket::new(job_id, rx))
    }

    fn cancel(&self, job_id: &JobId) -> Result<(), CancelError> {
        let target_id = self.core.registry.cancel(job_id, now_millis())?;
        info!(job_id = %job_id, target_id = %target_id, "Job cancelled before decision");
        self.core.publish_state(
            job_id,
            &target_id,
            JobState::Rejected,
            Some(RejectReason::Cancelled.to_string()),
            None,
        );
        Ok(())
    }

    fn snapshot(&self, target_id: &TargetId) -> Option<ExecutionTarget> {
        self.core.store.snapshot(target_id)
    }

    fn job_state(&self, job_id: &JobId) -> Option<JobState> {
        self.core.registry.state(job_id)
    }

    fn transitions(&self, job_id: &JobId) -> Option<Vec<StateTransition>> {
        self.core.registry.transitions(job_id)
    }

    fn records(&self) -> Vec<DispatchRecord> {
        self.core.sink.records()
    }

    async fn shutdown(&self) {
        let senders: Vec<_> = {
            let mut lanes = self.lanes.lock();
            if self.stopped.swap(true, Ordering::SeqCst) {
                debug!("Orchestrator already stopped");
            }
            lanes.drain().collect()
        };
        info!(lanes = senders.len(), "Orchestrator shutting down, draining lanes");
        drop(senders);

        let handles = std::mem::take(&mut *self.lane_handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Lane task ended abnormally");
            }
        }

        self.core.wait_idle().await;
        info!("Orchestrator stopped");
    }
}

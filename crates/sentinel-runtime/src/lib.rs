//! # Sentinel Runtime
//!
//! Wires the dispatch pipeline together and drives it.
//!
//! ## Modular Structure
//!
//! - `config` - `RuntimeConfig` from `QS_*` environment variables
//! - `simulation` - calibration drift and synthetic job traffic
//! - `wiring` - event bus consumers (metrics and audit log)
//! - `admin` - health, `/metrics`, and read-only pipeline views
//!
//! ## Startup Sequence
//!
//! 1. Build the subsystems from configuration
//! 2. Start the metrics bridge on the event bus
//! 3. Seed targets from the knowledge base, or the default profiles
//! 4. Start the drift feed, the feed pump and the job generator
//! 5. Serve the admin endpoint

pub mod admin;
pub mod config;
pub mod simulation;
pub mod wiring;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use quantum_telemetry::{log_job_event, metric_inc, subsystem_span, JOBS_SUBMITTED};
use qs_01_capability_store::{
    channel_feed, CapabilityFeed, CapabilityStore, KnowledgeBase, KnowledgeBaseError,
};
use qs_02_strategy_inference::{InferenceError, StrategyEngine};
use qs_03_coherence_verifier::{CoherenceVerifier, DurationModel, VerificationError};
use qs_04_dispatch_orchestrator::{
    DigitalTwinAdapter, DispatchApi, DispatchDependencies, DispatchOrchestrator, InMemoryRecordLog,
    JsonLinesRecordLog, RecordSink, RecordSinkError,
};
use shared_bus::{EventFilter, InMemoryEventBus};
use shared_types::{now_millis, TargetId};
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use crate::config::{ConfigError, RuntimeConfig};
use crate::simulation::drift::run_drift;
use crate::simulation::{CalibrationDrift, JobGenerator, TargetProfile};
use crate::wiring::MetricsBridge;

const SUBSYSTEM: &str = "sentinel-runtime";
const FEED_CAPACITY: usize = 256;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    KnowledgeBase(#[from] KnowledgeBaseError),

    #[error("Record log: {0}")]
    RecordLog(#[from] RecordSinkError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Verifier(#[from] VerificationError),

    #[error("Admin endpoint: {0}")]
    Admin(#[from] std::io::Error),
}

/// The running pipeline.
pub struct SentinelRuntime {
    config: RuntimeConfig,
    bus: Arc<InMemoryEventBus>,
    orchestrator: Arc<DispatchOrchestrator>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    jobs_done: Arc<Notify>,
}

impl SentinelRuntime {
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        let sink: Arc<dyn RecordSink> = match &config.record_log {
            Some(path) => {
                info!(path = %path.display(), "Appending dispatch records to file");
                Arc::new(JsonLinesRecordLog::open(path)?)
            }
            None => Arc::new(InMemoryRecordLog::new()),
        };
        let bus = Arc::new(InMemoryEventBus::new());

        let orchestrator = Arc::new(DispatchOrchestrator::new(DispatchDependencies {
            store: Arc::new(CapabilityStore::new()),
            engine: Arc::new(StrategyEngine::with_config(config.inference.clone())?),
            verifier: Arc::new(CoherenceVerifier::with_config(config.verifier.clone())?),
            adapter: Arc::new(DigitalTwinAdapter::new(config.twin.clone())),
            sink,
            publisher: bus.clone(),
            config: config.orchestrator.clone(),
        }));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            config,
            bus,
            orchestrator,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
            jobs_done: Arc::new(Notify::new()),
        })
    }

    pub fn orchestrator(&self) -> Arc<DispatchOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Route the knowledge base's hardware nodes into the orchestrator.
    ///
    /// Returns one drift profile per seeded target.
    pub fn seed_knowledge_base(&self, kb: &KnowledgeBase) -> Vec<TargetProfile> {
        let mut profiles = Vec::new();
        for update in kb.seed_updates(now_millis()) {
            let profile = TargetProfile::new(
                update.target_id.clone(),
                update.metrics.coherence_time * 1e6,
                1.0 - update.metrics.gate_fidelity,
            );
            match self.orchestrator.apply_update(update) {
                Ok(()) => profiles.push(profile),
                Err(e) => warn!(target_id = %profile.target_id, error = %e, "Knowledge base node not seeded"),
            }
        }
        info!(targets = profiles.len(), "Knowledge base seeded");
        profiles
    }

    /// Start every background task. Returns once they are spawned.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        info!("===========================================");
        info!("  Quantum-Sentinel Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let bridge = MetricsBridge::new();
        let events = self.bus.event_stream(EventFilter::all());
        let shutdown = self.shutdown_rx.clone();
        self.spawn(async move {
            bridge.run(events, shutdown).await;
        });

        let profiles = match &self.config.knowledge_base {
            Some(path) => {
                let kb = KnowledgeBase::load(path)?;
                self.seed_knowledge_base(&kb)
            }
            None => TargetProfile::defaults(),
        };

        let mut drift = CalibrationDrift::new(profiles, self.config.simulation.seed);
        // First calibration goes in before any job can be generated.
        for update in drift.next_updates() {
            if let Err(e) = self.orchestrator.apply_update(update) {
                warn!(error = %e, "Initial calibration refused");
            }
        }
        let targets: Vec<TargetId> = drift.profiles().map(|p| p.target_id.clone()).collect();

        self.start_feed(drift);
        self.start_jobs(targets);
        self.start_admin().await?;

        info!(
            targets = self.orchestrator.targets().len(),
            admin = %self.config.admin_addr,
            "Sentinel runtime started"
        );
        Ok(())
    }

    fn start_feed(&self, drift: CalibrationDrift) {
        let (sender, mut feed) = channel_feed(FEED_CAPACITY);
        self.spawn(run_drift(
            drift,
            sender,
            self.config.simulation.drift_interval,
            self.shutdown_rx.clone(),
        ));

        let orchestrator = self.orchestrator();
        self.spawn(
            async move {
                while let Some(update) = feed.next_update().await {
                    if let Err(e) = orchestrator.apply_update(update) {
                        warn!(error = %e, "Capability update not routed");
                    }
                }
            }
            .instrument(subsystem_span!("feed_pump", subsystem = SUBSYSTEM)),
        );
    }

    fn start_jobs(&self, targets: Vec<TargetId>) {
        let mut generator =
            JobGenerator::new(targets, DurationModel::default(), self.config.simulation.seed);
        let orchestrator = self.orchestrator();
        let interval = self.config.simulation.job_interval;
        let max_jobs = self.config.simulation.max_jobs;
        let jobs_done = Arc::clone(&self.jobs_done);
        let mut shutdown = self.shutdown_rx.clone();

        let task = async move {
            let mut ticker = tokio::time::interval(interval);
            let mut outcomes = Vec::new();
            loop {
                if max_jobs.is_some_and(|max| generator.issued() >= max) {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.changed() => return,
                }
                let Some(job) = generator.next_job() else {
                    warn!("No targets to generate jobs for");
                    break;
                };
                let class = job.job_class;
                let target_id = job.target_id.clone();
                match orchestrator.submit(job) {
                    Ok(ticket) => {
                        metric_inc!(JOBS_SUBMITTED, &[class.as_str()]);
                        outcomes.push(tokio::spawn(async move {
                            let job_id = ticket.job_id().clone();
                            if let Err(e) = ticket.outcome().await {
                                log_job_event!(warn, SUBSYSTEM, "Job outcome lost", job_id, target_id, error = %e);
                            }
                        }));
                    }
                    Err(e) => warn!(target_id = %target_id, error = %e, "Job refused at submission"),
                }
            }
            for outcome in outcomes {
                let _ = outcome.await;
            }
            info!(jobs = generator.issued(), "Job generator finished");
            jobs_done.notify_one();
        };
        self.spawn(task.instrument(subsystem_span!("job_generator", subsystem = SUBSYSTEM)));
    }

    async fn start_admin(&self) -> Result<(), RuntimeError> {
        let listener = tokio::net::TcpListener::bind(self.config.admin_addr).await?;
        let router = admin::router(self.orchestrator());
        let mut shutdown = self.shutdown_rx.clone();
        info!(addr = %self.config.admin_addr, "Starting admin endpoint");
        self.spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            });
            if let Err(e) = serve.await {
                error!(error = %e, "Admin endpoint failed");
            }
        });
        Ok(())
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.tasks.lock().push(tokio::spawn(task));
    }

    /// Resolves once the job generator has issued `max_jobs` jobs and all
    /// of them finished. Never resolves without a limit.
    pub async fn jobs_finished(&self) {
        self.jobs_done.notified().await;
    }

    /// Shutdown sequence: stop the producers, drain the orchestrator, then
    /// stop the consumers.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!(error = %e, "Failed to send shutdown signal");
        }

        self.orchestrator.shutdown().await;

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Background task ended abnormally"),
                Err(_) => warn!("Background task did not stop in time"),
            }
        }

        info!(records = self.orchestrator.records().len(), "Shutdown complete");
    }
}

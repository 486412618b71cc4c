//! Prometheus metrics for the dispatch pipeline.
//!
//! All metrics follow the naming convention: `qs_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., jobs_submitted_total)
//! - **Gauge**: Value that can go up or down (e.g., open_circuits)
//! - **Histogram**: Distribution of values (e.g., admission_margin_ratio)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, linear_buckets, Counter, CounterVec, Encoder, Gauge, Histogram,
    HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CAPABILITY STORE METRICS (Subsystem 1)
    // =========================================================================

    /// Capability updates applied
    pub static ref CAPABILITY_UPDATES: Counter = Counter::new(
        "qs_capability_updates_total",
        "Total number of capability updates applied to the store"
    ).expect("metric creation failed");

    /// Capability updates refused
    pub static ref CAPABILITY_REJECTED: Counter = Counter::new(
        "qs_capability_rejected_total",
        "Capability updates refused (invalid metrics, store full)"
    ).expect("metric creation failed");

    /// Updates older than the entry they replaced
    pub static ref TIMESTAMP_REGRESSIONS: Counter = Counter::new(
        "qs_capability_timestamp_regressions_total",
        "Capability updates whose source timestamp regressed"
    ).expect("metric creation failed");

    /// Targets with at least one applied update
    pub static ref TARGETS_KNOWN: Gauge = Gauge::new(
        "qs_capability_targets_known",
        "Number of targets present in the capability store"
    ).expect("metric creation failed");

    // =========================================================================
    // STRATEGY INFERENCE METRICS (Subsystem 2)
    // =========================================================================

    /// Strategy decisions by tier
    pub static ref STRATEGIES_SELECTED: CounterVec = CounterVec::new(
        Opts::new("qs_inference_strategies_selected_total", "Strategy decisions by tier"),
        &["strategy"]  // SHALLOW / MEDIUM / DEEP
    ).expect("metric creation failed");

    // =========================================================================
    // COHERENCE VERIFIER METRICS (Subsystem 3)
    // =========================================================================

    /// Admission verdicts by outcome
    pub static ref VERDICTS: CounterVec = CounterVec::new(
        Opts::new("qs_verifier_verdicts_total", "Admission verdicts by outcome"),
        &["outcome"]  // APPROVE / REJECT
    ).expect("metric creation failed");

    /// estimated_duration / coherence_time
    pub static ref ADMISSION_MARGIN: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "qs_verifier_admission_margin_ratio",
            "Ratio of estimated duration to coherence time"
        ).buckets(linear_buckets(0.1, 0.1, 15).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // DISPATCH ORCHESTRATOR METRICS (Subsystem 4)
    // =========================================================================

    /// Jobs accepted for processing
    pub static ref JOBS_SUBMITTED: CounterVec = CounterVec::new(
        Opts::new("qs_dispatch_jobs_submitted_total", "Jobs accepted by the orchestrator"),
        &["job_class"]
    ).expect("metric creation failed");

    /// Rejected jobs by reason
    pub static ref JOB_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("qs_dispatch_job_rejections_total", "Rejected jobs by reason"),
        &["reason"]  // unknown_target / invalid_metrics / coherence_exceeded / circuit_open / cancelled
    ).expect("metric creation failed");

    /// Jobs reaching a terminal state
    pub static ref JOB_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("qs_dispatch_job_outcomes_total", "Jobs by terminal state"),
        &["state"]  // SUCCEEDED / FAILED / REJECTED
    ).expect("metric creation failed");

    /// Time from admission to adapter result
    pub static ref DISPATCH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "qs_dispatch_duration_seconds",
            "Time between record creation and adapter completion"
        ).buckets(exponential_buckets(0.001, 2.0, 16).unwrap_or_default())
    ).expect("metric creation failed");

    /// Targets whose adapter circuit is open
    pub static ref OPEN_CIRCUITS: Gauge = Gauge::new(
        "qs_dispatch_open_circuits",
        "Number of targets with an open adapter circuit"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Events consumed by the metrics subscriber
    pub static ref EVENT_BUS_EVENTS_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("qs_event_bus_events_received_total", "Bus events observed by topic"),
        &["topic"]
    ).expect("metric creation failed");
}

/// Handle to the metrics registry.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Capability store
        Box::new(CAPABILITY_UPDATES.clone()),
        Box::new(CAPABILITY_REJECTED.clone()),
        Box::new(TIMESTAMP_REGRESSIONS.clone()),
        Box::new(TARGETS_KNOWN.clone()),
        // Inference / verifier
        Box::new(STRATEGIES_SELECTED.clone()),
        Box::new(VERDICTS.clone()),
        Box::new(ADMISSION_MARGIN.clone()),
        // Orchestrator
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOB_REJECTIONS.clone()),
        Box::new(JOB_OUTCOMES.clone()),
        Box::new(DISPATCH_DURATION.clone()),
        Box::new(OPEN_CIRCUITS.clone()),
        // Event Bus
        Box::new(EVENT_BUS_EVENTS_RECEIVED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

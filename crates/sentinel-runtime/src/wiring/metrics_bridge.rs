//! Bus to Prometheus bridge.
//!
//! Subsystems only publish events. This consumer turns them into metrics
//! and the audit log, so observability never sits on the dispatch path.

use quantum_telemetry::{
    log_job_event, log_target_event, metric_inc, metric_observe, ADMISSION_MARGIN,
    CAPABILITY_REJECTED, CAPABILITY_UPDATES, DISPATCH_DURATION, EVENT_BUS_EVENTS_RECEIVED,
    JOB_OUTCOMES, JOB_REJECTIONS, OPEN_CIRCUITS, STRATEGIES_SELECTED, TARGETS_KNOWN,
    TIMESTAMP_REGRESSIONS, VERDICTS,
};
use shared_bus::{DispatchEvent, EventStream, EventTopic};
use shared_types::{JobState, TargetId};
use std::collections::HashSet;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tracing::debug;

const SUBSYSTEM: &str = "sentinel-runtime";

#[derive(Debug, Default)]
pub struct MetricsBridge {
    known_targets: HashSet<TargetId>,
    open_circuits: HashSet<TargetId>,
    observed: u64,
}

impl MetricsBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn known_targets(&self) -> usize {
        self.known_targets.len()
    }

    pub fn open_circuits(&self) -> usize {
        self.open_circuits.len()
    }

    pub fn observe(&mut self, event: &DispatchEvent) {
        self.observed += 1;
        metric_inc!(EVENT_BUS_EVENTS_RECEIVED, &[topic_label(event.topic())]);

        match event {
            DispatchEvent::CapabilityUpdated {
                target_id,
                revision,
                timestamp_regressed,
                ..
            } => {
                metric_inc!(CAPABILITY_UPDATES);
                if *timestamp_regressed {
                    metric_inc!(TIMESTAMP_REGRESSIONS);
                }
                if self.known_targets.insert(target_id.clone()) {
                    TARGETS_KNOWN.set(self.known_targets.len() as f64);
                    log_target_event!(info, SUBSYSTEM, "Target known", target_id, revision = *revision);
                }
            }
            DispatchEvent::CapabilityRejected { target_id, reason } => {
                metric_inc!(CAPABILITY_REJECTED);
                log_target_event!(warn, SUBSYSTEM, "Capability update refused", target_id, reason = %reason);
            }
            DispatchEvent::StrategySelected(decision) => {
                metric_inc!(STRATEGIES_SELECTED, &[decision.strategy.as_str()]);
            }
            DispatchEvent::VerdictIssued { verdict, .. } => {
                let outcome = verdict.outcome.to_string();
                metric_inc!(VERDICTS, &[outcome.as_str()]);
                metric_observe!(ADMISSION_MARGIN, verdict.margin);
            }
            DispatchEvent::JobStateChanged {
                job_id,
                target_id,
                state,
                reason,
                margin,
                ..
            } => {
                if state.is_terminal() {
                    metric_inc!(JOB_OUTCOMES, &[state.as_str()]);
                }
                match state {
                    JobState::Rejected => {
                        let label = reason.as_deref().map(reason_label).unwrap_or("unknown");
                        metric_inc!(JOB_REJECTIONS, &[label]);
                        log_job_event!(info, SUBSYSTEM, "Job rejected", job_id, target_id, reason = ?reason, margin = ?margin);
                    }
                    JobState::Failed => {
                        log_job_event!(warn, SUBSYSTEM, "Job failed", job_id, target_id, reason = ?reason);
                    }
                    JobState::Succeeded => {
                        log_job_event!(info, SUBSYSTEM, "Job succeeded", job_id, target_id, margin = ?margin);
                    }
                    _ => {
                        log_job_event!(debug, SUBSYSTEM, "Job state changed", job_id, target_id, state = %state);
                    }
                }
            }
            DispatchEvent::RecordCompleted(record) => {
                if let Some(completed_at) = record.completed_at {
                    let secs = completed_at.saturating_sub(record.created_at) as f64 / 1000.0;
                    metric_observe!(DISPATCH_DURATION, secs);
                }
            }
            DispatchEvent::CircuitStateChanged { target_id, state } => {
                let changed = if state == "open" {
                    self.open_circuits.insert(target_id.clone())
                } else {
                    self.open_circuits.remove(target_id)
                };
                if changed {
                    OPEN_CIRCUITS.set(self.open_circuits.len() as f64);
                }
                log_target_event!(warn, SUBSYSTEM, "Adapter circuit changed", target_id, state = %state);
            }
        }
    }

    /// Consume the stream until it closes or shutdown is signalled.
    pub async fn run(mut self, mut events: EventStream, mut shutdown: watch::Receiver<bool>) -> Self {
        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(event) => self.observe(&event),
                    None => break,
                },
                _ = shutdown.changed() => break,
            }
        }
        debug!(observed = self.observed, "Metrics bridge stopped");
        self
    }
}

fn topic_label(topic: EventTopic) -> &'static str {
    match topic {
        EventTopic::Capability => "capability",
        EventTopic::Admission => "admission",
        EventTopic::Lifecycle => "lifecycle",
        EventTopic::Records => "records",
        EventTopic::Health => "health",
        EventTopic::All => "all",
    }
}

/// Map a rejection reason as rendered on the bus back to its metric label.
fn reason_label(reason: &str) -> &'static str {
    if reason.starts_with("unknown target") {
        "unknown_target"
    } else if reason.starts_with("invalid metrics") {
        "invalid_metrics"
    } else if reason.starts_with("coherence margin") {
        "coherence_exceeded"
    } else if reason.starts_with("adapter circuit open") {
        "circuit_open"
    } else if reason.starts_with("cancelled") {
        "cancelled"
    } else {
        "other"
    }
}

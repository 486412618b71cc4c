//! Per-target lane.
//!
//! A lane owns the only write path to its target's capability entry and
//! makes every admission decision for the target, one message at a time.
//! The only await is for the next message.

use crate::application::dispatcher::spawn_dispatch;
use crate::application::orchestrator::Core;
use crate::domain::outcome::JobOutcome;
use qs_02_strategy_inference::InferenceError;
use shared_bus::DispatchEvent;
use shared_types::{
    now_millis, AdmissionVerdict, CapabilityUpdate, DispatchRecord, JobRequest, JobState,
    RejectReason, StrategyDecision, TargetId,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub(crate) enum LaneMessage {
    Update(CapabilityUpdate),
    Job(JobRequest),
}

pub(crate) async fn run_lane(
    core: Arc<Core>,
    target_id: TargetId,
    mut rx: mpsc::UnboundedReceiver<LaneMessage>,
) {
    while let Some(message) = rx.recv().await {
        match message {
            LaneMessage::Update(update) => apply_update(&core, update),
            LaneMessage::Job(job) => decide(&core, job),
        }
    }
    debug!(target_id = %target_id, "Lane drained");
}

fn apply_update(core: &Core, update: CapabilityUpdate) {
    let target_id = update.target_id.clone();
    match core.store.update(update) {
        Ok(receipt) => {
            debug!(
                target_id = %receipt.target_id,
                revision = receipt.revision,
                regressed = receipt.timestamp_regressed,
                "Capability update applied"
            );
            core.publisher.publish(DispatchEvent::CapabilityUpdated {
                target_id: receipt.target_id,
                revision: receipt.revision,
                timestamp: receipt.timestamp,
                timestamp_regressed: receipt.timestamp_regressed,
            });
        }
        Err(e) => {
            warn!(target_id = %target_id, error = %e, "Capability update refused by store");
            core.publisher.publish(DispatchEvent::CapabilityRejected {
                target_id,
                reason: e.to_string(),
            });
        }
    }
}

/// Take a job from RECEIVED to REJECTED or DISPATCHED.
fn decide(core: &Arc<Core>, job: JobRequest) {
    // The snapshot is fixed here; later updates do not affect this job.
    let snapshot = core.store.snapshot(&job.target_id);

    let decision = match core
        .engine
        .select(&job.id, snapshot.as_ref(), job.job_class)
    {
        Ok(decision) => decision,
        Err(e) => {
            let reason = match e {
                InferenceError::UnknownTarget { .. } => RejectReason::UnknownTarget,
                InferenceError::InvalidThresholds(msg) => RejectReason::InvalidMetrics(msg),
            };
            reject(core, &job, reason, None, None);
            return;
        }
    };

    if !core
        .registry
        .transition(&job.id, JobState::StrategySelected, now_millis())
    {
        debug!(job_id = %job.id, "Job left RECEIVED before its decision, skipping");
        return;
    }
    core.publish_state(&job.id, &job.target_id, JobState::StrategySelected, None, None);
    core.publisher
        .publish(DispatchEvent::StrategySelected(decision.clone()));

    let Some(target) = snapshot else {
        reject(core, &job, RejectReason::UnknownTarget, Some(decision), None);
        return;
    };

    let verdict = match core
        .verifier
        .verify(&job.id, job.estimated_duration, &target, now_millis())
    {
        Ok(verdict) => verdict,
        Err(e) => {
            reject(
                core,
                &job,
                RejectReason::InvalidMetrics(e.to_string()),
                Some(decision),
                None,
            );
            return;
        }
    };
    core.publisher.publish(DispatchEvent::VerdictIssued {
        target_id: job.target_id.clone(),
        verdict: verdict.clone(),
    });

    if !verdict.is_approved() {
        let margin = verdict.margin;
        reject(
            core,
            &job,
            RejectReason::CoherenceExceeded { margin },
            Some(decision),
            Some(verdict),
        );
        return;
    }

    if !core.circuit_allows(&job.target_id) {
        reject(core, &job, RejectReason::CircuitOpen, Some(decision), Some(verdict));
        return;
    }

    let now = now_millis();
    let margin = Some(verdict.margin);
    if !core.registry.transition(&job.id, JobState::Approved, now) {
        return;
    }
    core.publish_state(&job.id, &job.target_id, JobState::Approved, None, margin);

    let record = DispatchRecord::new(decision, verdict, now);
    let deadline = now.saturating_add(core.config.dispatch_timeout.as_millis() as u64);
    if !core.registry.transition(&job.id, JobState::Dispatched, now) {
        return;
    }
    core.publish_state(&job.id, &job.target_id, JobState::Dispatched, None, margin);

    info!(
        job_id = %job.id,
        target_id = %job.target_id,
        strategy = %record.strategy(),
        depth = record.decision.depth,
        margin = record.verdict.margin,
        "Job dispatched"
    );
    spawn_dispatch(core, record, job.payload, deadline);
}

fn reject(
    core: &Core,
    job: &JobRequest,
    reason: RejectReason,
    decision: Option<StrategyDecision>,
    verdict: Option<AdmissionVerdict>,
) {
    let margin = verdict.as_ref().map(|v| v.margin);
    let text = reason.to_string();
    let outcome = JobOutcome::Rejected {
        job_id: job.id.clone(),
        target_id: job.target_id.clone(),
        reason: reason.clone(),
        decision,
        verdict,
    };
    if !core
        .registry
        .complete(&job.id, JobState::Rejected, Some(text.clone()), outcome, now_millis())
    {
        debug!(job_id = %job.id, "Job already terminal, rejection dropped");
        return;
    }

    info!(
        job_id = %job.id,
        target_id = %job.target_id,
        reason = reason.label(),
        "Job rejected"
    );
    core.publish_state(&job.id, &job.target_id, JobState::Rejected, Some(text), margin);
}

//! Adapter calls.

use crate::application::orchestrator::Core;
use crate::domain::outcome::JobOutcome;
use shared_bus::DispatchEvent;
use shared_types::{
    now_millis, AdapterResult, DispatchRecord, FailureReason, JobState, Payload, Timestamp,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run the adapter call for an APPROVED, DISPATCHED job in its own task.
pub(crate) fn spawn_dispatch(
    core: &Arc<Core>,
    record: DispatchRecord,
    payload: Payload,
    deadline: Timestamp,
) {
    let guard = core.track_dispatch();
    let core = Arc::clone(core);
    tokio::spawn(async move {
        let _guard = guard;
        dispatch(&core, record, payload, deadline).await;
    });
}

async fn dispatch(core: &Core, mut record: DispatchRecord, payload: Payload, deadline: Timestamp) {
    let target_id = record.target_id.clone();
    let job_id = record.job_id.clone();
    let started = std::time::Instant::now();

    let call = core
        .adapter
        .execute(&target_id, record.strategy(), payload, deadline);
    let result = match tokio::time::timeout(core.config.dispatch_timeout, call).await {
        Ok(Ok(output)) => {
            core.record_adapter_health(&target_id, true);
            AdapterResult::Success(output)
        }
        Ok(Err(e)) => {
            warn!(job_id = %job_id, target_id = %target_id, error = %e, "Adapter reported failure");
            core.record_adapter_health(&target_id, false);
            AdapterResult::Failure(FailureReason::Adapter(e))
        }
        Err(_) => {
            warn!(job_id = %job_id, target_id = %target_id, deadline, "Adapter deadline exceeded");
            core.record_adapter_health(&target_id, false);
            AdapterResult::Failure(FailureReason::Timeout { deadline })
        }
    };

    let (state, reason) = match &result {
        AdapterResult::Failure(failure) => (JobState::Failed, Some(failure.to_string())),
        _ => (JobState::Succeeded, None),
    };

    let now = now_millis();
    if let Err(e) = record.complete(result, now) {
        error!(job_id = %job_id, error = %e, "Dispatch record could not be completed");
        return;
    }
    if let Err(e) = core.sink.append(&record) {
        error!(job_id = %job_id, error = %e, "Failed to append dispatch record");
    }
    core.publisher
        .publish(DispatchEvent::RecordCompleted(record.clone()));

    let margin = Some(record.verdict.margin);
    if core
        .registry
        .complete(&job_id, state, reason.clone(), JobOutcome::Completed(record), now)
    {
        info!(
            job_id = %job_id,
            target_id = %target_id,
            state = %state,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dispatch finished"
        );
        core.publish_state(&job_id, &target_id, state, reason, margin);
    }
}

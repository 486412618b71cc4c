//! Admin endpoint: health, Prometheus metrics, and read-only views of the
//! pipeline state.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use qs_04_dispatch_orchestrator::{DispatchApi, DispatchOrchestrator};
use shared_types::{ExecutionTarget, JobId};
use std::sync::Arc;
use tracing::error;

pub fn router(orchestrator: Arc<DispatchOrchestrator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/targets", get(targets))
        .route("/circuits", get(circuits))
        .route("/jobs/:job_id", get(job))
        .with_state(orchestrator)
}

async fn health(State(orchestrator): State<Arc<DispatchOrchestrator>>) -> Response {
    let body = Json(serde_json::json!({
        "status": if orchestrator.is_stopped() { "stopping" } else { "ok" },
        "targets": orchestrator.targets().len(),
        "in_flight": orchestrator.in_flight(),
        "records": orchestrator.records().len(),
    }));
    if orchestrator.is_stopped() {
        (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
    } else {
        body.into_response()
    }
}

async fn metrics() -> Response {
    match quantum_telemetry::encode_metrics() {
        Ok(text) => text.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn targets(State(orchestrator): State<Arc<DispatchOrchestrator>>) -> Json<Vec<ExecutionTarget>> {
    Json(
        orchestrator
            .targets()
            .iter()
            .filter_map(|id| orchestrator.snapshot(id))
            .collect(),
    )
}

async fn circuits(State(orchestrator): State<Arc<DispatchOrchestrator>>) -> Response {
    Json(orchestrator.circuit_stats()).into_response()
}

async fn job(
    State(orchestrator): State<Arc<DispatchOrchestrator>>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id = JobId::new(job_id);
    let Some(transitions) = orchestrator.transitions(&job_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let history: Vec<_> = transitions
        .iter()
        .map(|t| {
            serde_json::json!({
                "state": t.to.as_str(),
                "at": t.at,
                "reason": t.reason,
            })
        })
        .collect();
    Json(serde_json::json!({
        "job_id": job_id.as_str(),
        "state": orchestrator.job_state(&job_id).map(|s| s.as_str()),
        "history": history,
    }))
    .into_response()
}

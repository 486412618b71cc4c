//! # Job Lifecycle
//!
//! State machine guarantees observed from outside the orchestrator:
//! one lifecycle per job id, a valid path to exactly one terminal state,
//! adapter failures and deadlines surfaced verbatim, cancellation only
//! before a decision, and the adapter circuit gating dispatch.

#[cfg(test)]
mod tests {
    use crate::fixtures::{ibm_a, job, EchoAdapter, Pipeline};
    use qs_04_dispatch_orchestrator::{
        CancelError, CircuitBreakerConfig, CircuitState, DispatchApi, DispatchError,
        OrchestratorConfig,
    };
    use shared_bus::{DispatchEvent, EventFilter, EventTopic};
    use shared_types::{
        AdapterError, AdapterResult, FailureReason, JobId, JobState, RejectReason, TargetId,
    };
    use std::time::Duration;

    /// Every consecutive pair is an allowed transition and only the last
    /// state is terminal.
    fn assert_valid_path(p: &Pipeline, job_id: &str) {
        let history = p.orchestrator.transitions(&JobId::new(job_id)).unwrap();
        assert_eq!(history[0].from, None);
        assert_eq!(history[0].to, JobState::Received);
        for pair in history.windows(2) {
            assert_eq!(pair[1].from, Some(pair[0].to));
            assert!(
                pair[0].to.can_transition_to(pair[1].to),
                "{} -> {}",
                pair[0].to,
                pair[1].to
            );
        }
        let terminal = history.iter().filter(|t| t.to.is_terminal()).count();
        assert_eq!(terminal, 1, "{job_id} has {terminal} terminal states");
        assert!(history.last().unwrap().to.is_terminal());
    }

    // =========================================================================
    // DUPLICATES
    // =========================================================================

    #[tokio::test]
    async fn test_duplicate_submission_has_one_lifecycle() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();
        let mut sub = p.bus.subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));

        let ticket = p.orchestrator.submit(job("job-1", "ibm-a", 40.0)).unwrap();
        let err = p
            .orchestrator
            .submit(job("job-1", "ibm-a", 40.0))
            .unwrap_err();
        assert_eq!(err, DispatchError::DuplicateJob(JobId::new("job-1")));

        ticket.outcome().await.unwrap();

        assert_eq!(p.adapter.calls(), 1);
        assert_eq!(p.orchestrator.records().len(), 1);
        assert_valid_path(&p, "job-1");

        let mut received = 0;
        while let Ok(Some(event)) = sub.try_recv() {
            if let DispatchEvent::JobStateChanged {
                state: JobState::Received,
                ..
            } = event
            {
                received += 1;
            }
        }
        assert_eq!(received, 1);
    }

    #[tokio::test]
    async fn test_duplicate_after_completion_is_refused() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        p.orchestrator
            .submit(job("job-1", "ibm-a", 40.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert!(matches!(
            p.orchestrator.submit(job("job-1", "ibm-a", 10.0)),
            Err(DispatchError::DuplicateJob(_))
        ));
        assert_eq!(
            p.orchestrator.job_state(&JobId::new("job-1")),
            Some(JobState::Succeeded)
        );
    }

    // =========================================================================
    // ADAPTER FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_adapter_failure_is_recorded_verbatim() {
        let adapter = EchoAdapter::new();
        adapter.fail_target("ibm-a");
        let p = Pipeline::with(adapter, OrchestratorConfig::default());
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        let outcome = p
            .orchestrator
            .submit(job("job-1", "ibm-a", 40.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(outcome.state(), JobState::Failed);
        let expected = AdapterError::Unavailable("ibm-a offline".into());
        assert_eq!(
            outcome.record().unwrap().adapter_result,
            AdapterResult::Failure(FailureReason::Adapter(expected.clone()))
        );
        assert_eq!(outcome.error(), Some(DispatchError::Adapter(expected)));
        assert_eq!(p.orchestrator.records().len(), 1);

        let last = p
            .orchestrator
            .transitions(&JobId::new("job-1"))
            .unwrap()
            .pop()
            .unwrap();
        assert!(last.reason.unwrap().contains("ibm-a offline"));
        assert_valid_path(&p, "job-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fails_job_with_timeout() {
        let config = OrchestratorConfig {
            dispatch_timeout: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        };
        let p = Pipeline::with(EchoAdapter::with_delay(Duration::from_secs(10)), config);
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        let outcome = p
            .orchestrator
            .submit(job("job-slow", "ibm-a", 40.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(outcome.state(), JobState::Failed);
        assert!(matches!(
            outcome.record().unwrap().adapter_result,
            AdapterResult::Failure(FailureReason::Timeout { .. })
        ));
        assert!(matches!(
            outcome.error(),
            Some(DispatchError::AdapterTimeout { .. })
        ));
        assert_valid_path(&p, "job-slow");
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_opens_then_recovers() {
        let config = OrchestratorConfig {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 3,
                open_timeout: Duration::from_secs(30),
                ..CircuitBreakerConfig::default()
            },
            ..OrchestratorConfig::default()
        };
        let adapter = EchoAdapter::new();
        adapter.fail_target("ibm-a");
        let p = Pipeline::with(adapter, config);
        p.orchestrator.apply_update(ibm_a(1)).unwrap();
        let target = TargetId::new("ibm-a");

        for i in 0..3 {
            let outcome = p
                .orchestrator
                .submit(job(&format!("job-{i}"), "ibm-a", 10.0))
                .unwrap()
                .outcome()
                .await
                .unwrap();
            assert_eq!(outcome.state(), JobState::Failed);
        }
        assert_eq!(p.orchestrator.circuit_state(&target), CircuitState::Open);

        let outcome = p
            .orchestrator
            .submit(job("job-blocked", "ibm-a", 10.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();
        assert_eq!(outcome.reject_reason(), Some(&RejectReason::CircuitOpen));
        assert_eq!(p.adapter.calls(), 3);
        assert!(p
            .orchestrator
            .records()
            .iter()
            .all(|r| r.job_id != JobId::new("job-blocked")));

        p.adapter.heal_target(&target);
        tokio::time::advance(Duration::from_secs(31)).await;

        let outcome = p
            .orchestrator
            .submit(job("job-trial", "ibm-a", 10.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();
        assert_eq!(outcome.state(), JobState::Succeeded);
        assert_eq!(p.orchestrator.circuit_state(&target), CircuitState::Closed);
    }

    // =========================================================================
    // CANCELLATION
    // =========================================================================

    #[tokio::test]
    async fn test_cancel_before_decision() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        // The lane has not run yet on this single-threaded runtime.
        let ticket = p.orchestrator.submit(job("job-1", "ibm-a", 40.0)).unwrap();
        p.orchestrator.cancel(&JobId::new("job-1")).unwrap();

        let outcome = ticket.outcome().await.unwrap();
        assert_eq!(outcome.reject_reason(), Some(&RejectReason::Cancelled));
        assert_eq!(outcome.error(), Some(DispatchError::Cancelled(JobId::new("job-1"))));

        // Let the lane see the cancelled job.
        p.orchestrator
            .submit(job("job-2", "ibm-a", 40.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(p.adapter.calls(), 1);
        assert_eq!(
            p.orchestrator.job_state(&JobId::new("job-1")),
            Some(JobState::Rejected)
        );
        assert_valid_path(&p, "job-1");
    }

    #[tokio::test]
    async fn test_cancel_after_terminal_or_unknown() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        p.orchestrator
            .submit(job("job-1", "ibm-a", 40.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(
            p.orchestrator.cancel(&JobId::new("job-1")),
            Err(CancelError::NotCancellable {
                job_id: JobId::new("job-1"),
                state: JobState::Succeeded,
            })
        );
        assert_eq!(
            p.orchestrator.cancel(&JobId::new("nope")),
            Err(CancelError::UnknownJob(JobId::new("nope")))
        );
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_shutdown_waits_for_dispatches() {
        let p = Pipeline::with(
            EchoAdapter::with_delay(Duration::from_millis(20)),
            OrchestratorConfig::default(),
        );
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        let tickets: Vec<_> = (0..5)
            .map(|i| {
                p.orchestrator
                    .submit(job(&format!("job-{i}"), "ibm-a", 10.0))
                    .unwrap()
            })
            .collect();

        p.orchestrator.shutdown().await;

        assert_eq!(p.orchestrator.in_flight(), 0);
        assert_eq!(p.orchestrator.records().len(), 5);
        for ticket in tickets {
            assert_eq!(ticket.outcome().await.unwrap().state(), JobState::Succeeded);
        }
        assert_eq!(
            p.orchestrator.submit(job("late", "ibm-a", 10.0)).unwrap_err(),
            DispatchError::Stopped
        );
        assert!(matches!(
            p.orchestrator.apply_update(ibm_a(2)),
            Err(DispatchError::Stopped)
        ));
    }
}

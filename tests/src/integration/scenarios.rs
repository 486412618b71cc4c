//! # Reference Scenarios
//!
//! The `ibm-a` reference target (T1 = 100 µs, F = 0.97) driven through the
//! whole pipeline:
//!
//! | Job | Strategy | Verdict | Margin |
//! |-----|----------|---------|--------|
//! | 40 µs | MEDIUM | APPROVE | 0.4 |
//! | 60 µs | MEDIUM | REJECT | 0.6 |
//! | any, unknown target | - | `UnknownTarget` at submit | - |

#[cfg(test)]
mod tests {
    use crate::fixtures::{ibm_a, job, target_update, Pipeline};
    use proptest::prelude::*;
    use qs_02_strategy_inference::{StrategyEngine, StrategyInferenceApi};
    use qs_03_coherence_verifier::{CoherenceVerifier, CoherenceVerifierApi};
    use qs_04_dispatch_orchestrator::{DispatchApi, DispatchError, RecordSink};
    use shared_bus::{DispatchEvent, EventFilter, EventTopic};
    use shared_types::{
        AdapterResult, AdmissionOutcome, ExecutionTarget, JobClass, JobId, JobRequest, JobState,
        RejectReason, Strategy, TargetId,
    };

    fn snapshot(coherence_time: f64, gate_fidelity: f64) -> ExecutionTarget {
        ExecutionTarget {
            id: TargetId::new("ibm-a"),
            coherence_time,
            gate_fidelity,
            queue_depth: 0,
            last_updated: 1,
            revision: 1,
            timestamp_regressed: false,
        }
    }

    // =========================================================================
    // REFERENCE TARGET
    // =========================================================================

    #[tokio::test]
    async fn test_ibm_a_40us_is_medium_and_approved() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        let outcome = p
            .orchestrator
            .submit(job("job-40", "ibm-a", 40.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(outcome.state(), JobState::Succeeded);
        let record = outcome.record().unwrap();
        assert_eq!(record.strategy(), Strategy::Medium);
        assert_eq!(record.decision.depth, 2);
        assert_eq!(record.verdict.outcome, AdmissionOutcome::Approve);
        assert!((record.verdict.margin - 0.4).abs() < 1e-9);
        assert!(matches!(
            &record.adapter_result,
            AdapterResult::Success(r) if r.as_bytes() == b"job-40"
        ));
        assert_eq!(p.sink.records(), vec![record.clone()]);
    }

    #[tokio::test]
    async fn test_ibm_a_60us_is_rejected_without_record() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        let outcome = p
            .orchestrator
            .submit(job("job-60", "ibm-a", 60.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(outcome.state(), JobState::Rejected);
        let verdict = outcome.verdict().unwrap();
        assert_eq!(verdict.outcome, AdmissionOutcome::Reject);
        assert!((verdict.margin - 0.6).abs() < 1e-9);
        assert!(matches!(
            outcome.reject_reason(),
            Some(RejectReason::CoherenceExceeded { .. })
        ));
        assert_eq!(outcome.decision().unwrap().strategy, Strategy::Medium);
        assert!(p.orchestrator.records().is_empty());
        assert_eq!(p.adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_target_fails_at_submit() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();
        let mut sub = p.bus.subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));

        let err = p
            .orchestrator
            .submit(job("job-x", "ibm-zz", 10.0))
            .unwrap_err();

        assert_eq!(err, DispatchError::UnknownTarget(TargetId::new("ibm-zz")));
        assert!(p.orchestrator.job_state(&JobId::new("job-x")).is_none());
        assert!(p.orchestrator.records().is_empty());
        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    // =========================================================================
    // BOUNDARIES
    // =========================================================================

    #[tokio::test]
    async fn test_fidelity_thresholds_are_inclusive() {
        let p = Pipeline::new();
        let cases = [
            ("t-deep", 0.99, Strategy::Deep),
            ("t-medium", 0.95, Strategy::Medium),
            ("t-shallow", 0.9499, Strategy::Shallow),
            ("t-perfect", 1.0, Strategy::Deep),
            ("t-dead", 0.0, Strategy::Shallow),
        ];
        for (target, fidelity, _) in cases {
            p.orchestrator
                .apply_update(target_update(target, 100e-6, fidelity, 1))
                .unwrap();
        }

        for (target, _, expected) in cases {
            let outcome = p
                .orchestrator
                .submit(job(&format!("job-{target}"), target, 10.0))
                .unwrap()
                .outcome()
                .await
                .unwrap();
            assert_eq!(outcome.decision().unwrap().strategy, expected, "{target}");
        }
    }

    #[tokio::test]
    async fn test_duration_at_budget_is_rejected() {
        let p = Pipeline::new();
        p.orchestrator
            .apply_update(target_update("ibm-a", 0.5, 0.97, 1))
            .unwrap();

        // 0.25 == 0.5 * 0.5 exactly
        let request = JobRequest::new("job-edge", "ibm-a", 0.25, JobClass::Pricing);
        let outcome = p.orchestrator.submit(request).unwrap().outcome().await.unwrap();

        assert_eq!(outcome.state(), JobState::Rejected);
        assert_eq!(outcome.verdict().unwrap().margin, 0.5);

        let request = JobRequest::new("job-under", "ibm-a", 0.2499, JobClass::Pricing);
        let outcome = p.orchestrator.submit(request).unwrap().outcome().await.unwrap();
        assert_eq!(outcome.state(), JobState::Succeeded);
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[tokio::test]
    async fn test_approved_job_event_trail() {
        let p = Pipeline::new();
        let mut sub = p.bus.subscribe(EventFilter::all());
        p.orchestrator.apply_update(ibm_a(1)).unwrap();

        let ticket = p.orchestrator.submit(job("job-1", "ibm-a", 40.0)).unwrap();
        ticket.outcome().await.unwrap();

        let mut states = Vec::new();
        let mut saw_update = false;
        let mut saw_decision = false;
        let mut saw_verdict = false;
        let mut saw_record = false;
        while let Ok(Some(event)) = sub.try_recv() {
            match event {
                DispatchEvent::CapabilityUpdated { revision, .. } => {
                    assert_eq!(revision, 1);
                    saw_update = true;
                }
                DispatchEvent::StrategySelected(decision) => {
                    assert_eq!(decision.strategy, Strategy::Medium);
                    saw_decision = true;
                }
                DispatchEvent::VerdictIssued { verdict, .. } => {
                    assert!(verdict.is_approved());
                    saw_verdict = true;
                }
                DispatchEvent::JobStateChanged { state, .. } => states.push(state),
                DispatchEvent::RecordCompleted(record) => {
                    assert_eq!(record.state(), JobState::Succeeded);
                    saw_record = true;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }

        assert!(saw_update && saw_decision && saw_verdict && saw_record);
        assert_eq!(
            states,
            vec![
                JobState::Received,
                JobState::StrategySelected,
                JobState::Approved,
                JobState::Dispatched,
                JobState::Succeeded,
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_job_event_carries_reason_and_margin() {
        let p = Pipeline::new();
        p.orchestrator.apply_update(ibm_a(1)).unwrap();
        let mut sub = p.bus.subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));

        p.orchestrator
            .submit(job("job-1", "ibm-a", 60.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        let mut last = None;
        while let Ok(Some(event)) = sub.try_recv() {
            last = Some(event);
        }
        match last {
            Some(DispatchEvent::JobStateChanged {
                state: JobState::Rejected,
                reason: Some(reason),
                margin: Some(margin),
                ..
            }) => {
                assert!(reason.contains("coherence"), "{reason}");
                assert!((margin - 0.6).abs() < 1e-9);
            }
            other => panic!("unexpected final event {other:?}"),
        }
    }

    // =========================================================================
    // PURITY
    // =========================================================================

    #[test]
    fn test_select_and_verify_are_repeatable() {
        let engine = StrategyEngine::new();
        let verifier = CoherenceVerifier::new();
        let target = snapshot(100e-6, 0.97);
        let id = JobId::new("job-1");

        let first = engine.select(&id, Some(&target), JobClass::Pricing).unwrap();
        let second = engine.select(&id, Some(&target), JobClass::Pricing).unwrap();
        assert_eq!(first, second);

        let first = verifier.verify(&id, 40e-6, &target, 7).unwrap();
        let second = verifier.verify(&id, 40e-6, &target, 7).unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_pipeline_rules_agree(
            fidelity in 0.0f64..=1.0,
            coherence_micros in 1.0f64..1_000.0,
            duration_ratio in 0.0f64..2.0,
        ) {
            let engine = StrategyEngine::new();
            let verifier = CoherenceVerifier::new();
            let target = snapshot(coherence_micros * 1e-6, fidelity);
            let id = JobId::new("job-p");
            let duration = duration_ratio * target.coherence_time;

            let decision = engine.select(&id, Some(&target), JobClass::HedgeOptimization).unwrap();
            let expected = if fidelity >= 0.99 {
                Strategy::Deep
            } else if fidelity >= 0.95 {
                Strategy::Medium
            } else {
                Strategy::Shallow
            };
            prop_assert_eq!(decision.strategy, expected);
            prop_assert_eq!(decision.target_revision, 1);

            let verdict = verifier.verify(&id, duration, &target, 0).unwrap();
            prop_assert_eq!(verdict.is_approved(), duration < 0.5 * target.coherence_time);
        }
    }
}

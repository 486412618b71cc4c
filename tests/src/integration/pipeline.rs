//! # Capability Sources into Dispatch
//!
//! Knowledge-base seeding and calibration reports feeding the orchestrator,
//! with the durable JSON-lines record log and the digital twin backend in
//! place of the test doubles.

#[cfg(test)]
mod tests {
    use crate::fixtures::{job, EchoAdapter};
    use qs_01_capability_store::{
        channel_feed, CalibrationReport, CapabilityFeed, CapabilityStore, KnowledgeBase,
        QubitCalibration,
    };
    use qs_02_strategy_inference::StrategyEngine;
    use qs_03_coherence_verifier::{CoherenceVerifier, DurationModel};
    use qs_04_dispatch_orchestrator::{
        DigitalTwinAdapter, DigitalTwinConfig, DispatchApi, DispatchDependencies,
        DispatchOrchestrator, ExecutionAdapter, InMemoryRecordLog, JsonLinesRecordLog,
        OrchestratorConfig, RecordSink,
    };
    use shared_bus::InMemoryEventBus;
    use shared_types::{
        AdapterError, AdapterResult, FailureReason, JobClass, JobRequest, JobState, Strategy,
        TargetId,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const KB: &str = r#"{
        "nodes": [
            {"id": "ibm_heron", "type": "hardware", "label": "IBM Heron",
             "properties": {"t1": 100.0, "eplg": "3.7E-3"}},
            {"id": "ionq_aria", "type": "hardware", "label": "IonQ Aria",
             "properties": {"t1": 1000000, "fidelity": 0.96}},
            {"id": "qaoa", "type": "algorithm", "label": "QAOA", "properties": {}}
        ],
        "edges": [{"source": "qaoa", "target": "ibm_heron", "relationship": "runs_on"}]
    }"#;

    fn orchestrator(
        adapter: Arc<dyn ExecutionAdapter>,
        sink: Arc<dyn RecordSink>,
    ) -> DispatchOrchestrator {
        DispatchOrchestrator::new(DispatchDependencies {
            store: Arc::new(CapabilityStore::new()),
            engine: Arc::new(StrategyEngine::new()),
            verifier: Arc::new(CoherenceVerifier::new()),
            adapter,
            sink,
            publisher: Arc::new(InMemoryEventBus::new()),
            config: OrchestratorConfig::default(),
        })
    }

    fn report(backend: &str, t1s: &[f64]) -> CalibrationReport {
        CalibrationReport {
            backend: backend.into(),
            last_update: None,
            qubits: t1s
                .iter()
                .enumerate()
                .map(|(id, &t1)| QubitCalibration {
                    id: id as u32,
                    t1,
                    t2: None,
                    readout_error: 0.01,
                    operational: true,
                })
                .collect(),
            queue_depth: 1,
        }
    }

    #[tokio::test]
    async fn test_knowledge_base_seeds_targets() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(JsonLinesRecordLog::open(dir.path().join("records.jsonl")).unwrap());
        let o = orchestrator(Arc::new(EchoAdapter::new()), sink);

        let kb = KnowledgeBase::from_json(KB).unwrap();
        for update in kb.seed_updates(1) {
            o.apply_update(update).unwrap();
        }
        assert_eq!(
            o.targets(),
            vec![TargetId::new("ibm_heron"), TargetId::new("ionq_aria")]
        );

        // ibm_heron: F = 0.9963 -> DEEP
        let outcome = o
            .submit(job("job-heron", "ibm_heron", 20.0))
            .unwrap()
            .outcome()
            .await
            .unwrap();
        assert_eq!(outcome.record().unwrap().strategy(), Strategy::Deep);

        // ionq_aria: F = 0.96 -> MEDIUM, T1 = 1 s leaves plenty of room
        let request = JobRequest::new("job-aria", "ionq_aria", 0.1, JobClass::HedgeOptimization);
        let outcome = o.submit(request).unwrap().outcome().await.unwrap();
        assert_eq!(outcome.record().unwrap().strategy(), Strategy::Medium);
        assert_eq!(outcome.state(), JobState::Succeeded);
    }

    #[tokio::test]
    async fn test_calibration_feed_drives_decisions() {
        let sink = Arc::new(InMemoryRecordLog::new());
        let o = Arc::new(orchestrator(Arc::new(EchoAdapter::new()), sink));
        let (sender, mut feed) = channel_feed(8);

        // Median T1 80 µs at F = 0.97, then a degraded 40 µs calibration.
        let first = report("ibm-a", &[70.0, 80.0, 95.0])
            .to_update("ibm-a", 0.03, 1)
            .unwrap();
        let second = report("ibm-a", &[35.0, 40.0, 50.0])
            .to_update("ibm-a", 0.03, 2)
            .unwrap();

        let pump = {
            let o = o.clone();
            tokio::spawn(async move {
                let mut applied = 0;
                while let Some(update) = feed.next_update().await {
                    if o.apply_update(update).is_ok() {
                        applied += 1;
                    }
                }
                applied
            })
        };
        sender.send(first).await.unwrap();
        drop(sender);
        assert_eq!(pump.await.unwrap(), 1);

        // 30 µs: margin 0.375 on the first calibration
        let outcome = o.submit(job("job-1", "ibm-a", 30.0)).unwrap().outcome().await.unwrap();
        assert_eq!(outcome.state(), JobState::Succeeded);
        assert_eq!(outcome.decision().unwrap().target_revision, 1);

        o.apply_update(second).unwrap();
        let outcome = o.submit(job("job-2", "ibm-a", 30.0)).unwrap().outcome().await.unwrap();
        assert_eq!(outcome.state(), JobState::Rejected);
        assert!((outcome.verdict().unwrap().margin - 0.75).abs() < 1e-9);
        assert_eq!(outcome.decision().unwrap().target_revision, 2);

        let snapshot = o.snapshot(&TargetId::new("ibm-a")).unwrap();
        assert_eq!(snapshot.revision, 2);
        assert_eq!(snapshot.queue_depth, 1);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let kb = KnowledgeBase::from_json(KB).unwrap();

        {
            let sink = Arc::new(JsonLinesRecordLog::open(&path).unwrap());
            let o = orchestrator(Arc::new(EchoAdapter::new()), sink);
            for update in kb.seed_updates(1) {
                o.apply_update(update).unwrap();
            }
            for i in 0..3 {
                o.submit(job(&format!("job-{i}"), "ibm_heron", 10.0))
                    .unwrap()
                    .outcome()
                    .await
                    .unwrap();
            }
            // Rejected jobs leave no record.
            o.submit(job("job-big", "ibm_heron", 80.0))
                .unwrap()
                .outcome()
                .await
                .unwrap();
            o.shutdown().await;
        }

        let records = JsonLinesRecordLog::read_all(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.completed_at.is_some()));

        let reopened = JsonLinesRecordLog::open(&path).unwrap();
        assert_eq!(reopened.records(), records);
    }

    #[tokio::test]
    async fn test_digital_twin_backend() {
        let model = DurationModel::default();
        let kb = KnowledgeBase::from_json(KB).unwrap();
        let twin = |failure_rate| {
            Arc::new(DigitalTwinAdapter::new(DigitalTwinConfig {
                min_latency: Duration::from_millis(1),
                max_latency: Duration::from_millis(2),
                failure_rate,
                seed: Some(7),
            }))
        };

        let healthy = orchestrator(twin(0.0), Arc::new(InMemoryRecordLog::new()));
        let broken = orchestrator(twin(1.0), Arc::new(InMemoryRecordLog::new()));
        for update in kb.seed_updates(1) {
            healthy.apply_update(update.clone()).unwrap();
            broken.apply_update(update).unwrap();
        }

        // 500 layers at 50 ns: margin 0.25 on ibm_heron
        let duration = model.estimate(500);
        let request = JobRequest::new("job-twin", "ibm_heron", duration, JobClass::Pricing);

        let outcome = healthy.submit(request.clone()).unwrap().outcome().await.unwrap();
        assert_eq!(outcome.state(), JobState::Succeeded);
        assert!(matches!(
            &outcome.record().unwrap().adapter_result,
            AdapterResult::Success(r) if !r.as_bytes().is_empty()
        ));

        let outcome = broken.submit(request).unwrap().outcome().await.unwrap();
        assert_eq!(outcome.state(), JobState::Failed);
        assert!(matches!(
            &outcome.record().unwrap().adapter_result,
            AdapterResult::Failure(FailureReason::Adapter(AdapterError::Backend(_)))
        ));
    }
}

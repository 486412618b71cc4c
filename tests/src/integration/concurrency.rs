//! # Ordering Under Load
//!
//! Updates and jobs for one target share a FIFO lane, so every job must be
//! decided on exactly the updates routed before its submission, no matter
//! how many other targets are busy at the same time, and must never see an
//! update routed after its submission returned.

#[cfg(test)]
mod tests {
    use crate::fixtures::{job, target_update, EchoAdapter, Pipeline};
    use futures::future::join_all;
    use qs_04_dispatch_orchestrator::{DispatchApi, DispatchError, JobTicket, OrchestratorConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{JobId, JobState, Strategy, TargetId};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const TARGETS: usize = 4;
    const OPS_PER_TARGET: usize = 250;

    /// Fidelities cycling through all three tiers.
    const FIDELITIES: [(f64, Strategy); 3] = [
        (0.995, Strategy::Deep),
        (0.97, Strategy::Medium),
        (0.90, Strategy::Shallow),
    ];

    struct Expected {
        ticket: JobTicket,
        revision: u64,
        strategy: Strategy,
    }

    /// Drive one target with a seeded mix of updates and jobs, returning
    /// what each job must observe.
    fn drive_target(p: &Pipeline, target: &str, seed: u64) -> Vec<Expected> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut revision = 0u64;
        let mut strategy = Strategy::Shallow;
        let mut expected = Vec::new();

        for op in 0..OPS_PER_TARGET {
            // The first operation must create the target.
            if op == 0 || rng.gen_bool(0.4) {
                let (fidelity, tier) = FIDELITIES[rng.gen_range(0..FIDELITIES.len())];
                p.orchestrator
                    .apply_update(target_update(target, 100e-6, fidelity, op as u64))
                    .unwrap();
                revision += 1;
                strategy = tier;
            } else {
                let id = format!("{target}-job-{op}");
                let ticket = p.orchestrator.submit(job(&id, target, 10.0)).unwrap();
                expected.push(Expected {
                    ticket,
                    revision,
                    strategy,
                });
            }
        }
        expected
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_updates_and_jobs_observe_prefix() {
        let p = Arc::new(Pipeline::with(
            EchoAdapter::with_delay(Duration::from_micros(200)),
            OrchestratorConfig::default(),
        ));

        let drivers: Vec<_> = (0..TARGETS)
            .map(|t| {
                let p = p.clone();
                tokio::spawn(async move { drive_target(&p, &format!("qpu-{t}"), t as u64) })
            })
            .collect();

        let mut observed = HashMap::new();
        for driver in join_all(drivers).await {
            for exp in driver.unwrap() {
                let job_id = exp.ticket.job_id().clone();
                let outcome = exp.ticket.outcome().await.unwrap();
                let decision = outcome.decision().unwrap();

                assert_eq!(decision.target_revision, exp.revision, "{job_id}");
                assert_eq!(decision.strategy, exp.strategy, "{job_id}");
                assert_eq!(outcome.state(), JobState::Succeeded, "{job_id}");
                observed.insert(job_id, exp.revision);
            }
        }

        p.orchestrator.shutdown().await;
        let records = p.orchestrator.records();
        assert_eq!(records.len(), observed.len());
        assert_eq!(p.adapter.calls(), observed.len());

        // The persisted decision carries the same snapshot revision.
        for record in records {
            assert_eq!(
                Some(&record.decision.target_revision),
                observed.get(&record.job_id),
                "{}",
                record.job_id
            );
        }
    }

    const RACE_UPDATES: u64 = 1000;
    const RACE_JOBS: usize = 1000;

    /// Coherence time of the update that brings `ibm-a` to `revision`.
    fn race_t1(revision: u64) -> f64 {
        (100.0 + revision as f64) * 1e-6
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_updates_and_jobs_on_one_target() {
        let p = Arc::new(Pipeline::new());
        p.orchestrator
            .apply_update(target_update("ibm-a", race_t1(1), 0.97, 1))
            .unwrap();

        // `started` moves before an update is routed, `routed` after, so
        // `routed <= lane position <= started` at every instant.
        let started = Arc::new(AtomicU64::new(1));
        let routed = Arc::new(AtomicU64::new(1));

        let updater = {
            let (p, started, routed) = (p.clone(), started.clone(), routed.clone());
            tokio::spawn(async move {
                for revision in 2..=RACE_UPDATES {
                    started.store(revision, Ordering::SeqCst);
                    p.orchestrator
                        .apply_update(target_update("ibm-a", race_t1(revision), 0.97, revision))
                        .unwrap();
                    routed.store(revision, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        let submitter = {
            let (p, started, routed) = (p.clone(), started.clone(), routed.clone());
            tokio::spawn(async move {
                let mut pending = Vec::with_capacity(RACE_JOBS);
                for i in 0..RACE_JOBS {
                    let at_least = routed.load(Ordering::SeqCst);
                    let ticket = p
                        .orchestrator
                        .submit(job(&format!("race-{i}"), "ibm-a", 10.0))
                        .unwrap();
                    let at_most = started.load(Ordering::SeqCst);
                    pending.push((ticket, at_least, at_most));
                    tokio::task::yield_now().await;
                }
                pending
            })
        };

        updater.await.unwrap();
        let pending = submitter.await.unwrap();
        assert_eq!(pending.len(), RACE_JOBS);

        for (ticket, at_least, at_most) in pending {
            let job_id = ticket.job_id().clone();
            let outcome = ticket.outcome().await.unwrap();
            assert_eq!(outcome.state(), JobState::Succeeded, "{job_id}");

            let revision = outcome.decision().unwrap().target_revision;
            assert!(revision >= at_least, "{job_id} missed update {at_least}, saw {revision}");
            assert!(revision <= at_most, "{job_id} saw update {revision} routed after it");

            // The verdict was computed on the same snapshot.
            let margin = outcome.verdict().unwrap().margin;
            assert!((margin - 10e-6 / race_t1(revision)).abs() < 1e-12, "{job_id}");
        }

        p.orchestrator.shutdown().await;
        let target = p.orchestrator.snapshot(&TargetId::new("ibm-a")).unwrap();
        assert_eq!(target.revision, RACE_UPDATES);
        assert_eq!(p.orchestrator.records().len(), RACE_JOBS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_duplicate_submissions() {
        let p = Arc::new(Pipeline::new());
        p.orchestrator
            .apply_update(target_update("ibm-a", 100e-6, 0.97, 1))
            .unwrap();

        // Eight submitters race on the same 50 ids.
        let submitters: Vec<_> = (0..8)
            .map(|_| {
                let p = p.clone();
                tokio::spawn(async move {
                    let mut accepted = Vec::new();
                    for i in 0..50 {
                        match p.orchestrator.submit(job(&format!("job-{i}"), "ibm-a", 10.0)) {
                            Ok(ticket) => accepted.push(ticket),
                            Err(DispatchError::DuplicateJob(_)) => {}
                            Err(e) => panic!("unexpected error {e}"),
                        }
                    }
                    accepted
                })
            })
            .collect();

        let mut tickets = Vec::new();
        for submitter in join_all(submitters).await {
            tickets.extend(submitter.unwrap());
        }
        assert_eq!(tickets.len(), 50);

        for ticket in tickets {
            assert_eq!(ticket.outcome().await.unwrap().state(), JobState::Succeeded);
        }
        p.orchestrator.shutdown().await;

        assert_eq!(p.adapter.calls(), 50);
        assert_eq!(p.orchestrator.records().len(), 50);
        for i in 0..50 {
            let history = p
                .orchestrator
                .transitions(&JobId::new(format!("job-{i}")))
                .unwrap();
            assert_eq!(history.iter().filter(|t| t.to.is_terminal()).count(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_target_does_not_block_others() {
        let p = Arc::new(Pipeline::with(
            EchoAdapter::with_delay(Duration::from_millis(50)),
            OrchestratorConfig::default(),
        ));
        for target in ["slow", "fast"] {
            p.orchestrator
                .apply_update(target_update(target, 100e-6, 0.97, 1))
                .unwrap();
        }

        // Dispatch runs off the lane, so queued jobs on one target are
        // decided while earlier ones are still at the adapter.
        let slow: Vec<_> = (0..20)
            .map(|i| {
                p.orchestrator
                    .submit(job(&format!("slow-{i}"), "slow", 10.0))
                    .unwrap()
            })
            .collect();
        let fast = p.orchestrator.submit(job("fast-0", "fast", 10.0)).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(1), fast.outcome())
            .await
            .expect("fast target stalled")
            .unwrap();
        assert_eq!(outcome.state(), JobState::Succeeded);

        for ticket in slow {
            assert_eq!(ticket.outcome().await.unwrap().state(), JobState::Succeeded);
        }
    }
}

//! # Quantum-Sentinel Dispatch Benchmarks
//!
//! | Stage | Expectation |
//! |-------|-------------|
//! | qs-01 capability update / snapshot | well under 10 µs |
//! | qs-02 strategy selection | pure table lookup |
//! | qs-03 admission check | pure arithmetic |
//! | qs-04 submit to outcome | dominated by task hand-offs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qs_01_capability_store::{CapabilityStore, CapabilityStoreApi};
use qs_02_strategy_inference::{select_strategy, InferenceConfig};
use qs_03_coherence_verifier::evaluate;
use qs_04_dispatch_orchestrator::DispatchApi;
use qs_tests::fixtures::{job, target_update, Pipeline};
use rand::Rng;
use shared_types::{ExecutionTarget, JobClass, JobId, TargetId};
use std::time::Duration;

// ============================================================================
// QS-01: Capability Store
// ============================================================================

fn bench_capability_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("qs-01-capability-store");

    for targets in [1usize, 16, 256] {
        let store = CapabilityStore::new();
        let ids: Vec<String> = (0..targets).map(|i| format!("qpu-{i}")).collect();
        for id in &ids {
            store.update(target_update(id, 100e-6, 0.97, 0)).unwrap();
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("update", targets), &ids, |b, ids| {
            let mut rng = rand::thread_rng();
            let mut ts = 1u64;
            b.iter(|| {
                let id = &ids[rng.gen_range(0..ids.len())];
                ts += 1;
                black_box(store.update(target_update(id, 100e-6, rng.gen_range(0.9..1.0), ts)))
            })
        });

        let probe = TargetId::new(ids[ids.len() / 2].clone());
        group.bench_with_input(BenchmarkId::new("snapshot", targets), &probe, |b, id| {
            b.iter(|| black_box(store.snapshot(id)))
        });
    }

    group.finish();
}

// ============================================================================
// QS-02 / QS-03: Decision Functions
// ============================================================================

fn bench_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("qs-02-03-decisions");
    let config = InferenceConfig::default();
    let target = ExecutionTarget {
        id: TargetId::new("ibm-a"),
        coherence_time: 100e-6,
        gate_fidelity: 0.97,
        queue_depth: 0,
        last_updated: 0,
        revision: 1,
        timestamp_regressed: false,
    };
    let job_id = JobId::new("job-bench");

    group.bench_function("select_strategy", |b| {
        b.iter(|| {
            black_box(select_strategy(
                &job_id,
                Some(black_box(&target)),
                JobClass::Pricing,
                &config,
            ))
        })
    });

    group.bench_function("evaluate_margin", |b| {
        b.iter(|| black_box(evaluate(black_box(40e-6), black_box(100e-6), 0.5)))
    });

    group.finish();
}

// ============================================================================
// QS-04: Submit to Outcome
// ============================================================================

fn bench_orchestrator(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("qs-04-dispatch");
    group.measurement_time(Duration::from_secs(10));

    for batch in [1usize, 64] {
        let pipeline = runtime.block_on(async {
            let p = Pipeline::new();
            p.orchestrator.apply_update(target_update("ibm-a", 100e-6, 0.97, 1)).unwrap();
            p
        });
        let mut next = 0u64;

        group.throughput(Throughput::Elements(batch as u64));
        group.bench_function(BenchmarkId::new("submit_to_outcome", batch), |b| {
            b.to_async(&runtime).iter(|| {
                let tickets: Vec<_> = (0..batch)
                    .map(|_| {
                        next += 1;
                        pipeline
                            .orchestrator
                            .submit(job(&format!("bench-{next}"), "ibm-a", 10.0))
                            .unwrap()
                    })
                    .collect();
                async move {
                    for ticket in tickets {
                        black_box(ticket.outcome().await.unwrap());
                    }
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_capability_store,
    bench_decisions,
    bench_orchestrator
);
criterion_main!(benches);

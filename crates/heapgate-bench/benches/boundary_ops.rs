//! Criterion micro-benchmarks for boundary allocate, release, and scratch-stack operations.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use heapgate_bench::{churn, system_boundary, workload_sizes};
use heapgate_core::{Boundary, Handle, SystemAllocator};
use heapgate_test_utils::MockAllocator;

/// Benchmark: one allocate + deallocate pair through the system allocator.
fn bench_alloc_free_pair(c: &mut Criterion) {
    let mut boundary = system_boundary();
    c.bench_function("alloc_free_pair_64b", |b| {
        b.iter(|| {
            let h = boundary.allocate(black_box(64));
            boundary.deallocate(h);
        });
    });
}

/// Benchmark: allocate 1K mixed sizes, release them in reverse.
fn bench_churn_1k(c: &mut Criterion) {
    let mut boundary = system_boundary();
    let sizes = workload_sizes(1_000, 0);
    c.bench_function("churn_1k_mixed", |b| {
        b.iter(|| black_box(churn(&mut boundary, &sizes)));
    });
}

/// Benchmark: release with 10K other handles live, so the live-index
/// lookup runs against a populated table.
fn bench_release_under_load(c: &mut Criterion) {
    let mut boundary = system_boundary();
    let background: Vec<Handle> = workload_sizes(10_000, 5)
        .into_iter()
        .map(|size| boundary.allocate(size))
        .collect();

    c.bench_function("release_with_10k_live", |b| {
        b.iter(|| {
            let h = boundary.allocate(32);
            boundary.deallocate(black_box(h));
        });
    });

    for h in background {
        boundary.deallocate(h);
    }
}

/// Benchmark: rejected release of a never-issued handle. The host is not
/// touched, so this isolates the validation cost.
fn bench_rejected_release(c: &mut Criterion) {
    let mut boundary = system_boundary();
    let live = boundary.allocate(64);
    let interior = Handle(live.raw() + 8);
    c.bench_function("rejected_release", |b| {
        b.iter(|| black_box(boundary.try_deallocate(black_box(interior))).is_err());
    });
    boundary.deallocate(live);
}

/// Benchmark: boundary overhead over the mock host, which does no real
/// memory work.
fn bench_mock_host_pair(c: &mut Criterion) {
    c.bench_function("mock_host_churn_256", |b| {
        b.iter_batched(
            || Boundary::new(MockAllocator::new()),
            |mut boundary| black_box(churn(&mut boundary, &workload_sizes(256, 1))),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: push 16 scratch frames, then rewind to the saved pointer.
fn bench_scratch_frames(c: &mut Criterion) {
    let mut boundary: Boundary<SystemAllocator> = system_boundary();
    let base = match boundary.stack_save() {
        Ok(sp) => sp,
        Err(e) => panic!("scratch stack unavailable: {e}"),
    };
    c.bench_function("scratch_16_frames", |b| {
        b.iter(|| {
            for size in 1..=16usize {
                black_box(boundary.stack_alloc(size * 24).ok());
            }
            let restored = boundary.stack_restore(base);
            black_box(restored.is_ok());
        });
    });
}

criterion_group!(
    benches,
    bench_alloc_free_pair,
    bench_churn_1k,
    bench_release_under_load,
    bench_rejected_release,
    bench_mock_host_pair,
    bench_scratch_frames
);
criterion_main!(benches);

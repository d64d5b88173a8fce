//! Benchmarks one iteration of the scripted workload per backend.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fitalloc::{Allocator, Backend, Workload};

fn bench_workload(
  c: &mut Criterion,
) {
  let workload = Workload::default();
  let mut allocator = Allocator::new();
  let mut group = c.benchmark_group("workload");

  for backend in workload.backends() {
    group.bench_function(BenchmarkId::from_parameter(backend), |b| {
      b.iter_custom(|iters| {
        (0..iters)
          .map(|_| match backend {
            Backend::Pool(mode) => workload.run_pool_once(&mut allocator, mode),
            Backend::System => workload.run_system_once(),
          })
          .sum::<Result<_, _>>()
          .unwrap_or_else(|e| panic!("{backend} workload failed: {e}"))
      })
    });
  }

  group.finish();
}

fn bench_fragmented_search(
  c: &mut Criterion,
) {
  let mut group = c.benchmark_group("fragmented_search");

  for mode in fitalloc::SearchMode::ALL {
    let mut allocator = Allocator::new();
    allocator.init(64 * 1024, mode).unwrap();

    // Alternate 8- and 24-byte blocks, then free the large ones.
    let handles: Vec<_> = (0..2000)
      .map(|i| allocator.allocate(if i % 2 == 0 { 8 } else { 24 }))
      .collect();
    for handle in handles.iter().skip(1).step_by(2) {
      allocator.free(*handle);
    }

    group.bench_function(BenchmarkId::from_parameter(mode), |b| {
      b.iter(|| {
        let handle = allocator.allocate(16);
        allocator.free(handle);
      })
    });
  }

  group.finish();
}

criterion_group!(benches, bench_workload, bench_fragmented_search);
criterion_main!(benches);

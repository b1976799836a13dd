use std::{
  hint::black_box,
  thread,
};

use criterion::{
  BenchmarkId,
  Criterion,
  criterion_group,
  criterion_main,
};
use kralloc::prelude::*;

fn bench_cache_hit(c: &mut Criterion) {
  let mut group = c.benchmark_group("cache_hit");

  for size in [32, 128, 512] {
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &sz| {
      let cache = SharedFreeList::new(&PAGES, Bounds::exact(sz)).unwrap();
      let warm = cache.allocate(sz).unwrap();
      unsafe { cache.deallocate(warm) };

      b.iter(|| {
        let block = cache.allocate(black_box(sz)).unwrap();
        unsafe { cache.deallocate(black_box(block)) };
      });
    });
  }

  group.finish();
}

fn bench_cache_vs_region(c: &mut Criterion) {
  let mut group = c.benchmark_group("cache_vs_locked_region");
  let region = Locked::new(KrRegion::with_parent(&PAGES, 1 << 20).unwrap());

  group.bench_function("locked_region", |b| {
    b.iter(|| {
      let block = region.allocate(black_box(64)).unwrap();
      unsafe { region.deallocate(block) };
    });
  });

  let cache = SharedFreeList::new(&region, Bounds::exact(64)).unwrap();
  group.bench_function("cache", |b| {
    b.iter(|| {
      let block = cache.allocate(black_box(64)).unwrap();
      unsafe { cache.deallocate(block) };
    });
  });

  group.finish();
}

fn bench_contended(c: &mut Criterion) {
  let mut group = c.benchmark_group("cache_contended");

  for threads in [2, 4, 8] {
    group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &n| {
      let cache = SharedFreeList::new(&PAGES, Bounds::exact(64)).unwrap();

      b.iter(|| {
        thread::scope(|s| {
          for _ in 0..n {
            s.spawn(|| {
              for _ in 0..1_000 {
                let block = cache.allocate(64).unwrap();
                unsafe { cache.deallocate(black_box(block)) };
              }
            });
          }
        });
      });
    });
  }

  group.finish();
}

criterion_group!(
  benches,
  bench_cache_hit,
  bench_cache_vs_region,
  bench_contended,
);
criterion_main!(benches);

use std::hint::black_box;

use criterion::{
  BatchSize,
  BenchmarkId,
  Criterion,
  criterion_group,
  criterion_main,
};
use kralloc::prelude::*;
use rand::{
  rng,
  seq::SliceRandom,
};

const ARENA: usize = 1 << 20;

fn arena() -> Vec<usize> {
  vec![0usize; ARENA / size_of::<usize>()]
}

fn bytes(storage: &mut [usize]) -> &mut [u8] {
  unsafe { std::slice::from_raw_parts_mut(storage.as_mut_ptr().cast::<u8>(), ARENA) }
}

fn bench_region_bump(c: &mut Criterion) {
  let mut group = c.benchmark_group("region_bump");

  for size in [16, 64, 256] {
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &sz| {
      let mut storage = arena();
      let region = KrRegion::new(bytes(&mut storage));

      b.iter(|| {
        match region.allocate(black_box(sz)) {
          Some(block) => {
            black_box(block);
          }
          None => {
            region.deallocate_all();
          }
        }
      });
    });
  }

  group.finish();
}

fn bench_free_list_pairs(c: &mut Criterion) {
  let mut group = c.benchmark_group("free_list_alloc_dealloc");

  for size in [16, 64, 256] {
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &sz| {
      let mut storage = arena();
      let region = KrRegion::new(bytes(&mut storage));
      region.switch_to_free_list();

      b.iter(|| {
        let block = region.allocate(black_box(sz)).unwrap();
        unsafe { region.deallocate(black_box(block)) };
      });
    });
  }

  group.finish();
}

fn bench_shuffled_frees(c: &mut Criterion) {
  let mut order: Vec<usize> = (0..1024).collect();
  order.shuffle(&mut rng());

  c.bench_function("region_shuffled_frees_1k", |b| {
    let mut storage = arena();
    let region = KrRegion::new(bytes(&mut storage));
    region.switch_to_free_list();

    b.iter_batched(
      || (0..1024).map(|_| region.allocate(64).unwrap()).collect::<Vec<_>>(),
      |blocks| {
        for &i in &order {
          unsafe { region.deallocate(blocks[i]) };
        }
      },
      BatchSize::PerIteration,
    );
  });
}

fn bench_reverse_frees(c: &mut Criterion) {
  c.bench_function("region_reverse_frees_1k", |b| {
    let mut storage = arena();
    let region = KrRegion::new(bytes(&mut storage));
    region.switch_to_free_list();

    b.iter_batched(
      || (0..1024).map(|_| region.allocate(64).unwrap()).collect::<Vec<_>>(),
      |blocks| {
        for block in blocks.into_iter().rev() {
          unsafe { region.deallocate(block) };
        }
      },
      BatchSize::PerIteration,
    );
  });
}

fn bench_switch(c: &mut Criterion) {
  c.bench_function("region_switch_1k_parked", |b| {
    let mut order: Vec<usize> = (0..1024).collect();
    order.shuffle(&mut rng());
    let mut storage = arena();
    let base = storage.as_mut_ptr().cast::<u8>();

    b.iter_batched(
      || {
        let region = KrRegion::new(unsafe { std::slice::from_raw_parts_mut(base, ARENA) });
        let blocks: Vec<_> = (0..1024).map(|_| region.allocate(64).unwrap()).collect();
        for &i in &order {
          unsafe { region.deallocate(blocks[i]) };
        }
        region
      },
      |region| {
        region.switch_to_free_list();
        black_box(region.stats());
      },
      BatchSize::PerIteration,
    );
  });
}

criterion_group!(
  benches,
  bench_region_bump,
  bench_free_list_pairs,
  bench_shuffled_frees,
  bench_reverse_frees,
  bench_switch,
);
criterion_main!(benches);

//! Benchmarks for the density estimators.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use posterior_plots::kde::{kde_1d, kde_2d, Kde2dOptions, KdeOptions};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn sample(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

fn kde_1d_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("kde_1d");
    let options = KdeOptions::default();

    for size in [100, 1_000, 10_000, 100_000] {
        let data = sample(size, 42);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| kde_1d(black_box(&data), &options).unwrap());
        });
    }

    group.finish();
}

fn kde_2d_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("kde_2d");
    let options = Kde2dOptions::default();

    for size in [100, 1_000, 10_000] {
        let x = sample(size, 1);
        let y = sample(size, 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| kde_2d(black_box(&x), black_box(&y), &options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, kde_1d_benchmark, kde_2d_benchmark);
criterion_main!(benches);

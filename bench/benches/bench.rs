#[macro_use]
extern crate criterion;
use criterion::{BenchmarkId, Criterion};
use prime_sieve::{GrowthConfig, PrimeTable, Primes, Sieve};
use rand::Rng;

pub fn bench_sieve_new(c: &mut Criterion) {
    let mut group = c.benchmark_group("sieve_new");

    for limit in [1u64 << 16, 1 << 20, 1 << 24] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| Sieve::new(limit).map(|s| s.upper_bound()))
        });
    }

    group.finish();
}

pub fn bench_is_prime(c: &mut Criterion) {
    const N: u64 = 1 << 24;
    let sieve = Sieve::new(N).unwrap();
    let mut rng = rand::thread_rng();
    let queries: Vec<u64> = (0..10_000).map(|_| rng.gen_range(0..N)).collect();

    c.bench_function("is_prime (random queries)", |b| {
        b.iter(|| {
            queries
                .iter()
                .filter(|&&n| sieve.is_prime(n).unwrap_or(false))
                .count()
        })
    });
}

pub fn bench_generator(c: &mut Criterion) {
    const COUNT: usize = 100_000;
    let mut group = c.benchmark_group("primes_next");

    group.bench_function("default growth", |b| {
        b.iter(|| Primes::new().take(COUNT).last())
    });
    group.bench_function("small growth", |b| {
        b.iter(|| Primes::with_config(GrowthConfig::small()).take(COUNT).last())
    });

    group.finish();
}

criterion_group!(benches, bench_sieve_new, bench_is_prime, bench_generator);
criterion_main!(benches);

//! Criterion benches for the generators and one optimizer pass each.
//!
//! - generators: incremental, convex hull, onion on uniform points (200, 1000).
//! - optimizers: local search (chain 2), annealing (global, 2000 steps),
//!   ant colony (small colony) on 100 points.
//!
//! Results live under `target/criterion`.

use areapoly::prelude::*;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use nalgebra::vector;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn uniform(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| vector![rng.gen_range(0.0..10_000.0), rng.gen_range(0.0..10_000.0)])
        .collect()
}

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(10);
    for n in [200usize, 1000] {
        let points = uniform(n, 7);
        for kind in [GeneratorKind::Incremental, GeneratorKind::ConvexHull, GeneratorKind::Onion] {
            let cfg = GeneratorCfg {
                kind,
                ..GeneratorCfg::default()
            };
            group.bench_with_input(BenchmarkId::new(kind.name(), n), &points, |b, pts| {
                b.iter(|| generate_polygon(pts, &cfg, 1).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_optimizers(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");
    group.sample_size(10);
    let points = uniform(100, 11);
    let hull = convex_hull_area(&points);
    let initial = generate_polygon(&points, &GeneratorCfg::default(), 3).unwrap();
    let cfgs = [
        OptimizerCfg::LocalSearch(LocalSearch {
            max_chain: 2,
            ..LocalSearch::default()
        }),
        OptimizerCfg::SimulatedAnnealing(SimulatedAnnealing {
            cooling_steps: 2000,
            mode: AnnealingMode::Global,
            ..SimulatedAnnealing::default()
        }),
        OptimizerCfg::AntColony(AntColony {
            colony_size: 4,
            iterations: 5,
            ..AntColony::default()
        }),
    ];
    for cfg in &cfgs {
        group.bench_function(BenchmarkId::new(cfg.name(), 100), |b| {
            b.iter_batched(
                || initial.clone(),
                |poly| optimize_polygon(&poly, hull, cfg).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generators, bench_optimizers);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use g25mix::nearest::nearest_populations;
use g25mix::{AncestrySolver, G25_DIM, ReferencePopulation, SolverConfig};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_catalog(size: usize) -> (Array1<f64>, Vec<ReferencePopulation>) {
    let mut rng = StdRng::seed_from_u64(0x625E_ED + size as u64);
    let populations = (0..size)
        .map(|i| {
            let coordinates = Array1::from_shape_fn(G25_DIM, |_| rng.gen_range(-0.1..0.1));
            ReferencePopulation::new(format!("Pop{i}"), coordinates, "Bench")
        })
        .collect();
    let target = Array1::from_shape_fn(G25_DIM, |_| rng.gen_range(-0.1..0.1));
    (target, populations)
}

fn benchmark_solve(c: &mut Criterion) {
    let sizes = [10_usize, 100, 500];
    let catalogs: Vec<_> = sizes
        .iter()
        .map(|&size| (size, random_catalog(size)))
        .collect();
    // A fixed step count keeps the measured work identical across runs.
    let solver = AncestrySolver::new(SolverConfig {
        max_iterations: 1_000,
        convergence_threshold: 0.0,
        ..SolverConfig::default()
    });

    let mut group = c.benchmark_group("solve");
    for (size, (target, populations)) in catalogs.iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(
            BenchmarkId::new("projected_gradient", size),
            populations,
            |b, input| {
                b.iter(|| {
                    let outcome = solver.solve(black_box(target.view()), black_box(input));
                    black_box(outcome.map(|o| o.distance).unwrap_or(f64::NAN));
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("nearest", size), populations, |b, input| {
            b.iter(|| {
                let neighbors = nearest_populations(black_box(target.view()), black_box(input), 10);
                black_box(neighbors.map(|n| n.len()).unwrap_or(0));
            });
        });
    }
    group.finish();
}

criterion_group!(solve_benchmark, benchmark_solve);
criterion_main!(solve_benchmark);

use std::time::Instant;

use barrier_life::{BarrierLife, EngineConfig, Grid};

const DENSITY: f64 = 0.5;
const SEED: u64 = 0x5EED_1234_ABCD_EF01;

fn bench_sequential(size: usize, iterations: u64) -> (f64, u64) {
    let mut grid = Grid::random_seeded(size, DENSITY, SEED);
    let start = Instant::now();
    grid.step_n(iterations);
    (start.elapsed().as_secs_f64() * 1000.0, grid.population())
}

fn bench_rayon(size: usize, iterations: u64) -> (f64, u64) {
    let mut grid = Grid::random_seeded(size, DENSITY, SEED);
    let start = Instant::now();
    grid.step_par_n(iterations);
    (start.elapsed().as_secs_f64() * 1000.0, grid.population())
}

fn bench_barrier(size: usize, workers: usize, iterations: u64) -> (f64, u64) {
    let config = EngineConfig::new(size)
        .worker_count(workers)
        .seed(Grid::random_seeded(size, DENSITY, SEED));
    let mut engine = BarrierLife::initialize(config).expect("failed to start engine");

    let start = Instant::now();
    let pop = engine
        .step_n(iterations)
        .expect("barrier round failed")
        .population();
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    engine.shutdown().expect("failed to stop engine");
    (total_ms, pop)
}

fn main() {
    let scales: &[(usize, u64)] = &[
        (256, 400),
        (512, 200),
        (1000, 100),
        (2048, 40),
    ];
    let workers = [1usize, 2, 4, 8];

    println!(
        "{:<12} {:>10} {:>8} {:>12} {:>10} {:>10}",
        "Grid", "Engine", "Iters", "Total(ms)", "Avg(ms)", "Pop"
    );
    println!("{}", "-".repeat(68));

    for &(size, iters) in scales {
        let label = format!("{size}x{size}");
        let mut rows: Vec<(String, f64, u64)> = Vec::new();

        let (ms, pop) = bench_sequential(size, iters);
        rows.push(("seq".to_owned(), ms, pop));
        let (ms, pop) = bench_rayon(size, iters);
        rows.push(("rayon".to_owned(), ms, pop));
        for &k in workers.iter().filter(|&&k| size % k == 0) {
            let (ms, pop) = bench_barrier(size, k, iters);
            rows.push((format!("barrier{k}"), ms, pop));
        }

        let reference_pop = rows[0].2;
        for (engine, total_ms, pop) in rows {
            let avg_ms = total_ms / iters as f64;
            let flag = if pop == reference_pop { "" } else { "  MISMATCH" };
            println!(
                "{:<12} {:>10} {:>8} {:>12.1} {:>10.4} {:>10}{flag}",
                label, engine, iters, total_ms, avg_ms, pop
            );
        }
    }
}

#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use barrier_life::{BarrierLife, EngineConfig, EngineError, Grid, SeedPolicy};
use tracing::{error, info};

const DEFAULT_SIZE: usize = 1000;
const DEFAULT_WORKERS: usize = 5;
const DEFAULT_STEPS: u64 = 500;
const CHECK_INTERVAL: u64 = 100;
const LIVE_DENSITY: f64 = 0.5;

struct MainArgs {
    config: EngineConfig,
    steps: u64,
    verify: bool,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut config = EngineConfig::new(DEFAULT_SIZE).worker_count(DEFAULT_WORKERS);
    let mut seed = None;
    let mut steps = DEFAULT_STEPS;
    let mut verify = false;
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--size" => {
                i += 1;
                config.grid_size = next_arg(i, "--size")
                    .parse()
                    .expect("--size requires a positive integer");
            }
            "--workers" => {
                i += 1;
                match next_arg(i, "--workers") {
                    "auto" => config.worker_count = None,
                    n => {
                        config.worker_count = Some(
                            n.parse()
                                .expect("--workers requires a positive integer or `auto`"),
                        );
                    }
                }
            }
            "--steps" => {
                i += 1;
                steps = next_arg(i, "--steps")
                    .parse()
                    .expect("--steps requires a non-negative integer");
            }
            "--seed" => {
                i += 1;
                seed = Some(
                    next_arg(i, "--seed")
                        .parse()
                        .expect("--seed requires an unsigned integer"),
                );
            }
            "--timeout-ms" => {
                i += 1;
                let ms: u64 = next_arg(i, "--timeout-ms")
                    .parse()
                    .expect("--timeout-ms requires an unsigned integer");
                config = config.step_timeout(Duration::from_millis(ms));
            }
            "--verify" => {
                verify = true;
            }
            other => panic!(
                "unknown argument: {other}\nusage: barrier-life [--size N] [--workers K|auto] [--steps S] [--seed X] [--timeout-ms T] [--verify]"
            ),
        }
        i += 1;
    }
    config = config.seed(SeedPolicy::Random {
        seed,
        density: LIVE_DENSITY,
    });
    MainArgs {
        config,
        steps,
        verify,
    }
}

fn run(args: MainArgs) -> Result<(), EngineError> {
    // Verification needs the seed plane up front, so fix it before starting.
    let mut reference: Option<(Grid, u64)> = None;
    let mut config = args.config;
    if args.verify {
        let seed = match config.seed {
            SeedPolicy::Random { seed, density } => Grid::random_seeded(
                config.grid_size,
                density,
                seed.unwrap_or(0x5EED_1234_ABCD_EF01),
            ),
            _ => Grid::new(config.grid_size),
        };
        config = config.seed(seed.clone());
        reference = Some((seed, 0u64));
    }

    let mut engine = BarrierLife::initialize(config)?;
    info!(
        size = engine.size(),
        workers = engine.worker_count(),
        population = engine.view().population(),
        "seeded"
    );

    let mut total = Duration::ZERO;
    let mut phase = Duration::ZERO;
    for iteration in 1..=args.steps {
        let start = Instant::now();
        let view = engine.step()?;
        let elapsed = start.elapsed();
        total += elapsed;
        phase += elapsed;

        if iteration % CHECK_INTERVAL == 0 || iteration == args.steps {
            let population = view.population();
            let phase_ms = phase.as_secs_f64() * 1000.0;
            let status = match reference.as_mut() {
                Some((grid, generation)) => {
                    grid.step_par_n(view.generation() - *generation);
                    *generation = view.generation();
                    if grid.as_slice() == view.as_slice() { "MATCH" } else { "MISMATCH" }
                }
                None => "-",
            };
            println!(
                "Generation {}: population = {population}, {phase_ms:.3} ms since last report [{status}]",
                view.generation()
            );
            phase = Duration::ZERO;
        }
    }

    let total_ms = total.as_secs_f64() * 1000.0;
    let avg_ms = if args.steps > 0 { total_ms / args.steps as f64 } else { 0.0 };
    println!("\n--- Summary ({} generations) ---", args.steps);
    println!("BarrierLife: {total_ms:.3} ms total, {avg_ms:.6} ms/generation");

    engine.shutdown()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "barrier-life failed");
            ExitCode::FAILURE
        }
    }
}

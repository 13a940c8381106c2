use std::time::Duration;

use barrier_life::barrierlife::{FlagState, SyncError};
use barrier_life::{BarrierLife, EngineConfig, EngineError, Grid, SeedPolicy};

fn start(grid: Grid, workers: usize) -> BarrierLife {
    let size = grid.size();
    BarrierLife::initialize(EngineConfig::new(size).worker_count(workers).seed(grid)).unwrap()
}

fn assert_alive(engine: &BarrierLife, cells: &[(usize, usize)]) {
    let view = engine.view();
    for &(x, y) in cells {
        assert!(view.get(x, y), "expected alive at ({x},{y})");
    }
}

fn assert_dead(engine: &BarrierLife, cells: &[(usize, usize)]) {
    let view = engine.view();
    for &(x, y) in cells {
        assert!(!view.get(x, y), "expected dead at ({x},{y})");
    }
}

#[test]
fn three_by_three_plus_dies_out() {
    // On a 3x3 torus every cell neighbors all 8 others: live cells see 4,
    // dead cells see 5, so everything dies.
    let seed = Grid::from_rows(&[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]]);
    let mut engine = start(seed, 3);

    let view = engine.step().unwrap();
    assert_eq!(view.generation(), 1);
    assert_eq!(view.row(0), &[0, 0, 0]);
    assert_eq!(view.row(1), &[0, 0, 0]);
    assert_eq!(view.row(2), &[0, 0, 0]);
}

#[test]
fn blinker_oscillates_across_band_boundary() {
    let mut seed = Grid::new(6);
    for x in 1..=3 {
        seed.set(x, 2, true);
    }
    // Three bands of two rows: the blinker straddles bands 0, 1 and 2.
    let mut engine = start(seed, 3);

    engine.step().unwrap();
    assert_alive(&engine, &[(2, 1), (2, 2), (2, 3)]);
    assert_dead(&engine, &[(1, 2), (3, 2)]);

    engine.step().unwrap();
    assert_alive(&engine, &[(1, 2), (2, 2), (3, 2)]);
    assert_dead(&engine, &[(2, 1), (2, 3)]);
}

#[test]
fn blinker_wraps_across_top_and_bottom_edge() {
    let mut seed = Grid::new(8);
    seed.set(4, 7, true);
    seed.set(4, 0, true);
    seed.set(4, 1, true);
    let mut engine = start(seed, 4);

    engine.step().unwrap();
    assert_alive(&engine, &[(3, 0), (4, 0), (5, 0)]);
    assert_dead(&engine, &[(4, 7), (4, 1)]);
}

#[test]
fn glider_returns_home_on_torus() {
    let mut seed = Grid::new(16);
    for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
        seed.set(x, y, true);
    }
    let mut engine = start(seed.clone(), 4);

    // Diagonal period 4, one cell per period: back home after 4 * 16 generations.
    let view = engine.step_n(64).unwrap();
    assert_eq!(view.generation(), 64);
    assert_eq!(view.population(), 5);
    assert_eq!(view.to_grid(), seed);
}

#[test]
fn view_before_stepping_is_the_seed() {
    let seed = Grid::random_seeded(20, 0.5, 99);
    let engine = start(seed.clone(), 5);
    let view = engine.view();
    assert_eq!(view.generation(), 0);
    assert_eq!(view.size(), 20);
    assert_eq!(view.as_slice(), seed.as_slice());
    assert_eq!(view.population(), seed.population());
}

#[test]
fn empty_seed_stays_empty() {
    let config = EngineConfig::new(16).worker_count(2).seed(SeedPolicy::Empty);
    let mut engine = BarrierLife::initialize(config).unwrap();
    let view = engine.step_n(3).unwrap();
    assert_eq!(view.generation(), 3);
    assert_eq!(view.population(), 0);
}

#[test]
fn default_seed_is_roughly_half_alive() {
    let mut engine = BarrierLife::initialize(EngineConfig::new(128).worker_count(4)).unwrap();
    let population = engine.view().population();
    let cells = 128u64 * 128;
    assert!(
        population > cells * 4 / 10 && population < cells * 6 / 10,
        "population {population} of {cells}"
    );
    engine.step().unwrap();
}

#[test]
fn auto_worker_count_divides_grid() {
    let engine = BarrierLife::initialize(EngineConfig::new(60).seed(SeedPolicy::Empty)).unwrap();
    assert!(engine.worker_count() >= 1);
    assert_eq!(60 % engine.worker_count(), 0);
    assert_eq!(engine.plan().len(), engine.worker_count());
}

#[test]
fn configuration_errors_fail_fast() {
    let cases = [
        (EngineConfig::new(0).worker_count(1), "zero size"),
        (EngineConfig::new(8).worker_count(0), "zero workers"),
        (EngineConfig::new(4).worker_count(8), "too many workers"),
        (EngineConfig::new(10).worker_count(3), "uneven"),
        (
            EngineConfig::new(4).worker_count(2).seed(SeedPolicy::Cells(vec![1; 3])),
            "seed size",
        ),
        (
            EngineConfig::new(4)
                .worker_count(2)
                .seed(SeedPolicy::Random { seed: Some(1), density: -0.1 }),
            "density",
        ),
    ];
    for (config, label) in cases {
        match BarrierLife::initialize(config) {
            Err(err) => assert!(err.is_config(), "{label}: unexpected error {err}"),
            Ok(_) => panic!("{label}: expected a configuration error"),
        }
    }
}

#[test]
fn uneven_partition_reports_shape() {
    let err = BarrierLife::initialize(EngineConfig::new(10).worker_count(4))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        EngineError::UnevenPartition { grid_size: 10, worker_count: 4 }
    ));
}

#[test]
fn flags_are_idle_between_steps() {
    let mut engine = start(Grid::random_seeded(32, 0.5, 5), 4);
    for _ in 0..5 {
        engine.step().unwrap();
        assert!(!engine.memory().round_in_flight());
        assert!(engine.memory().flags().iter().all(|f| f.state() == FlagState::Idle));
    }
}

#[test]
fn timeout_config_does_not_trip_healthy_workers() {
    let config = EngineConfig::new(64)
        .worker_count(4)
        .seed(Grid::random_seeded(64, 0.5, 1))
        .step_timeout(Duration::from_secs(10));
    let mut engine = BarrierLife::initialize(config).unwrap();
    assert_eq!(engine.step_n(10).unwrap().generation(), 10);
}

#[test]
fn explicit_shutdown_after_steps() {
    let mut engine = start(Grid::random_seeded(16, 0.5, 3), 4);
    assert_eq!(engine.memory().flags().len(), 4);
    engine.step_n(2).unwrap();
    engine.shutdown().unwrap();
}

#[test]
fn drop_without_shutdown_joins_threads() {
    for _ in 0..20 {
        let mut engine = start(Grid::random_seeded(16, 0.5, 8), 8);
        engine.step().unwrap();
    }
}

#[test]
fn dead_worker_halts_engine_and_keeps_last_generation() {
    let mut engine = start(Grid::random_seeded(16, 0.5, 11), 4);
    engine.step_n(2).unwrap();
    let before = engine.view().to_grid();

    // Same flag state a worker leaves behind when it unwinds.
    engine.memory().flag(2).abandon();

    let err = engine.step().unwrap_err();
    assert!(matches!(err, EngineError::Sync(SyncError::Abandoned { partition: 2 })));
    let err = engine.step().unwrap_err();
    assert!(matches!(err, EngineError::Halted(SyncError::Abandoned { partition: 2 })));
    assert!(!err.is_config());

    let view = engine.view();
    assert_eq!(view.generation(), 2);
    assert_eq!(view.to_grid(), before);
    engine.shutdown().unwrap();
}

#[test]
fn view_to_grid_copies_published_plane() {
    let seed = Grid::random_seeded(12, 0.4, 21);
    let mut engine = start(seed.clone(), 3);
    let mut reference = seed;
    reference.step_n(3);
    assert_eq!(engine.step_n(3).unwrap().to_grid(), reference);
}

#[test]
#[should_panic(expected = "outside a 4x4 grid")]
fn view_get_rejects_column_past_the_edge() {
    let engine = start(Grid::new(4), 2);
    engine.view().get(4, 0);
}

use std::collections::HashSet;

use barrier_life::Grid;
use barrier_life::barrierlife::PartitionPlan;
use barrier_life::barrierlife::rules::{ALIVE, DEAD, live_neighbors, neighbors_of, next_state};

#[test]
fn rule_table_all_eighteen_cases() {
    let table: [(u8, u8, u8); 18] = [
        (DEAD, 0, DEAD),
        (DEAD, 1, DEAD),
        (DEAD, 2, DEAD),
        (DEAD, 3, ALIVE),
        (DEAD, 4, DEAD),
        (DEAD, 5, DEAD),
        (DEAD, 6, DEAD),
        (DEAD, 7, DEAD),
        (DEAD, 8, DEAD),
        (ALIVE, 0, DEAD),
        (ALIVE, 1, DEAD),
        (ALIVE, 2, ALIVE),
        (ALIVE, 3, ALIVE),
        (ALIVE, 4, DEAD),
        (ALIVE, 5, DEAD),
        (ALIVE, 6, DEAD),
        (ALIVE, 7, DEAD),
        (ALIVE, 8, DEAD),
    ];
    for (current, count, expected) in table {
        assert_eq!(
            next_state(current, count),
            expected,
            "current={current} neighbors={count}"
        );
    }
}

#[test]
fn corner_neighbors_wrap_on_four_by_four() {
    let got: HashSet<(usize, usize)> = neighbors_of(0, 0, 4).into_iter().collect();
    let expected: HashSet<(usize, usize)> = [
        (3, 3),
        (3, 0),
        (0, 3),
        (1, 0),
        (0, 1),
        (3, 1),
        (1, 3),
        (1, 1),
    ]
    .into_iter()
    .collect();
    assert_eq!(got, expected);
}

#[test]
fn far_corner_counts_wrapped_neighbors() {
    // Only (0,0) is alive; it is a wrapped neighbor of (3,3).
    let mut grid = Grid::new(4);
    grid.set(0, 0, true);
    assert_eq!(live_neighbors(grid.as_slice(), 4, 3, 3), 1);
    assert_eq!(live_neighbors(grid.as_slice(), 4, 2, 2), 0);
}

#[test]
fn row_band_plan_covers_every_cell_once() {
    for size in 1..=48usize {
        for workers in (1..=size).filter(|k| size % k == 0) {
            let plan = PartitionPlan::row_bands(size, workers);
            assert_eq!(plan.len(), workers);

            let mut hits = vec![0u8; size * size];
            for p in plan.iter() {
                assert_eq!(p.rows().len(), size / workers, "N={size} K={workers}");
                for y in p.rows() {
                    for x in p.cols() {
                        hits[y * size + x] += 1;
                    }
                }
            }
            assert!(
                hits.iter().all(|&h| h == 1),
                "coverage broken for N={size} K={workers}"
            );
        }
    }
}

#[test]
fn uneven_plan_still_covers_every_cell_once() {
    for (size, workers) in [(10usize, 3usize), (7, 2), (9, 4), (13, 5)] {
        let plan = PartitionPlan::row_bands(size, workers);
        let mut hits = vec![0u8; size * size];
        for p in plan.iter() {
            for i in p.plane_range(size) {
                hits[i] += 1;
            }
        }
        assert!(hits.iter().all(|&h| h == 1), "N={size} K={workers}");
    }
}

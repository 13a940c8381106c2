//! Owned single-plane grid used for seeding and as the sequential reference.

use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::rules::{ALIVE, DEAD, advance_rows};

/// An `N * N` toroidal grid held in one row-major byte plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// All-dead grid.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![DEAD; size * size],
        }
    }

    /// Build from a row-major plane. Non-zero bytes are normalised to `ALIVE`.
    ///
    /// Returns `None` if `cells.len() != size * size`.
    pub fn from_cells(size: usize, cells: Vec<u8>) -> Option<Self> {
        if cells.len() != size * size {
            return None;
        }
        let mut cells = cells;
        for c in &mut cells {
            *c = (*c != DEAD) as u8;
        }
        Some(Self { size, cells })
    }

    /// Wrap a plane that already holds only `0`/`1` and is `size * size` long.
    pub(crate) fn from_plane(size: usize, cells: Vec<u8>) -> Self {
        debug_assert_eq!(cells.len(), size * size);
        debug_assert!(cells.iter().all(|&c| c == DEAD || c == ALIVE));
        Self { size, cells }
    }

    /// Build from rows of `0`/`1` values. Panics on ragged or non-square input.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let size = rows.len();
        let mut grid = Self::new(size);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), size, "row {y} has {} cells, expected {size}", row.len());
            for (x, &cell) in row.iter().enumerate() {
                grid.set(x, y, cell != DEAD);
            }
        }
        grid
    }

    /// Each cell independently alive with probability `density`.
    pub fn random<R: Rng>(size: usize, density: f64, rng: &mut R) -> Self {
        let cells = (0..size * size)
            .map(|_| rng.random_bool(density) as u8)
            .collect();
        Self { size, cells }
    }

    /// Deterministic random grid for a given seed.
    pub fn random_seeded(size: usize, density: f64, seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Self::random(size, density, &mut rng)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(x < self.size, "x = {x} is outside a {0}x{0} grid", self.size);
        self.cells[y * self.size + x] != DEAD
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        assert!(x < self.size, "x = {x} is outside a {0}x{0} grid", self.size);
        self.cells[y * self.size + x] = if alive { ALIVE } else { DEAD };
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<u8> {
        self.cells
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().filter(|&&c| c != DEAD).count() as u64
    }

    /// One generation, single-threaded: the whole torus as one partition.
    pub fn step(&mut self) {
        let mut next = vec![DEAD; self.cells.len()];
        advance_rows(&self.cells, &mut next, self.size, 0..self.size);
        self.cells = next;
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// One generation with rows spread over the rayon pool.
    pub fn step_par(&mut self) {
        let size = self.size;
        let current = &self.cells;
        let mut next = vec![DEAD; current.len()];
        next.par_chunks_mut(size)
            .enumerate()
            .for_each(|(y, row)| advance_rows(current, row, size, y..y + 1));
        self.cells = next;
    }

    pub fn step_par_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step_par();
        }
    }
}

//! B3/S23 rule and toroidal neighbor addressing.
//!
//! Planes are row-major `N * N` byte arrays: cell `(x, y)` lives at `y * N + x`.
//! Any non-zero byte counts as alive; the kernel only ever writes `0` or `1`.

use std::ops::Range;

pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 1;

/// Offsets of the 8 Moore neighbors, `(dx, dy)`.
#[rustfmt::skip]
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Next state of a single cell given its live-neighbor count.
#[inline(always)]
pub fn next_state(current: u8, neighbors: u8) -> u8 {
    debug_assert!(neighbors <= 8);
    (neighbors == 3 || (current != DEAD && neighbors == 2)) as u8
}

/// Wrap a possibly out-of-range coordinate onto `0..size`.
#[inline(always)]
pub fn wrap(coord: isize, size: usize) -> usize {
    coord.rem_euclid(size as isize) as usize
}

/// The 8 wrapped neighbor coordinates of `(x, y)`, in `NEIGHBOR_OFFSETS` order.
pub fn neighbors_of(x: usize, y: usize, size: usize) -> [(usize, usize); 8] {
    NEIGHBOR_OFFSETS.map(|(dx, dy)| {
        (
            wrap(x as isize + dx, size),
            wrap(y as isize + dy, size),
        )
    })
}

/// Live-neighbor count of `(x, y)` in `plane`.
#[inline]
pub fn live_neighbors(plane: &[u8], size: usize, x: usize, y: usize) -> u8 {
    neighbors_of(x, y, size)
        .iter()
        .map(|&(nx, ny)| (plane[ny * size + nx] != DEAD) as u8)
        .sum()
}

/// Advance rows `rows` of `current` into `next_rows`.
///
/// `next_rows` holds exactly those rows (`rows.len() * size` bytes), so a
/// worker can hand in the slice of the next plane it owns and nothing else.
/// `current` is the whole current plane; wrapping reads may land anywhere in it.
pub fn advance_rows(current: &[u8], next_rows: &mut [u8], size: usize, rows: Range<usize>) {
    debug_assert_eq!(current.len(), size * size);
    debug_assert_eq!(next_rows.len(), rows.len() * size);
    debug_assert!(rows.end <= size);
    if size == 0 {
        return;
    }

    let last = size - 1;
    for (out_row, y) in next_rows.chunks_exact_mut(size).zip(rows) {
        let north = &current[(if y == 0 { last } else { y - 1 }) * size..][..size];
        let here = &current[y * size..][..size];
        let south = &current[(if y == last { 0 } else { y + 1 }) * size..][..size];

        for (x, out) in out_row.iter_mut().enumerate() {
            let w = if x == 0 { last } else { x - 1 };
            let e = if x == last { 0 } else { x + 1 };
            let count = (north[w] != DEAD) as u8
                + (north[x] != DEAD) as u8
                + (north[e] != DEAD) as u8
                + (here[w] != DEAD) as u8
                + (here[e] != DEAD) as u8
                + (south[w] != DEAD) as u8
                + (south[x] != DEAD) as u8
                + (south[e] != DEAD) as u8;
            *out = next_state(here[x], count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ALIVE, DEAD, advance_rows, live_neighbors, next_state, wrap};

    #[test]
    fn next_state_covers_every_combination() {
        for current in [DEAD, ALIVE] {
            for count in 0u8..=8 {
                let expected = count == 3 || (current == ALIVE && count == 2);
                assert_eq!(
                    next_state(current, count),
                    expected as u8,
                    "current={current} count={count}"
                );
            }
        }
    }

    #[test]
    fn wrap_maps_both_edges() {
        assert_eq!(wrap(-1, 5), 4);
        assert_eq!(wrap(5, 5), 0);
        assert_eq!(wrap(2, 5), 2);
        assert_eq!(wrap(-6, 5), 4);
    }

    #[test]
    fn row_kernel_agrees_with_per_cell_count() {
        let size = 7;
        let plane: Vec<u8> = (0..size * size)
            .map(|i| ((i * 7 + i / 3) % 3 == 0) as u8)
            .collect();
        let mut next = vec![0u8; size * size];
        advance_rows(&plane, &mut next, size, 0..size);
        for y in 0..size {
            for x in 0..size {
                let expected = next_state(plane[y * size + x], live_neighbors(&plane, size, x, y));
                assert_eq!(next[y * size + x], expected, "({x},{y})");
            }
        }
    }

    #[test]
    fn row_kernel_writes_only_requested_rows() {
        let size = 4;
        let plane = vec![ALIVE; size * size];
        let mut band = vec![0xAAu8; 2 * size];
        advance_rows(&plane, &mut band, size, 1..3);
        // Every cell has 8 live neighbors on a full torus.
        assert!(band.iter().all(|&c| c == DEAD));
    }
}

//! Memory shared by the coordinator, every worker and the consumer.
//!
//! Two equally sized planes plus one `SyncFlag` per partition, allocated once
//! and never resized. Plane `generation % 2` is current; the other is next.
//! Only the coordinator advances `generation`, once per completed round.

use std::cell::UnsafeCell;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::rules::DEAD;
use super::sync::SyncFlag;

/// One full generation of cell values.
///
/// Interior-mutable so that workers can write disjoint row bands of the next
/// plane while everyone reads the current one.
pub struct GenerationPlane {
    cells: Box<[UnsafeCell<u8>]>,
}

// SAFETY: access is coordinated by the barrier protocol. A plane is either
// read-only (current) or written in disjoint ranges by distinct workers (next),
// never both within one round.
unsafe impl Sync for GenerationPlane {}

impl GenerationPlane {
    fn from_cells(cells: &[u8]) -> Self {
        Self {
            cells: cells.iter().map(|&c| UnsafeCell::new((c != DEAD) as u8)).collect(),
        }
    }

    fn zeroed(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| UnsafeCell::new(DEAD)).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// # Safety
    /// No thread may write to this plane while the returned slice is alive.
    #[inline]
    pub unsafe fn as_slice(&self) -> &[u8] {
        let ptr = UnsafeCell::raw_get(self.cells.as_ptr());
        unsafe { std::slice::from_raw_parts(ptr, self.cells.len()) }
    }

    /// # Safety
    /// `range` must not overlap any other live slice of this plane, and no
    /// thread may read this plane through `as_slice` while the result is alive.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn slice_mut(&self, range: Range<usize>) -> &mut [u8] {
        assert!(range.start <= range.end && range.end <= self.cells.len());
        unsafe {
            let ptr = UnsafeCell::raw_get(self.cells.as_ptr().add(range.start));
            std::slice::from_raw_parts_mut(ptr, range.len())
        }
    }
}

pub struct SharedGridMemory {
    size: usize,
    planes: [GenerationPlane; 2],
    flags: Box<[SyncFlag]>,
    /// Completed barrier rounds.
    generation: AtomicU64,
    /// Set from the first release of a round until its result is published.
    in_flight: AtomicBool,
}

impl SharedGridMemory {
    /// Allocate both planes and `workers` flags; `seed` becomes generation 0.
    pub fn new(size: usize, workers: usize, seed: &[u8]) -> Self {
        assert_eq!(seed.len(), size * size, "seed plane has the wrong size");
        Self {
            size,
            planes: [
                GenerationPlane::from_cells(seed),
                GenerationPlane::zeroed(size * size),
            ],
            flags: (0..workers).map(SyncFlag::new).collect(),
            generation: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    #[inline]
    pub fn flags(&self) -> &[SyncFlag] {
        &self.flags
    }

    #[inline]
    pub fn flag(&self, partition: usize) -> &SyncFlag {
        &self.flags[partition]
    }

    /// Physical plane index holding generation `generation`.
    #[inline(always)]
    pub fn plane_index(generation: u64) -> usize {
        (generation & 1) as usize
    }

    /// `(current, next)` planes for a round that starts from `generation`.
    #[inline]
    pub fn planes_for(&self, generation: u64) -> (&GenerationPlane, &GenerationPlane) {
        let cur = Self::plane_index(generation);
        (&self.planes[cur], &self.planes[cur ^ 1])
    }

    /// The authoritative plane.
    ///
    /// # Safety
    /// No round may be in flight for the lifetime of the slice.
    #[inline]
    pub unsafe fn current_cells(&self) -> &[u8] {
        debug_assert!(!self.round_in_flight());
        let (current, _) = self.planes_for(self.generation());
        unsafe { current.as_slice() }
    }

    #[inline]
    pub fn round_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn begin_round(&self) {
        self.in_flight.store(true, Ordering::Release);
    }

    /// Make `generation` current and close the round.
    pub(crate) fn publish(&self, generation: u64) {
        self.generation.store(generation, Ordering::Release);
        self.in_flight.store(false, Ordering::Release);
    }

    /// Close a failed round without publishing. The current plane was never
    /// written during the round, so it stays authoritative.
    pub(crate) fn abort_round(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    /// Close every flag so idle workers exit.
    pub(crate) fn close_all(&self) {
        for flag in self.flags.iter() {
            flag.close();
        }
    }
}

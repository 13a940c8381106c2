//! Static assignment of grid rows to workers.

use std::ops::Range;

/// Axis-aligned sub-rectangle `[min_x, max_x) x [min_y, max_y)` owned by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Partition {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Partition {
    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.min_y..self.max_y
    }

    #[inline]
    pub fn cols(&self) -> Range<usize> {
        self.min_x..self.max_x
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        (self.max_x - self.min_x) * (self.max_y - self.min_y)
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.cols().contains(&x) && self.rows().contains(&y)
    }

    /// Offset range of this partition inside a row-major plane.
    ///
    /// Only meaningful for full-width bands, which is all `PartitionPlan` produces.
    #[inline]
    pub fn plane_range(&self, size: usize) -> Range<usize> {
        debug_assert_eq!((self.min_x, self.max_x), (0, size));
        self.min_y * size..self.max_y * size
    }
}

/// Row-band partitioning of an `N * N` grid into `K` disjoint partitions.
///
/// Bands are `N / K` rows tall; the last band absorbs any remainder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionPlan {
    size: usize,
    partitions: Vec<Partition>,
}

impl PartitionPlan {
    /// Split `size` rows into `workers` contiguous full-width bands.
    ///
    /// Callers validate `0 < workers <= size`; `initialize` also rejects
    /// sizes not divisible by `workers`.
    pub fn row_bands(size: usize, workers: usize) -> Self {
        assert!(workers > 0, "partition plan needs at least one worker");
        assert!(workers <= size, "more workers ({workers}) than rows ({size})");

        let band = size / workers;
        let partitions = (0..workers)
            .map(|i| {
                let min_y = i * band;
                let max_y = if i + 1 == workers { size } else { min_y + band };
                Partition {
                    min_x: 0,
                    min_y,
                    max_x: size,
                    max_y,
                }
            })
            .collect();
        Self { size, partitions }
    }

    /// The whole grid as a single partition.
    pub fn single(size: usize) -> Self {
        Self::row_bands(size, 1)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Partition> {
        self.partitions.get(index)
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    /// Index of the partition owning `(x, y)`.
    pub fn owner_of(&self, x: usize, y: usize) -> Option<usize> {
        self.partitions.iter().position(|p| p.contains(x, y))
    }
}

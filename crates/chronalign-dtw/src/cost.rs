//! Accumulated-cost tables filled by the alignment recurrences.

use crate::distance::Real;
use crate::window::{Band, SearchWindow};

/// Read access to an accumulated-cost table, as consumed by backtracking.
///
/// Cell `(x, y)` pairs frame `x` of the first series with frame `y` of the
/// second. Cells that are out of range or were never filled read as
/// `+infinity`.
pub trait CostTable<T: Real> {
    /// Number of frames in the first series.
    fn len_x(&self) -> usize;

    /// Number of frames in the second series.
    fn len_y(&self) -> usize;

    /// Accumulated cost of cell `(x, y)`, or `+infinity` if absent.
    fn cost(&self, x: usize, y: usize) -> T;

    /// Accumulated cost of the final cell `(len_x - 1, len_y - 1)`.
    fn final_cost(&self) -> T {
        match (self.len_x().checked_sub(1), self.len_y().checked_sub(1)) {
            (Some(x), Some(y)) => self.cost(x, y),
            _ => T::infinity(),
        }
    }
}

/// Dense `len_x × len_y` cost table stored row-major by `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix<T> {
    len_x: usize,
    len_y: usize,
    cells: Vec<T>,
}

impl<T: Real> CostMatrix<T> {
    /// Allocate a table with every cell at `+infinity`.
    #[must_use]
    pub fn new(len_x: usize, len_y: usize) -> Self {
        Self {
            len_x,
            len_y,
            cells: vec![T::infinity(); len_x * len_y],
        }
    }

    #[inline]
    pub(crate) fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[x * self.len_y + y] = value;
    }
}

impl<T: Real> CostTable<T> for CostMatrix<T> {
    fn len_x(&self) -> usize {
        self.len_x
    }

    fn len_y(&self) -> usize {
        self.len_y
    }

    #[inline]
    fn cost(&self, x: usize, y: usize) -> T {
        if x < self.len_x && y < self.len_y {
            self.cells[x * self.len_y + y]
        } else {
            T::infinity()
        }
    }
}

/// Cost table holding storage only for the admissible cells of a [`SearchWindow`].
///
/// Each admissible column owns a contiguous run of the flat buffer, so memory
/// is proportional to the window size rather than `len_x × len_y`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedCostMatrix<T> {
    len_y: usize,
    columns: Vec<Option<(usize, Band)>>,
    cells: Vec<T>,
}

impl<T: Real> WindowedCostMatrix<T> {
    /// Allocate storage for every admissible cell of `window`, set to `+infinity`.
    #[must_use]
    pub fn new(window: &SearchWindow) -> Self {
        let mut columns = vec![None; window.len_x()];
        let mut offset = 0;
        for (col, band) in window.columns() {
            columns[col] = Some((offset, band));
            offset += band.len();
        }
        debug_assert_eq!(offset, window.size());
        Self {
            len_y: window.len_y(),
            columns,
            cells: vec![T::infinity(); offset],
        }
    }

    /// Return the number of stored cells.
    #[must_use]
    pub fn stored_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn slot(&self, x: usize, y: usize) -> Option<usize> {
        let (start, band) = self.columns.get(x).copied().flatten()?;
        band.contains(y).then(|| start + y - band.min)
    }

    #[inline]
    pub(crate) fn set(&mut self, x: usize, y: usize, value: T) {
        if let Some(i) = self.slot(x, y) {
            self.cells[i] = value;
        }
    }
}

impl<T: Real> CostTable<T> for WindowedCostMatrix<T> {
    fn len_x(&self) -> usize {
        self.columns.len()
    }

    fn len_y(&self) -> usize {
        self.len_y
    }

    #[inline]
    fn cost(&self, x: usize, y: usize) -> T {
        self.slot(x, y).map_or_else(T::infinity, |i| self.cells[i])
    }
}

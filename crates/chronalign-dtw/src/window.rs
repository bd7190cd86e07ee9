//! Search windows restricting which cost cells a windowed alignment may fill.
//!
//! A window stores, for every column (index into the first series), the
//! inclusive band of admissible rows (indices into the second series). Bands
//! only ever widen, and `size` always equals the number of admissible cells.

use tracing::{debug, instrument};

use crate::error::AlignError;
use crate::path::{WarpPath, WarpStep};

/// Fine cells covered per coarse cell along each axis.
const BLOCK: usize = 2;

/// Expansion directions as `(dx, dy)`, starting upper-left and sweeping clockwise.
const DIRECTIONS: [(isize, isize); 8] = [
    (-1, 1),
    (0, 1),
    (1, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Inclusive band of admissible rows in one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// Lowest admissible row.
    pub min: usize,
    /// Highest admissible row.
    pub max: usize,
}

impl Band {
    /// Return the number of rows in the band.
    #[must_use]
    pub fn len(&self) -> usize {
        self.max - self.min + 1
    }

    /// A band always holds at least one row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Return true if `row` lies inside the band.
    #[must_use]
    pub fn contains(&self, row: usize) -> bool {
        self.min <= row && row <= self.max
    }
}

/// Per-column admissible row bands over a `len_x × len_y` alignment grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchWindow {
    bands: Vec<Option<Band>>,
    len_y: usize,
    size: usize,
}

impl SearchWindow {
    /// Create a window with no admissible cells.
    #[must_use]
    pub fn new(len_x: usize, len_y: usize) -> Self {
        Self {
            bands: vec![None; len_x],
            len_y,
            size: 0,
        }
    }

    /// Create a window admitting every cell of the grid.
    #[must_use]
    pub fn full(len_x: usize, len_y: usize) -> Self {
        let mut window = Self::new(len_x, len_y);
        if len_y > 0 {
            for col in 0..len_x {
                window.mark_visited(col, 0);
                window.mark_visited(col, len_y - 1);
            }
        }
        window
    }

    /// Build the fine-resolution window around a path computed on series
    /// downsampled by two, then widen it by `radius`.
    ///
    /// Each coarse step is projected onto a 2×2 block of fine cells. Diagonal
    /// coarse steps also mark the two corner cells between consecutive blocks
    /// so the band stays connected. Marks falling outside the grid are ignored.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidCoarsePath`] | `coarse` is empty, does not start at `(0, 0)`, or is not a unit-step monotone path |
    #[instrument(skip(coarse), fields(coarse_len = coarse.len()))]
    pub fn from_coarse_path(
        len_x: usize,
        len_y: usize,
        coarse: &WarpPath,
        radius: usize,
    ) -> Result<Self, AlignError> {
        let mut window = Self::new(len_x, len_y);
        let mut steps = coarse.iter_chronological();

        let first = steps.next().ok_or_else(|| AlignError::InvalidCoarsePath {
            reason: "path is empty".to_string(),
        })?;
        if *first != WarpStep::new(0, 0) {
            return Err(AlignError::InvalidCoarsePath {
                reason: format!("path starts at ({}, {}) instead of (0, 0)", first.x, first.y),
            });
        }

        let (mut fine_x, mut fine_y) = (0, 0);
        let mut last = *first;
        window.mark_block(fine_x, fine_y);

        for step in steps {
            let dx = step.x.checked_sub(last.x);
            let dy = step.y.checked_sub(last.y);
            let (dx, dy) = match (dx, dy) {
                (Some(dx), Some(dy)) if dx <= 1 && dy <= 1 && dx + dy > 0 => (dx, dy),
                _ => {
                    return Err(AlignError::InvalidCoarsePath {
                        reason: format!(
                            "step ({}, {}) -> ({}, {}) is not a unit forward move",
                            last.x, last.y, step.x, step.y
                        ),
                    });
                }
            };

            fine_x += dx * BLOCK;
            fine_y += dy * BLOCK;
            if dx == 1 && dy == 1 {
                window.mark_visited(fine_x - 1, fine_y);
                window.mark_visited(fine_x, fine_y - 1);
            }
            window.mark_block(fine_x, fine_y);
            last = *step;
        }

        if radius > 0 {
            window.expand(1);
            window.expand(radius - 1);
        }

        debug!(size = window.size, "search window built");
        Ok(window)
    }

    /// Return the number of columns (length of the first series).
    #[must_use]
    pub fn len_x(&self) -> usize {
        self.bands.len()
    }

    /// Return the number of rows (length of the second series).
    #[must_use]
    pub fn len_y(&self) -> usize {
        self.len_y
    }

    /// Return the number of admissible cells.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Return true if no cell is admissible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Return the band of column `col`, if any cell in it is admissible.
    #[must_use]
    pub fn band(&self, col: usize) -> Option<Band> {
        self.bands.get(col).copied().flatten()
    }

    /// Iterate over `(column, band)` for every column holding admissible cells.
    pub fn columns(&self) -> impl Iterator<Item = (usize, Band)> + '_ {
        self.bands
            .iter()
            .enumerate()
            .filter_map(|(col, band)| band.map(|b| (col, b)))
    }

    /// Return true if cell `(col, row)` is admissible.
    #[must_use]
    pub fn contains(&self, col: usize, row: usize) -> bool {
        self.band(col).is_some_and(|b| b.contains(row))
    }

    /// Admit cell `(col, row)`, widening its column's band as needed.
    ///
    /// Cells outside the grid are ignored. Marking an admissible cell again is
    /// a no-op.
    pub fn mark_visited(&mut self, col: usize, row: usize) {
        if row >= self.len_y {
            return;
        }
        let Some(slot) = self.bands.get_mut(col) else {
            return;
        };
        match slot {
            None => {
                *slot = Some(Band { min: row, max: row });
                self.size += 1;
            }
            Some(band) if row < band.min => {
                self.size += band.min - row;
                band.min = row;
            }
            Some(band) if row > band.max => {
                self.size += row - band.max;
                band.max = row;
            }
            Some(_) => {}
        }
    }

    /// Grow every admissible cell by `radius` in the eight compass directions.
    ///
    /// A cell does not grow toward an edge it already touches. A step that
    /// would leave the grid slides back along its own direction by the
    /// overflow, so diagonal growth stays diagonal at the edges.
    pub fn expand(&mut self, radius: usize) {
        if radius == 0 || self.is_empty() {
            return;
        }
        let r = radius as isize;
        let max_x = self.bands.len() as isize - 1;
        let max_y = self.len_y as isize - 1;

        let snapshot: Vec<(usize, Band)> = self.columns().collect();
        for (col, band) in snapshot {
            let x = col as isize;
            for row in band.min..=band.max {
                let y = row as isize;
                for (dx, dy) in DIRECTIONS {
                    if (dx < 0 && x == 0)
                        || (dx > 0 && x == max_x)
                        || (dy < 0 && y == 0)
                        || (dy > 0 && y == max_y)
                    {
                        continue;
                    }
                    let tx = x + dx * r;
                    let ty = y + dy * r;
                    let past_x = if dx == 0 { 0 } else { overflow(tx, max_x) };
                    let past_y = if dy == 0 { 0 } else { overflow(ty, max_y) };
                    let past_edge = past_x.max(past_y);
                    self.mark_signed(tx - dx * past_edge, ty - dy * past_edge);
                }
            }
        }
    }

    /// Check that this window can carry an alignment of a `len_x × len_y` grid.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidWindow`] when the shape differs, `(0, 0)` or
    /// `(len_x - 1, len_y - 1)` is excluded, a column is empty, or no monotone
    /// path connects the two corners.
    pub fn validate(&self, len_x: usize, len_y: usize) -> Result<(), AlignError> {
        let invalid = |reason: String| Err(AlignError::InvalidWindow { reason });

        if self.len_x() != len_x || self.len_y != len_y {
            return invalid(format!(
                "window covers a {}x{} grid but the series are {len_x}x{len_y}",
                self.len_x(),
                self.len_y
            ));
        }
        if !self.contains(0, 0) {
            return invalid("cell (0, 0) is not admissible".to_string());
        }

        // Lowest reachable row in the previous column, and that column's top.
        let mut reach = 0;
        let mut prev_max = self.band(0).map_or(0, |b| b.max);
        for col in 1..len_x {
            let Some(band) = self.band(col) else {
                return invalid(format!("column {col} has no admissible rows"));
            };
            let lowest = band.min.max(reach);
            if lowest > band.max || lowest > prev_max + 1 {
                return invalid(format!("column {col} is not reachable from column {}", col - 1));
            }
            reach = lowest;
            prev_max = band.max;
        }

        if !self.contains(len_x - 1, len_y - 1) {
            return invalid(format!(
                "cell ({}, {}) is not admissible",
                len_x - 1,
                len_y - 1
            ));
        }
        Ok(())
    }

    fn mark_block(&mut self, col: usize, row: usize) {
        for dx in 0..BLOCK {
            for dy in 0..BLOCK {
                self.mark_visited(col + dx, row + dy);
            }
        }
    }

    fn mark_signed(&mut self, col: isize, row: isize) {
        if let (Ok(col), Ok(row)) = (usize::try_from(col), usize::try_from(row)) {
            self.mark_visited(col, row);
        }
    }
}

/// Number of cells `target` lies outside `[0, max]`.
fn overflow(target: isize, max: isize) -> isize {
    if target < 0 {
        -target
    } else {
        (target - max).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(steps: &[(usize, usize)]) -> WarpPath {
        // Steps are given chronologically; paths are stored end first.
        steps.iter().rev().map(|&s| WarpStep::from(s)).collect()
    }

    #[test]
    fn first_mark_sets_both_bounds() {
        let mut w = SearchWindow::new(3, 5);
        w.mark_visited(1, 3);
        assert_eq!(w.band(1), Some(Band { min: 3, max: 3 }));
        assert_eq!(w.size(), 1);
    }

    #[test]
    fn marks_widen_band_by_newly_covered_rows() {
        let mut w = SearchWindow::new(1, 10);
        w.mark_visited(0, 5);
        w.mark_visited(0, 2);
        assert_eq!(w.size(), 4);
        w.mark_visited(0, 8);
        assert_eq!(w.size(), 7);
        assert_eq!(w.band(0), Some(Band { min: 2, max: 8 }));
    }

    #[test]
    fn marking_is_idempotent() {
        let mut w = SearchWindow::new(4, 4);
        w.mark_visited(2, 1);
        let once = w.clone();
        w.mark_visited(2, 1);
        assert_eq!(w, once);
        assert_eq!(w.size(), 1);
    }

    #[test]
    fn marking_inside_band_is_a_no_op() {
        let mut w = SearchWindow::new(1, 10);
        w.mark_visited(0, 1);
        w.mark_visited(0, 6);
        w.mark_visited(0, 4);
        assert_eq!(w.size(), 6);
    }

    #[test]
    fn out_of_grid_marks_are_ignored() {
        let mut w = SearchWindow::new(2, 2);
        w.mark_visited(2, 0);
        w.mark_visited(0, 2);
        assert!(w.is_empty());
        assert_eq!(w.columns().count(), 0);
    }

    #[test]
    fn full_window_covers_grid() {
        let w = SearchWindow::full(3, 4);
        assert_eq!(w.size(), 12);
        assert!(w.validate(3, 4).is_ok());
    }

    #[test]
    fn single_cell_coarse_path_covers_projected_block() {
        let w = SearchWindow::from_coarse_path(4, 4, &path(&[(0, 0)]), 0).unwrap();
        assert_eq!(w.size(), 4);
        assert_eq!(w.band(0), Some(Band { min: 0, max: 1 }));
        assert_eq!(w.band(1), Some(Band { min: 0, max: 1 }));
        assert_eq!(w.band(2), None);
    }

    #[test]
    fn expanding_by_one_grows_block() {
        let mut w = SearchWindow::from_coarse_path(4, 4, &path(&[(0, 0)]), 0).unwrap();
        let before = w.size();
        w.expand(1);
        assert!(w.size() > before);
        assert_eq!(w.size(), 9);
        for col in 0..3 {
            assert_eq!(w.band(col), Some(Band { min: 0, max: 2 }));
        }
    }

    #[test]
    fn expanding_saturated_window_changes_nothing() {
        let mut w = SearchWindow::from_coarse_path(2, 2, &path(&[(0, 0)]), 0).unwrap();
        let before = w.clone();
        w.expand(1);
        assert_eq!(w, before);
    }

    #[test]
    fn diagonal_step_marks_corner_cells() {
        let w = SearchWindow::from_coarse_path(4, 4, &path(&[(0, 0), (1, 1)]), 0).unwrap();
        // Blocks at (0..2, 0..2) and (2..4, 2..4) plus corners (1, 2) and (2, 1).
        assert_eq!(w.band(1), Some(Band { min: 0, max: 2 }));
        assert_eq!(w.band(2), Some(Band { min: 1, max: 3 }));
        assert_eq!(w.size(), 10);
        assert!(w.validate(4, 4).is_ok());
    }

    #[test]
    fn horizontal_and_vertical_steps_project_by_two() {
        let w = SearchWindow::from_coarse_path(4, 6, &path(&[(0, 0), (0, 1), (1, 2)]), 0).unwrap();
        assert_eq!(w.band(0), Some(Band { min: 0, max: 3 }));
        assert_eq!(w.band(1), Some(Band { min: 0, max: 4 }));
        assert_eq!(w.band(2), Some(Band { min: 3, max: 5 }));
        assert_eq!(w.band(3), Some(Band { min: 4, max: 5 }));
        assert!(w.validate(4, 6).is_ok());
    }

    #[test]
    fn odd_lengths_drop_projected_cells_past_the_edge() {
        let w = SearchWindow::from_coarse_path(3, 3, &path(&[(0, 0), (1, 1)]), 0).unwrap();
        assert_eq!(w.band(2), Some(Band { min: 1, max: 2 }));
        assert!(w.validate(3, 3).is_ok());
    }

    #[test]
    fn expansion_clamps_within_small_grid() {
        let mut w = SearchWindow::new(3, 3);
        w.mark_visited(1, 1);
        w.expand(2);
        assert_eq!(w.size(), 9);
    }

    #[test]
    fn expansion_slides_diagonals_along_their_direction() {
        let mut w = SearchWindow::new(5, 3);
        w.mark_visited(2, 1);
        w.expand(2);
        // Upper-right target (4, 3) overflows by one and slides back to (3, 2),
        // not to the per-axis clamp (4, 2).
        assert_eq!(w.band(4), Some(Band { min: 1, max: 1 }));
        assert_eq!(w.band(3), Some(Band { min: 0, max: 2 }));
        assert_eq!(w.band(0), Some(Band { min: 1, max: 1 }));
        assert_eq!(w.band(1), Some(Band { min: 0, max: 2 }));
        assert_eq!(w.size(), 11);
    }

    #[test]
    fn radius_zero_expand_is_a_no_op() {
        let mut w = SearchWindow::new(3, 3);
        w.mark_visited(1, 1);
        w.expand(0);
        assert_eq!(w.size(), 1);
    }

    #[test]
    fn construction_radius_applies_unit_then_remaining_expansion() {
        let coarse = path(&[(0, 0), (1, 1), (2, 2)]);
        let mut manual = SearchWindow::from_coarse_path(6, 6, &coarse, 0).unwrap();
        manual.expand(1);
        manual.expand(2);
        let built = SearchWindow::from_coarse_path(6, 6, &coarse, 3).unwrap();
        assert_eq!(built, manual);
    }

    #[test]
    fn rejects_empty_coarse_path() {
        let err = SearchWindow::from_coarse_path(2, 2, &WarpPath::new(), 1).unwrap_err();
        assert!(matches!(err, AlignError::InvalidCoarsePath { .. }));
    }

    #[test]
    fn rejects_coarse_path_not_starting_at_origin() {
        let err = SearchWindow::from_coarse_path(4, 4, &path(&[(1, 0), (1, 1)]), 1).unwrap_err();
        assert!(matches!(err, AlignError::InvalidCoarsePath { .. }));
    }

    #[test]
    fn rejects_coarse_path_with_jumps() {
        let err = SearchWindow::from_coarse_path(8, 8, &path(&[(0, 0), (2, 1)]), 1).unwrap_err();
        assert!(matches!(err, AlignError::InvalidCoarsePath { .. }));
    }

    #[test]
    fn validate_rejects_missing_origin() {
        let mut w = SearchWindow::new(2, 2);
        w.mark_visited(0, 1);
        w.mark_visited(1, 0);
        w.mark_visited(1, 1);
        let err = w.validate(2, 2).unwrap_err();
        assert!(matches!(err, AlignError::InvalidWindow { .. }));
    }

    #[test]
    fn validate_rejects_missing_end() {
        let mut w = SearchWindow::new(2, 3);
        w.mark_visited(0, 0);
        w.mark_visited(1, 0);
        w.mark_visited(1, 1);
        assert!(w.validate(2, 3).is_err());
    }

    #[test]
    fn validate_rejects_gap_between_columns() {
        let mut w = SearchWindow::new(2, 4);
        w.mark_visited(0, 0);
        w.mark_visited(1, 2);
        w.mark_visited(1, 3);
        let err = w.validate(2, 4).unwrap_err();
        assert!(err.to_string().contains("not reachable"));
    }

    #[test]
    fn validate_rejects_empty_column() {
        let mut w = SearchWindow::new(3, 1);
        w.mark_visited(0, 0);
        w.mark_visited(2, 0);
        let err = w.validate(3, 1).unwrap_err();
        assert!(err.to_string().contains("column 1"));
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        let w = SearchWindow::full(3, 3);
        assert!(w.validate(3, 4).is_err());
    }

    #[test]
    fn validate_accepts_diagonal_only_band() {
        let mut w = SearchWindow::new(3, 3);
        for i in 0..3 {
            w.mark_visited(i, i);
        }
        assert!(w.validate(3, 3).is_ok());
    }
}

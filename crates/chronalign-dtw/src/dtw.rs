//! Exact and windowed DTW alignment with warp-path backtracking.

use tracing::{debug, instrument};

use crate::cost::{CostMatrix, CostTable, WindowedCostMatrix};
use crate::distance::{Real, euclidean_unchecked};
use crate::error::AlignError;
use crate::path::{WarpInfo, WarpPath};
use crate::series::SeriesView;
use crate::window::SearchWindow;

/// Compute the exact DTW cost between two series without extracting a path.
///
/// The longer series always indexes the table's first axis, so
/// `compute_cost(x, y) == compute_cost(y, x)` bit for bit. Runs in
/// O(len_x * len_y) time and space.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AlignError::LengthMismatch`] | The series have different frame dimensions |
#[instrument(skip(x, y), fields(len_x = x.len(), len_y = y.len()))]
pub fn compute_cost<T: Real>(x: SeriesView<'_, T>, y: SeriesView<'_, T>) -> Result<T, AlignError> {
    check_dimensions(x, y)?;
    let (long, short) = if x.len() < y.len() { (y, x) } else { (x, y) };
    Ok(fill_exact(long, short).final_cost())
}

/// Compute the exact DTW cost and optimal warp path between two series.
///
/// The path is expressed in the caller's argument order: each step's `x` indexes
/// the first argument even when the table was filled with the arguments swapped.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AlignError::LengthMismatch`] | The series have different frame dimensions |
#[instrument(skip(x, y), fields(len_x = x.len(), len_y = y.len()))]
pub fn align<T: Real>(x: SeriesView<'_, T>, y: SeriesView<'_, T>) -> Result<WarpInfo<T>, AlignError> {
    check_dimensions(x, y)?;
    let swapped = x.len() < y.len();
    let (long, short) = if swapped { (y, x) } else { (x, y) };

    let table = fill_exact(long, short);
    let path = backtrack(&table);
    let path = if swapped { path.transposed() } else { path };

    debug!(cells = long.len() * short.len(), path_len = path.len(), swapped, "exact alignment");
    Ok(WarpInfo::new(table.final_cost(), path))
}

/// Align two series, filling only the cells admitted by `window`.
///
/// Cells outside the window count as `+infinity`, so the result is never
/// cheaper than [`align`] and equals it whenever the window contains an
/// optimal exact path. Runs in O(window size) time and space.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AlignError::LengthMismatch`] | The series have different frame dimensions |
/// | [`AlignError::InvalidWindow`] | The window does not match the series or cannot connect `(0, 0)` to the final cell |
#[instrument(skip(x, y, window), fields(len_x = x.len(), len_y = y.len(), window = window.size()))]
pub fn constrained_align<T: Real>(
    x: SeriesView<'_, T>,
    y: SeriesView<'_, T>,
    window: &SearchWindow,
) -> Result<WarpInfo<T>, AlignError> {
    check_dimensions(x, y)?;
    window.validate(x.len(), y.len())?;

    let mut table = WindowedCostMatrix::new(window);

    // Columns ascend and rows ascend within a band, so every predecessor is
    // final before it is read.
    for (col, band) in window.columns() {
        for row in band.min..=band.max {
            let local = euclidean_unchecked(&x[col], &y[row]);
            let value = match (col, row) {
                (0, 0) => local,
                (0, _) => local + table.cost(0, row - 1),
                (_, 0) => local + table.cost(col - 1, 0),
                _ => {
                    local
                        + table
                            .cost(col - 1, row)
                            .min(table.cost(col - 1, row - 1))
                            .min(table.cost(col, row - 1))
                }
            };
            table.set(col, row, value);
        }
    }

    let path = backtrack(&table);
    debug!(
        cells = table.stored_cells(),
        path_len = path.len(),
        "windowed alignment"
    );
    Ok(WarpInfo::new(table.final_cost(), path))
}

/// Walk a filled cost table from its final cell back to `(0, 0)`.
///
/// At each cell the three causal predecessors are compared, with absent cells
/// reading as `+infinity`:
///
/// 1. diagonal `(x-1, y-1)` wins if it is `<=` both others;
/// 2. otherwise `(x-1, y)` wins if strictly cheaper than both;
/// 3. otherwise `(x, y-1)` wins if strictly cheaper than both;
/// 4. otherwise (a tie with no strict winner) `y` steps back when `x <= y`,
///    else `x` steps back.
///
/// Rule 4 is a fixed output policy rather than a cost argument. Every step
/// lowers `x + y`, so the walk terminates; the returned path is stored end
/// first and finishes at `(0, 0)`. An empty table yields an empty path.
pub fn backtrack<T: Real, C: CostTable<T>>(table: &C) -> WarpPath {
    let (Some(mut i), Some(mut j)) = (table.len_x().checked_sub(1), table.len_y().checked_sub(1))
    else {
        return WarpPath::new();
    };

    let mut path = WarpPath::with_capacity(i + j + 1);
    path.push(i, j);

    while i > 0 || j > 0 {
        let diagonal = if i > 0 && j > 0 {
            table.cost(i - 1, j - 1)
        } else {
            T::infinity()
        };
        let left = if i > 0 { table.cost(i - 1, j) } else { T::infinity() };
        let down = if j > 0 { table.cost(i, j - 1) } else { T::infinity() };

        if diagonal <= left && diagonal <= down {
            i = i.saturating_sub(1);
            j = j.saturating_sub(1);
        } else if left < diagonal && left < down {
            i -= 1;
        } else if down < diagonal && down < left {
            j -= 1;
        } else if i <= j {
            j -= 1;
        } else {
            i -= 1;
        }

        path.push(i, j);
    }

    path
}

/// Full three-predecessor fill over a dense table.
fn fill_exact<T: Real>(x: SeriesView<'_, T>, y: SeriesView<'_, T>) -> CostMatrix<T> {
    let (n, m) = (x.len(), y.len());
    let mut table = CostMatrix::new(n, m);

    table.set(0, 0, euclidean_unchecked(&x[0], &y[0]));
    for j in 1..m {
        let value = table.cost(0, j - 1) + euclidean_unchecked(&x[0], &y[j]);
        table.set(0, j, value);
    }

    for i in 1..n {
        let value = table.cost(i - 1, 0) + euclidean_unchecked(&x[i], &y[0]);
        table.set(i, 0, value);

        for j in 1..m {
            let best = table
                .cost(i - 1, j)
                .min(table.cost(i, j - 1))
                .min(table.cost(i - 1, j - 1));
            table.set(i, j, best + euclidean_unchecked(&x[i], &y[j]));
        }
    }

    table
}

fn check_dimensions<T: Real>(x: SeriesView<'_, T>, y: SeriesView<'_, T>) -> Result<(), AlignError> {
    if x.dimension() != y.dimension() {
        return Err(AlignError::LengthMismatch {
            left: x.dimension(),
            right: y.dimension(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::WarpStep;
    use crate::series::Series;

    fn scalars(values: &[f64]) -> Series<f64> {
        Series::from_scalars(values).unwrap()
    }

    fn steps(path: &WarpPath) -> Vec<(usize, usize)> {
        path.steps().iter().map(|s| (s.x, s.y)).collect()
    }

    #[test]
    fn identical_series_follow_the_diagonal() {
        let x = scalars(&[0.0, 1.0, 2.0]);
        let info = align(x.as_view(), x.as_view()).unwrap();
        assert_eq!(info.cost(), 0.0);
        assert_eq!(steps(info.path()), vec![(2, 2), (1, 1), (0, 0)]);
    }

    #[test]
    fn shorter_first_argument_keeps_caller_orientation() {
        let x = scalars(&[0.0, 3.0]);
        let y = scalars(&[0.0, 0.0, 3.0]);
        let info = align(x.as_view(), y.as_view()).unwrap();
        assert_eq!(info.cost(), 0.0);
        assert_eq!(steps(info.path()), vec![(1, 2), (0, 1), (0, 0)]);
    }

    #[test]
    fn hand_computed_2x2() {
        // d = |x - y|: d00 = 1, d01 = 0, d10 = 0, d11 = 1
        // C00 = 1, C01 = 1, C10 = 1, C11 = 1 + min(1, 1, 1) = 2
        let x = scalars(&[0.0, 1.0]);
        let y = scalars(&[1.0, 0.0]);
        let info = align(x.as_view(), y.as_view()).unwrap();
        assert_eq!(info.cost(), 2.0);
        // All three predecessors tie; the diagonal wins.
        assert_eq!(steps(info.path()), vec![(1, 1), (0, 0)]);
    }

    #[test]
    fn hand_computed_3x3_prefers_strictly_cheaper_down() {
        // Rows x0..x2 of d: [1,2,3], [0,1,2], [1,0,1]
        // C: [1,3,6], [1,2,4], [2,1,2]
        let x = scalars(&[0.0, 1.0, 2.0]);
        let y = scalars(&[1.0, 2.0, 3.0]);
        let info = align(x.as_view(), y.as_view()).unwrap();
        assert_eq!(info.cost(), 2.0);
        assert_eq!(steps(info.path()), vec![(2, 2), (2, 1), (1, 0), (0, 0)]);
    }

    #[test]
    fn multivariate_frames_use_euclidean_distance() {
        let x = Series::<f64>::new(vec![vec![0.0, 0.0], vec![3.0, 4.0]]).unwrap();
        let y = Series::new(vec![vec![0.0, 0.0], vec![0.0, 0.0]]).unwrap();
        // C00 = 0, C01 = 0, C10 = 5, C11 = 5 + min(0, 5, 0) = 5
        let cost = compute_cost(x.as_view(), y.as_view()).unwrap();
        assert!((cost - 5.0).abs() < 1e-12);
    }

    #[test]
    fn compute_cost_matches_align() {
        let x = scalars(&[1.0, 3.0, 5.0, 2.0]);
        let y = scalars(&[2.0, 4.0, 1.0]);
        let cost = compute_cost(x.as_view(), y.as_view()).unwrap();
        let info = align(x.as_view(), y.as_view()).unwrap();
        assert_eq!(cost, info.cost());
    }

    #[test]
    fn cost_is_symmetric() {
        let x = scalars(&[1.0, 5.0, 2.0, 8.0, 3.0]);
        let y = scalars(&[2.0, 4.0, 7.0]);
        let xy = compute_cost(x.as_view(), y.as_view()).unwrap();
        let yx = compute_cost(y.as_view(), x.as_view()).unwrap();
        assert_eq!(xy, yx);

        let a = align(x.as_view(), y.as_view()).unwrap();
        let b = align(y.as_view(), x.as_view()).unwrap();
        assert_eq!(a.cost(), b.cost());
        assert_eq!(b.path(), &a.path().clone().transposed());
    }

    #[test]
    fn single_frame_series() {
        let x = scalars(&[5.0]);
        let y = scalars(&[3.0]);
        let info = align(x.as_view(), y.as_view()).unwrap();
        assert_eq!(info.cost(), 2.0);
        assert_eq!(steps(info.path()), vec![(0, 0)]);
    }

    #[test]
    fn single_frame_against_many() {
        let x = scalars(&[1.0]);
        let y = scalars(&[1.0, 2.0, 4.0]);
        let info = align(x.as_view(), y.as_view()).unwrap();
        assert_eq!(info.cost(), 4.0);
        assert_eq!(steps(info.path()), vec![(0, 2), (0, 1), (0, 0)]);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let x = Series::new(vec![vec![1.0, 2.0]]).unwrap();
        let y = Series::new(vec![vec![1.0]]).unwrap();
        let err = align(x.as_view(), y.as_view()).unwrap_err();
        assert_eq!(err, AlignError::LengthMismatch { left: 2, right: 1 });
        assert!(compute_cost(x.as_view(), y.as_view()).is_err());
        let window = SearchWindow::full(1, 1);
        assert!(constrained_align(x.as_view(), y.as_view(), &window).is_err());
    }

    #[test]
    fn empty_series_cannot_be_aligned() {
        let frames: Vec<Vec<f64>> = Vec::new();
        assert!(matches!(SeriesView::new(&frames), Err(AlignError::EmptySeries)));
    }

    #[test]
    fn single_precision_alignment() {
        let x = Series::<f32>::from_scalars(&[0.0, 1.0, 2.0]).unwrap();
        let y = Series::<f32>::from_scalars(&[0.0, 2.0]).unwrap();
        let info = align(x.as_view(), y.as_view()).unwrap();
        assert!((info.cost() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn backtrack_tie_steps_back_in_y_when_x_not_greater() {
        let mut table = CostMatrix::<f64>::new(2, 2);
        table.set(0, 0, 5.0);
        table.set(0, 1, 1.0);
        table.set(1, 0, 1.0);
        table.set(1, 1, 9.0);
        let path = backtrack(&table);
        assert_eq!(steps(&path), vec![(1, 1), (1, 0), (0, 0)]);
    }

    #[test]
    fn backtrack_tie_steps_back_in_x_when_x_greater() {
        let mut table = CostMatrix::<f64>::new(3, 2);
        table.set(0, 0, 0.0);
        table.set(0, 1, 1.0);
        table.set(1, 0, 5.0);
        table.set(1, 1, 1.0);
        table.set(2, 0, 1.0);
        table.set(2, 1, 9.0);
        let path = backtrack(&table);
        assert_eq!(steps(&path)[1], (1, 1));
        assert_eq!(path.steps().last(), Some(&WarpStep::new(0, 0)));
    }

    #[test]
    fn backtrack_of_empty_table_is_empty() {
        let table = CostMatrix::<f64>::new(0, 3);
        assert!(backtrack(&table).is_empty());
    }

    #[test]
    fn constrained_with_full_window_matches_exact() {
        let x = scalars(&[1.0, 3.0, 5.0, 2.0, 0.0]);
        let y = scalars(&[2.0, 4.0, 1.0, 1.0]);
        let window = SearchWindow::full(x.len(), y.len());
        let exact = align(x.as_view(), y.as_view()).unwrap();
        let windowed = constrained_align(x.as_view(), y.as_view(), &window).unwrap();
        assert_eq!(windowed, exact);
    }

    #[test]
    fn constrained_diagonal_window_costs_at_least_exact() {
        let x = scalars(&[0.0, 1.0, 2.0]);
        let y = scalars(&[1.0, 2.0, 3.0]);
        let mut window = SearchWindow::new(3, 3);
        for i in 0..3 {
            window.mark_visited(i, i);
        }
        let windowed = constrained_align(x.as_view(), y.as_view(), &window).unwrap();
        assert_eq!(windowed.cost(), 3.0);
        assert_eq!(steps(windowed.path()), vec![(2, 2), (1, 1), (0, 0)]);
        let exact = compute_cost(x.as_view(), y.as_view()).unwrap();
        assert!(windowed.cost() >= exact);
    }

    #[test]
    fn constrained_first_column_and_row_accumulate() {
        let x = scalars(&[0.0, 1.0, 2.0]);
        let y = scalars(&[0.0, 1.0, 2.0]);
        // Column 0 fully admitted, then only row 2 in columns 1 and 2.
        let mut window = SearchWindow::new(3, 3);
        window.mark_visited(0, 0);
        window.mark_visited(0, 2);
        window.mark_visited(1, 2);
        window.mark_visited(2, 2);
        let info = constrained_align(x.as_view(), y.as_view(), &window).unwrap();
        // Column 0: 0, 1, 3
        // (1, 2) = 1 + min(C02 = 3, C01 = 1, C11 = inf) = 2
        // (2, 2) = 0 + min(C12 = 2, C11 = inf, C21 = inf) = 2
        assert_eq!(info.cost(), 2.0);
        assert_eq!(steps(info.path()), vec![(2, 2), (1, 2), (0, 1), (0, 0)]);
    }

    #[test]
    fn constrained_rejects_disconnected_window() {
        let x = scalars(&[0.0, 1.0]);
        let y = scalars(&[0.0, 1.0]);
        let mut window = SearchWindow::new(2, 2);
        window.mark_visited(0, 0);
        let err = constrained_align(x.as_view(), y.as_view(), &window).unwrap_err();
        assert!(matches!(err, AlignError::InvalidWindow { .. }));
    }

    #[test]
    fn constrained_rejects_mis_shaped_window() {
        let x = scalars(&[0.0, 1.0]);
        let y = scalars(&[0.0, 1.0, 2.0]);
        let window = SearchWindow::full(2, 2);
        let err = constrained_align(x.as_view(), y.as_view(), &window).unwrap_err();
        assert!(matches!(err, AlignError::InvalidWindow { .. }));
    }
}

//! Dynamic time warping alignment over multivariate series.
//!
//! Pure math library with zero I/O. Provides the Euclidean frame distance,
//! exact DTW with warp-path backtracking, windowed DTW restricted to a
//! [`SearchWindow`], and a multi-resolution [`FastDtw`] pipeline that derives
//! the window from a coarser alignment.

mod cost;
mod distance;
mod dtw;
mod error;
mod fast;
mod path;
mod series;
mod window;

pub use cost::{CostMatrix, CostTable, WindowedCostMatrix};
pub use distance::{Real, euclidean};
pub use dtw::{align, backtrack, compute_cost, constrained_align};
pub use error::AlignError;
pub use fast::FastDtw;
pub use path::{WarpInfo, WarpPath, WarpStep};
pub use series::{Series, SeriesView};
pub use window::{Band, SearchWindow};

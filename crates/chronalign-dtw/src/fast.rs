//! Multi-resolution approximate alignment.
//!
//! Aligns series downsampled by two, projects that path back onto the full
//! resolution grid as a [`SearchWindow`], and runs the windowed recurrence
//! inside it. Recurses until a series is short enough to align exactly.

use tracing::{debug, instrument};

use crate::distance::Real;
use crate::dtw::{align, constrained_align};
use crate::error::AlignError;
use crate::path::WarpInfo;
use crate::series::SeriesView;
use crate::window::SearchWindow;

/// Immutable multi-resolution DTW configuration. Thread-safe and copyable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastDtw {
    radius: usize,
    min_series_len: usize,
}

impl FastDtw {
    /// Create a calculator that widens each projected path by `radius` cells.
    ///
    /// Larger radii trade speed for accuracy; a radius at least as long as
    /// both series degenerates to exact alignment.
    #[must_use]
    pub fn new(radius: usize) -> Self {
        Self {
            radius,
            min_series_len: radius + 2,
        }
    }

    /// Set the length at or below which series are aligned exactly.
    ///
    /// Defaults to `radius + 2`. Values below 1 are raised to 1, since a
    /// one-frame series cannot be coarsened further.
    #[must_use]
    pub fn with_min_series_len(mut self, min_series_len: usize) -> Self {
        self.min_series_len = min_series_len.max(1);
        self
    }

    /// Return the search radius.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Series of this length or shorter are aligned exactly.
    #[must_use]
    pub fn min_series_len(&self) -> usize {
        self.min_series_len
    }

    /// Approximate the DTW alignment of two series.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::LengthMismatch`] | The series have different frame dimensions |
    #[instrument(skip(x, y), fields(len_x = x.len(), len_y = y.len()))]
    pub fn align<T: Real>(
        &self,
        x: SeriesView<'_, T>,
        y: SeriesView<'_, T>,
    ) -> Result<WarpInfo<T>, AlignError> {
        self.align_level(x, y, 0)
    }

    /// Approximate the DTW cost of two series.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FastDtw::align`].
    pub fn cost<T: Real>(&self, x: SeriesView<'_, T>, y: SeriesView<'_, T>) -> Result<T, AlignError> {
        Ok(self.align(x, y)?.cost())
    }

    fn align_level<T: Real>(
        &self,
        x: SeriesView<'_, T>,
        y: SeriesView<'_, T>,
        depth: usize,
    ) -> Result<WarpInfo<T>, AlignError> {
        let min_len = self.min_series_len();
        if x.len() <= min_len || y.len() <= min_len {
            debug!(depth, len_x = x.len(), len_y = y.len(), "base resolution reached");
            return align(x, y);
        }

        let coarse_x = x.downsample();
        let coarse_y = y.downsample();
        let coarse = self.align_level(coarse_x.as_view(), coarse_y.as_view(), depth + 1)?;

        let window = SearchWindow::from_coarse_path(x.len(), y.len(), coarse.path(), self.radius)?;
        debug!(
            depth,
            len_x = x.len(),
            len_y = y.len(),
            window = window.size(),
            "refining projected alignment"
        );
        constrained_align(x, y, &window)
    }
}

impl Default for FastDtw {
    fn default() -> Self {
        Self::new(1)
    }
}

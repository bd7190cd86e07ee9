//! Warp path and alignment result types.

use serde::{Deserialize, Serialize};

/// A single aligned pair: frame `x` of the first series matched with frame `y`
/// of the second series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarpStep {
    /// Index in the first series.
    pub x: usize,
    /// Index in the second series.
    pub y: usize,
}

impl WarpStep {
    /// Create a step from a pair of indices.
    #[must_use]
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for WarpStep {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

/// An alignment stored from its end toward its start.
///
/// Backtracking appends `(len_x - 1, len_y - 1)` first and `(0, 0)` last.
/// Use [`WarpPath::chronological`] for start-to-end order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarpPath(Vec<WarpStep>);

impl WarpPath {
    /// Create an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an empty path with room for `capacity` steps.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Append a step in amortized O(1).
    pub fn push(&mut self, x: usize, y: usize) {
        self.0.push(WarpStep { x, y });
    }

    /// Return the steps in storage order (end first).
    #[must_use]
    pub fn steps(&self) -> &[WarpStep] {
        &self.0
    }

    /// Return the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the steps in start-to-end order.
    #[must_use]
    pub fn chronological(&self) -> Vec<WarpStep> {
        self.0.iter().rev().copied().collect()
    }

    /// Iterate over the steps in start-to-end order without allocating.
    pub fn iter_chronological(&self) -> impl DoubleEndedIterator<Item = &WarpStep> + '_ {
        self.0.iter().rev()
    }

    /// Swap the roles of the two series in every step.
    #[must_use]
    pub fn transposed(mut self) -> Self {
        for step in &mut self.0 {
            std::mem::swap(&mut step.x, &mut step.y);
        }
        self
    }
}

impl FromIterator<WarpStep> for WarpPath {
    fn from_iter<I: IntoIterator<Item = WarpStep>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a WarpPath {
    type Item = &'a WarpStep;
    type IntoIter = std::slice::Iter<'a, WarpStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of one alignment call: the accumulated cost and its warp path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpInfo<T> {
    cost: T,
    path: WarpPath,
}

impl<T: Copy> WarpInfo<T> {
    pub(crate) fn new(cost: T, path: WarpPath) -> Self {
        Self { cost, path }
    }

    /// Return the accumulated alignment cost.
    #[must_use]
    pub fn cost(&self) -> T {
        self.cost
    }

    /// Return the warp path (end first).
    #[must_use]
    pub fn path(&self) -> &WarpPath {
        &self.path
    }

    /// Consume and return the cost and path.
    #[must_use]
    pub fn into_parts(self) -> (T, WarpPath) {
        (self.cost, self.path)
    }
}

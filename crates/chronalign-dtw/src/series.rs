//! Multivariate series types with validation guarantees.

use std::ops::Index;

use crate::distance::Real;
use crate::error::AlignError;

/// Owned, validated series of feature frames.
///
/// Guaranteed non-empty, every frame non-empty with the same dimension, and
/// every value finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T>(Vec<Vec<T>>);

impl<T: Real> Series<T> {
    /// Create a new series, validating its frames.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptySeries`] | `frames` is empty |
    /// | [`AlignError::EmptyFrame`] | A frame has zero features |
    /// | [`AlignError::InconsistentDimension`] | A frame's length differs from frame 0 |
    /// | [`AlignError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(frames: Vec<Vec<T>>) -> Result<Self, AlignError> {
        validate(&frames)?;
        Ok(Self(frames))
    }

    /// Build a one-feature series from scalar samples.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Series::new`].
    pub fn from_scalars(values: &[T]) -> Result<Self, AlignError> {
        Self::new(values.iter().map(|&v| vec![v]).collect())
    }

    /// Borrow this series as a zero-copy view.
    #[must_use]
    pub fn as_view(&self) -> SeriesView<'_, T> {
        SeriesView(&self.0)
    }

    /// Return the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the series has no frames.
    ///
    /// Always `false` for a series built through [`Series::new`]; provided to
    /// satisfy the `len_without_is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the number of features per frame.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0[0].len()
    }

    /// Halve the resolution by averaging consecutive pairs of frames.
    ///
    /// An odd trailing frame is carried over unchanged, so the result has
    /// `ceil(len / 2)` frames.
    #[must_use = "returns a new coarsened series; the input is left unchanged"]
    pub fn downsample(&self) -> Self {
        self.as_view().downsample()
    }

    /// Consume and return the inner frames.
    #[must_use]
    pub fn into_inner(self) -> Vec<Vec<T>> {
        self.0
    }
}

impl<T: Real> TryFrom<Vec<Vec<T>>> for Series<T> {
    type Error = AlignError;

    fn try_from(frames: Vec<Vec<T>>) -> Result<Self, Self::Error> {
        Self::new(frames)
    }
}

impl<T> AsRef<[Vec<T>]> for Series<T> {
    fn as_ref(&self) -> &[Vec<T>] {
        &self.0
    }
}

/// Borrowed, validated view into a series. Zero-copy reference.
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a, T>(&'a [Vec<T>]);

impl<'a, T: Real> SeriesView<'a, T> {
    /// Create a new view, validating the frames.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Series::new`].
    pub fn new(frames: &'a [Vec<T>]) -> Result<Self, AlignError> {
        validate(frames)?;
        Ok(Self(frames))
    }

    /// Return the underlying frames.
    #[must_use]
    pub fn frames(&self) -> &'a [Vec<T>] {
        self.0
    }

    /// Return the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the view has no frames. Always `false` for valid views.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the number of features per frame.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0[0].len()
    }

    /// Halve the resolution by averaging consecutive pairs of frames.
    #[must_use = "returns a new coarsened series; the input is left unchanged"]
    pub fn downsample(&self) -> Series<T> {
        let half = T::one() / (T::one() + T::one());
        let coarse = self
            .0
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => a.iter().zip(b).map(|(&x, &y)| x * half + y * half).collect(),
                [a] => a.clone(),
                _ => unreachable!("chunks(2) yields one or two frames"),
            })
            .collect();
        // Averages of finite frames with a shared dimension stay valid.
        Series(coarse)
    }
}

impl<T> Index<usize> for SeriesView<'_, T> {
    type Output = [T];

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> AsRef<[Vec<T>]> for SeriesView<'_, T> {
    fn as_ref(&self) -> &[Vec<T>] {
        self.0
    }
}

fn validate<T: Real>(frames: &[Vec<T>]) -> Result<(), AlignError> {
    let first = frames.first().ok_or(AlignError::EmptySeries)?;
    let expected = first.len();
    for (index, frame) in frames.iter().enumerate() {
        if frame.is_empty() {
            return Err(AlignError::EmptyFrame { index });
        }
        if frame.len() != expected {
            return Err(AlignError::InconsistentDimension {
                index,
                expected,
                got: frame.len(),
            });
        }
        if let Some(feature) = frame.iter().position(|v| !v.is_finite()) {
            return Err(AlignError::NonFiniteValue {
                frame: index,
                feature,
            });
        }
    }
    Ok(())
}

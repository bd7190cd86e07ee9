//! Euclidean frame distance and the numeric trait shared by the engine.

use std::fmt::Debug;

use num_traits::Float;

use crate::error::AlignError;

/// Real-number element type used throughout one alignment call.
///
/// Implemented for every [`Float`] that is also `Debug + Send + Sync`, which
/// in practice means `f32` and `f64`.
pub trait Real: Float + Debug + Send + Sync + 'static {}

impl<T> Real for T where T: Float + Debug + Send + Sync + 'static {}

/// Euclidean distance between two equal-length vectors.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AlignError::LengthMismatch`] | `a.len() != b.len()` |
pub fn euclidean<T: Real>(a: &[T], b: &[T]) -> Result<T, AlignError> {
    if a.len() != b.len() {
        return Err(AlignError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(euclidean_unchecked(a, b))
}

/// Euclidean distance without the length check. Callers guarantee equal lengths.
#[inline]
pub(crate) fn euclidean_unchecked<T: Real>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (&x, &y)| {
            let d = x - y;
            acc + d * d
        })
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_zero_apart() {
        let a = [1.5, -2.0, 3.25];
        assert_eq!(euclidean(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn three_four_five() {
        let d = euclidean(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0_f64).abs() < 1e-12);
    }

    #[test]
    fn single_precision() {
        let d = euclidean(&[1.0_f32], &[-1.0_f32]).unwrap();
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = euclidean(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(err, AlignError::LengthMismatch { left: 2, right: 1 });
    }

    #[test]
    fn empty_vectors_are_zero_apart() {
        let empty: [f64; 0] = [];
        assert_eq!(euclidean(&empty, &empty).unwrap(), 0.0);
    }
}

//! Error types for series validation and alignment.

/// Errors from distance computation, series validation, and alignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignError {
    /// Returned when two vectors of different length are compared.
    #[error("cannot compare vectors of length {left} and {right}")]
    LengthMismatch {
        /// Length of the first vector.
        left: usize,
        /// Length of the second vector.
        right: usize,
    },

    /// Returned when a series contains no frames.
    #[error("series must contain at least one frame")]
    EmptySeries,

    /// Returned when a frame has zero features.
    #[error("frame {index} has no features")]
    EmptyFrame {
        /// Position of the empty frame.
        index: usize,
    },

    /// Returned when a frame's dimension differs from the first frame.
    #[error("frame {index} has {got} features, expected {expected}")]
    InconsistentDimension {
        /// Position of the offending frame.
        index: usize,
        /// Dimension of frame 0.
        expected: usize,
        /// Dimension of the offending frame.
        got: usize,
    },

    /// Returned when a frame contains NaN, infinity, or negative infinity.
    #[error("non-finite value at frame {frame}, feature {feature}")]
    NonFiniteValue {
        /// Position of the frame.
        frame: usize,
        /// Position of the feature within the frame.
        feature: usize,
    },

    /// Returned when a search window cannot carry an alignment of the given series.
    #[error("invalid search window: {reason}")]
    InvalidWindow {
        /// Human-readable description of the defect.
        reason: String,
    },

    /// Returned when a coarse path is empty or does not fit the coarse grid.
    #[error("invalid coarse path: {reason}")]
    InvalidCoarsePath {
        /// Human-readable description of the defect.
        reason: String,
    },
}

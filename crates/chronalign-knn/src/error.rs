use std::path::PathBuf;

use chronalign_dtw::AlignError;

/// Errors from classifier training, prediction, and model persistence.
#[derive(Debug, thiserror::Error)]
pub enum KnnError {
    /// Returned when k is zero.
    #[error("k must be at least 1, got {k}")]
    InvalidK {
        /// The invalid k value provided.
        k: usize,
    },

    /// Returned when a classifier is configured to read no input features.
    #[error("a classifier must read at least one input feature")]
    NoInputs,

    /// Returned when classification is attempted before any example is stored.
    #[error("no training examples have been added")]
    EmptyTrainingSet,

    /// Returned when an example has a different number of features than expected.
    #[error("example {example_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the example.
        got: usize,
        /// The zero-based index of the offending example.
        example_index: usize,
    },

    /// Returned when an example has a different number of labels than expected.
    #[error("example {example_index} has {got} labels, expected {expected}")]
    LabelCountMismatch {
        /// The expected number of labels.
        expected: usize,
        /// The actual number of labels in the example.
        got: usize,
        /// The zero-based index of the offending example.
        example_index: usize,
    },

    /// Returned when an input vector is too short for the configured feature selection.
    #[error("input feature {index} requested but the input has only {len} values")]
    InputTooShort {
        /// The selected feature index that is out of range.
        index: usize,
        /// Length of the input vector.
        len: usize,
    },

    /// Returned when a template's frame dimension differs from the stored templates.
    #[error("template has {got} features per frame, expected {expected}")]
    TemplateDimensionMismatch {
        /// Dimension of the stored templates.
        expected: usize,
        /// Dimension of the rejected template.
        got: usize,
    },

    /// Wraps an alignment or distance error.
    #[error("alignment error: {0}")]
    Align(#[from] AlignError),

    /// Returned when a deserialized model violates classifier invariants.
    #[error("invalid model: {reason}")]
    InvalidModel {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when model text cannot be parsed.
    #[error("failed to parse model JSON")]
    ParseModel {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the document.
        found: u32,
    },
}

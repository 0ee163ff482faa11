use std::path::PathBuf;

/// Broad category of a [`CartError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The training data is unusable.
    InvalidInput,
    /// A hyperparameter is outside its allowed range.
    InvalidHyperparameter,
    /// A prediction row is too short for the features a model references.
    IndexOutOfRange,
    /// Saving, loading, exporting, or importing a model failed.
    Persistence,
}

/// Errors from tree and forest construction, prediction, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// Returned when the dataset has zero rows.
    #[error("dataset has zero rows")]
    EmptyDataset,

    /// Returned when a row has no feature column in front of its label.
    #[error("row {row_index} has {len} values, need at least 2 (one feature and the label)")]
    RowTooShort {
        /// The zero-based index of the offending row.
        row_index: usize,
        /// Number of values in the row.
        len: usize,
    },

    /// Returned when a row has a different length than the first row.
    #[error("row {row_index} has {got} values, expected {expected}")]
    InconsistentRowLength {
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        got: usize,
        /// The zero-based index of the offending row.
        row_index: usize,
    },

    /// Returned when a value is NaN or infinite.
    #[error("non-finite value at row {row_index}, column {column}")]
    NonFiniteValue {
        /// The zero-based index of the offending row.
        row_index: usize,
        /// The zero-based column (the label is the last column).
        column: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_size is zero.
    #[error("min_size must be at least 1, got {min_size}")]
    InvalidMinSize {
        /// The invalid min_size value provided.
        min_size: usize,
    },

    /// Returned when feature_num is 0 or exceeds n_features.
    #[error("feature_num is {feature_num}, but must be in [1, {n_features}]")]
    InvalidFeatureCount {
        /// The requested subspace size.
        feature_num: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when sample_ratio is not in (0.0, 1.0].
    #[error("sample_ratio must be in (0.0, 1.0], got {ratio}")]
    InvalidSampleRatio {
        /// The invalid ratio provided.
        ratio: f64,
    },

    /// Returned when a prediction row does not reach every feature the model uses.
    #[error("prediction row has {got} values, model needs at least {required}")]
    RowTooShortForModel {
        /// Minimum row length the model needs.
        required: usize,
        /// Length of the prediction row.
        got: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
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
        /// The format version this build expects.
        expected: u32,
        /// The format version found in the input.
        found: u32,
    },

    /// Returned when a tree cannot be encoded as JSON.
    #[error("failed to export tree as JSON")]
    ExportTree {
        /// The underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when a JSON tree document cannot be decoded.
    #[error("failed to import tree from JSON")]
    ImportTree {
        /// The underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when a decoded tree document is structurally invalid.
    #[error("invalid tree document: {reason}")]
    InvalidTreeDocument {
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Returned when a decoded model fails structural checks.
    #[error("corrupt model: {reason}")]
    CorruptModel {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl CartError {
    /// Return the category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::EmptyDataset
            | CartError::RowTooShort { .. }
            | CartError::InconsistentRowLength { .. }
            | CartError::NonFiniteValue { .. } => ErrorKind::InvalidInput,
            CartError::InvalidMaxDepth { .. }
            | CartError::InvalidMinSize { .. }
            | CartError::InvalidFeatureCount { .. }
            | CartError::InvalidTreeCount { .. }
            | CartError::InvalidSampleRatio { .. } => ErrorKind::InvalidHyperparameter,
            CartError::RowTooShortForModel { .. } => ErrorKind::IndexOutOfRange,
            CartError::SerializeModel { .. }
            | CartError::DeserializeModel { .. }
            | CartError::WriteModel { .. }
            | CartError::ReadModel { .. }
            | CartError::IncompatibleModelVersion { .. }
            | CartError::ExportTree { .. }
            | CartError::ImportTree { .. }
            | CartError::InvalidTreeDocument { .. }
            | CartError::CorruptModel { .. } => ErrorKind::Persistence,
        }
    }
}

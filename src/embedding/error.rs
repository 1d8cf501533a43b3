use std::path::PathBuf;
use thiserror::Error;

use crate::dice::DiceError;

/// Input-validation, encoding and layout failures.
///
/// None of these are retried: they describe caller input or configuration problems.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("features cannot be empty")]
    EmptyInput,

    #[error("null values are not allowed: {keys:?}")]
    NullValues { keys: Vec<String> },

    #[error("feature values cannot be represented as text: {keys:?}")]
    Unstringifiable { keys: Vec<String> },

    #[error("input payload is missing required features: {missing:?}")]
    MissingFeatures { missing: Vec<String> },

    #[error("feature '{feature}' must be numeric; got {value}")]
    NonNumeric { feature: String, value: String },

    #[error("no baseline encoding rule for unknown feature '{feature}'")]
    UnknownFeature { feature: String },

    #[error(
        "embedding config mismatch: text={text_features}×{text_dim} + \
         numeric={numeric_features}×{numeric_dim} = {expected:?}, but input_shape={declared:?}"
    )]
    ConfigMismatch {
        text_features: usize,
        text_dim: usize,
        numeric_features: usize,
        numeric_dim: usize,
        expected: Vec<usize>,
        declared: Vec<usize>,
    },

    #[error("embedding output length mismatch: expected {expected}, got {actual}")]
    OutputLengthMismatch { expected: usize, actual: usize },

    #[error("text encoder returned {actual} vectors of width {width}, expected {expected} of width {dim}")]
    EncoderOutputMismatch {
        expected: usize,
        actual: usize,
        dim: usize,
        width: usize,
    },

    #[error("embedding strategy '{strategy}' is not implemented")]
    StrategyNotImplemented { strategy: String },

    #[error("invalid numeric encoder for '{feature}': {source}")]
    InvalidNumericEncoder {
        feature: String,
        #[source]
        source: DiceError,
    },

    #[error("text encoder model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load text encoder: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("text encoding failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid text encoder configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    /// True when the request payload is at fault; encoder, model and layout failures are not.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EmbeddingError::EmptyInput
                | EmbeddingError::NullValues { .. }
                | EmbeddingError::Unstringifiable { .. }
                | EmbeddingError::MissingFeatures { .. }
                | EmbeddingError::NonNumeric { .. }
        )
    }
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

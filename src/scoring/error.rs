use std::path::PathBuf;
use thiserror::Error;

/// Failures while building a scorer or classifier. Fatal at startup.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("unknown scorer architecture '{architecture}' (available: {available:?})")]
    UnknownArchitecture {
        architecture: String,
        available: Vec<&'static str>,
    },

    #[error("architecture '{architecture}' requires weights_path")]
    MissingWeights { architecture: String },

    #[error("scorer weights not found at path: {path}")]
    WeightsNotFound { path: PathBuf },

    #[error("failed to load scorer weights: {reason}")]
    LoadFailed { reason: String },

    #[error("risk_categories cannot be empty")]
    EmptyCategories,

    #[error("invalid risk category: {reason}")]
    InvalidCategory { reason: String },

    #[error("invalid scorer input shape {shape:?}")]
    InvalidInputShape { shape: Vec<usize> },
}

/// Failures during a forward pass. Surfaced to the caller, never retried or defaulted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("expected embedding shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("model inference failed: {reason}")]
    ForwardFailed { reason: String },

    #[error("model produced a NaN logit")]
    NanOutput,
}

impl From<candle_core::Error> for InferenceError {
    fn from(err: candle_core::Error) -> Self {
        InferenceError::ForwardFailed {
            reason: err.to_string(),
        }
    }
}

impl From<candle_core::Error> for ScoringError {
    fn from(err: candle_core::Error) -> Self {
        ScoringError::LoadFailed {
            reason: err.to_string(),
        }
    }
}

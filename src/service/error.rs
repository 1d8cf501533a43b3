use thiserror::Error;

use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use crate::explain::ExplainError;
use crate::scoring::{InferenceError, ScoringError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("scorer error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("explanation error: {0}")]
    Explain(ExplainError),

    #[error("blocking task failed: {reason}")]
    TaskFailed { reason: String },
}

impl From<ExplainError> for ServiceError {
    /// Unwraps embedding and inference failures so callers can map them uniformly.
    fn from(err: ExplainError) -> Self {
        match err {
            ExplainError::Embedding(e) => ServiceError::Embedding(e),
            ExplainError::Inference(e) => ServiceError::Inference(e),
            other => ServiceError::Explain(other),
        }
    }
}

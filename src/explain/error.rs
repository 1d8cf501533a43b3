use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::scoring::InferenceError;

#[derive(Debug, Error)]
pub enum ExplainError {
    /// Raised at construction; the service refuses to start.
    #[error("missing baseline values for features: {missing:?}")]
    MissingBaselines { missing: Vec<String> },

    #[error("baseline for '{feature}' cannot be encoded: {source}")]
    BaselineEncoding {
        feature: String,
        #[source]
        source: EmbeddingError,
    },

    #[error("baseline slice for '{feature}' does not fit the embedding")]
    SliceOutOfBounds { feature: String },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("ablation worker panicked")]
    WorkerPanicked,
}

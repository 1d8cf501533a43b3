use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
/// Errors returned by prediction stores.
pub enum StoreError {
    /// No record with this id.
    #[error("prediction not found: {id}")]
    NotFound { id: Uuid },

    /// A staged insert reuses an existing id.
    #[error("prediction already exists: {id}")]
    Duplicate { id: Uuid },

    /// Pagination or filter parameters out of range.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Backend failure.
    #[error("store backend error: {message}")]
    Backend { message: String },
}

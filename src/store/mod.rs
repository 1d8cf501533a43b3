//! Prediction persistence.
//!
//! The risk pipeline never reads from here; the gateway writes finished predictions and
//! explanations through a [`StoreTransaction`] and serves lookups, listings and neighbour
//! queries back out.

pub mod error;
pub mod memory;
pub mod types;


pub use error::StoreError;
pub use memory::{InMemoryPredictionStore, MemoryTransaction};
pub use types::{
    DEFAULT_PAGE_SIZE, ListQuery, MAX_NEIGHBOURS, MAX_PAGE_SIZE, Metric, Neighbour,
    PredictionRecord, cosine_similarity,
};

use std::future::Future;

use uuid::Uuid;

use crate::explain::ExplanationResult;

/// Staged writes; applied together on [`commit`](StoreTransaction::commit).
///
/// Dropping a transaction without committing discards everything staged.
pub trait StoreTransaction: Send {
    fn insert(&mut self, record: PredictionRecord);

    /// Sets the explanation (and `explained_at`) on an existing or staged record.
    fn attach_explanation(&mut self, id: Uuid, explanation: ExplanationResult);

    /// Applies every staged write or none of them.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Async persistence interface used by the gateway.
pub trait PredictionStore: Send + Sync {
    type Transaction: StoreTransaction;

    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, StoreError>> + Send;

    fn get(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<PredictionRecord>, StoreError>> + Send;

    /// One page of records matching `query`, newest first.
    fn list(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Vec<PredictionRecord>, StoreError>> + Send;

    /// Up to `k` records closest to `id`'s embedding, nearest first, excluding `id` itself.
    fn nearest(
        &self,
        id: Uuid,
        k: usize,
        metric: Metric,
    ) -> impl Future<Output = Result<Vec<Neighbour>, StoreError>> + Send;
}

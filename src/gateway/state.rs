use std::sync::Arc;

use crate::config::DEFAULT_MAX_BATCH;
use crate::service::RiskService;
use crate::store::PredictionStore;

#[derive(Clone)]
pub struct HandlerState<S: PredictionStore + Clone + 'static> {
    pub service: Arc<RiskService>,

    pub store: S,

    /// Upper bound on `POST /predict/batch` items.
    pub max_batch: usize,
}

impl<S> HandlerState<S>
where
    S: PredictionStore + Clone + 'static,
{
    pub fn new(service: Arc<RiskService>, store: S) -> Self {
        Self::with_max_batch(service, store, DEFAULT_MAX_BATCH)
    }

    pub fn with_max_batch(service: Arc<RiskService>, store: S, max_batch: usize) -> Self {
        Self {
            service,
            store,
            max_batch,
        }
    }
}

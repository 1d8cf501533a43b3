use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::explain::ExplanationResult;

use super::error::StoreError;
use super::types::{ListQuery, MAX_NEIGHBOURS, Metric, Neighbour, PredictionRecord};
use super::{PredictionStore, StoreTransaction};

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, Stored>,
    next_seq: u64,
}

#[derive(Debug)]
struct Stored {
    /// Commit order; breaks timestamp ties in listings.
    seq: u64,
    record: PredictionRecord,
}

/// Process-local store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPredictionStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PredictionStore for InMemoryPredictionStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        Ok(MemoryTransaction {
            records: Arc::clone(&self.records),
            staged: Vec::new(),
            committed: false,
        })
    }

    async fn get(&self, id: Uuid) -> Result<Option<PredictionRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .by_id
            .get(&id)
            .map(|stored| stored.record.clone()))
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<PredictionRecord>, StoreError> {
        query.validate()?;

        let records = self.records.read();
        let mut matching: Vec<&Stored> = records
            .by_id
            .values()
            .filter(|stored| query.matches(&stored.record))
            .collect();
        matching.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(matching
            .into_iter()
            .skip(query.offset())
            .take(query.page_size as usize)
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn nearest(
        &self,
        id: Uuid,
        k: usize,
        metric: Metric,
    ) -> Result<Vec<Neighbour>, StoreError> {
        let records = self.records.read();
        let anchor = records
            .by_id
            .get(&id)
            .ok_or(StoreError::NotFound { id })?;

        if !(1..=MAX_NEIGHBOURS).contains(&k) {
            return Err(StoreError::InvalidQuery {
                reason: format!("k must be between 1 and {MAX_NEIGHBOURS}"),
            });
        }

        let anchor = &anchor.record.embedding;
        let mut neighbours: Vec<Neighbour> = records
            .by_id
            .values()
            .filter(|stored| stored.record.id != id)
            .filter(|stored| stored.record.embedding.len() == anchor.len())
            .map(|stored| Neighbour {
                id: stored.record.id,
                risk_level: stored.record.risk_level,
                risk_score: stored.record.risk_score,
                distance: metric.distance(anchor, &stored.record.embedding),
            })
            .collect();

        neighbours.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbours.truncate(k);
        Ok(neighbours)
    }
}

#[derive(Debug)]
enum Staged {
    Insert(PredictionRecord),
    Explain {
        id: Uuid,
        explanation: ExplanationResult,
    },
}

/// Transaction over an [`InMemoryPredictionStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    records: Arc<RwLock<Records>>,
    staged: Vec<Staged>,
    committed: bool,
}

impl MemoryTransaction {
    pub fn staged(&self) -> usize {
        self.staged.len()
    }
}

impl StoreTransaction for MemoryTransaction {
    fn insert(&mut self, record: PredictionRecord) {
        self.staged.push(Staged::Insert(record));
    }

    fn attach_explanation(&mut self, id: Uuid, explanation: ExplanationResult) {
        self.staged.push(Staged::Explain { id, explanation });
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        let mut records = self.records.write();

        // Validate everything before touching the map.
        let mut pending: HashSet<Uuid> = HashSet::new();
        for write in &staged {
            match write {
                Staged::Insert(record) => {
                    if records.by_id.contains_key(&record.id) || !pending.insert(record.id) {
                        debug!(id = %record.id, "Rolling back transaction on duplicate id");
                        return Err(StoreError::Duplicate { id: record.id });
                    }
                }
                Staged::Explain { id, .. } => {
                    if !records.by_id.contains_key(id) && !pending.contains(id) {
                        debug!(%id, "Rolling back transaction on unknown id");
                        return Err(StoreError::NotFound { id: *id });
                    }
                }
            }
        }

        let writes = staged.len();
        let now = Utc::now();
        for write in staged {
            match write {
                Staged::Insert(record) => {
                    let seq = records.next_seq;
                    records.next_seq += 1;
                    records.by_id.insert(record.id, Stored { seq, record });
                }
                Staged::Explain { id, explanation } => {
                    if let Some(stored) = records.by_id.get_mut(&id) {
                        stored.record.explanation = Some(explanation);
                        stored.record.explained_at = Some(now);
                    }
                }
            }
        }

        self.committed = true;
        debug!(writes, "Committed transaction");
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.committed && !self.staged.is_empty() {
            debug!(
                staged = self.staged.len(),
                "Rolling back uncommitted transaction"
            );
        }
    }
}

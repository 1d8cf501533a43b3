use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embedding::{Embedding, FeatureMap};
use crate::explain::ExplanationResult;
use crate::scoring::{PredictionResult, RiskLevel};

use super::error::StoreError;

/// Default `page_size` for listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Largest accepted `page_size`.
pub const MAX_PAGE_SIZE: u32 = 200;
/// Largest accepted `k` for neighbour queries.
pub const MAX_NEIGHBOURS: usize = 50;

/// A persisted prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    /// Raw input payload.
    pub features: FeatureMap,
    /// Flattened embedding the score was computed from.
    pub embedding: Vec<f32>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub explanation: Option<ExplanationResult>,
    pub explained_at: Option<DateTime<Utc>>,
}

impl PredictionRecord {
    /// Fresh record with a random id, stamped now.
    pub fn new(features: FeatureMap, embedding: Embedding, result: &PredictionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: result.model.clone(),
            timestamp: Utc::now(),
            features,
            embedding: embedding.into_values(),
            risk_score: result.risk_score,
            risk_level: result.risk_level,
            explanation: None,
            explained_at: None,
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Listing parameters; newest records come first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub score_min: Option<f64>,
    #[serde(default)]
    pub score_max: Option<f64>,
    /// Id of the model that produced the record.
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            risk_level: None,
            score_min: None,
            score_max: None,
            model: None,
        }
    }
}

impl ListQuery {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.page == 0 {
            return Err(StoreError::InvalidQuery {
                reason: "page must be >= 1".to_string(),
            });
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(StoreError::InvalidQuery {
                reason: format!("page_size must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
        Ok(())
    }

    /// Records skipped before this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }

    pub fn matches(&self, record: &PredictionRecord) -> bool {
        self.risk_level.is_none_or(|level| record.risk_level == level)
            && self.score_min.is_none_or(|min| record.risk_score >= min)
            && self.score_max.is_none_or(|max| record.risk_score <= max)
            && self.model.as_deref().is_none_or(|model| record.model == model)
    }
}

/// Distance used by neighbour queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Euclidean,
    /// `1 - cosine similarity`.
    Cosine,
}

impl Metric {
    pub fn distance(self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Metric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = f64::from(*x) - f64::from(*y);
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            Metric::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }
}

/// Zero for mismatched lengths or a zero-norm side.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// One neighbour of an anchor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbour {
    pub id: Uuid,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub distance: f64,
}

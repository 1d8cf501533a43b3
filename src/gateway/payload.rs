use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embedding::FeatureMap;
use crate::scoring::{PredictionResult, RiskCategory, RiskLevel};
use crate::store::Neighbour;

/// Default `k` for `GET /predictions/{id}/nearest`.
pub const DEFAULT_NEIGHBOURS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: FeatureMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub items: Vec<PredictRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub record_id: Uuid,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub model: String,
    pub version: String,
}

impl PredictResponse {
    pub fn new(record_id: Uuid, result: PredictionResult) -> Self {
        Self {
            record_id,
            risk_level: result.risk_level,
            risk_score: result.risk_score,
            model: result.model,
            version: result.version,
        }
    }
}

/// Optional body of `POST /predictions/{id}/explain`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExplainRecordRequest {
    #[serde(default)]
    pub overwrite: bool,
}

fn default_neighbours() -> usize {
    DEFAULT_NEIGHBOURS
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NearestQuery {
    #[serde(default = "default_neighbours")]
    pub k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestResponse {
    pub euclidean: Vec<Neighbour>,
    pub cosine: Vec<Neighbour>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub status: String,
    pub feature_order: Vec<String>,
    pub risk_categories: Vec<RiskCategory>,
    pub active_model: String,
    pub version: String,
    pub explanation_type: String,
    pub strategy: String,
    pub input_shape: Vec<usize>,
}

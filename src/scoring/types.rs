use serde::{Deserialize, Serialize};

use super::classifier::RiskLevel;

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_level: RiskLevel,
    /// Probability rounded to four decimals.
    pub risk_score: f64,
    /// Id of the model that produced the score.
    pub model: String,
    pub version: String,
}

/// Unrounded probability and its category, as used internally by the explainer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    pub probability: f64,
    pub risk_level: RiskLevel,
}

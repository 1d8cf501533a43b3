use std::sync::Arc;

use tracing::{debug, error};

use crate::constants::RISK_SCORE_DECIMALS;
use crate::embedding::Embedding;

use super::classifier::RiskClassifier;
use super::error::InferenceError;
use super::scorer::{RiskScorer, sigmoid};
use super::types::{PredictionResult, RawPrediction};

/// Scorer plus classifier behind a strict input-shape check.
#[derive(Clone)]
pub struct Predictor {
    scorer: Arc<dyn RiskScorer>,
    classifier: RiskClassifier,
    input_shape: Vec<usize>,
    model: String,
    version: String,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("architecture", &self.scorer.architecture())
            .field("classifier", &self.classifier)
            .field("input_shape", &self.input_shape)
            .field("model", &self.model)
            .field("version", &self.version)
            .finish()
    }
}

impl Predictor {
    pub fn new(
        scorer: Arc<dyn RiskScorer>,
        classifier: RiskClassifier,
        input_shape: Vec<usize>,
        model: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            scorer,
            classifier,
            input_shape,
            model: model.into(),
            version: version.into(),
        }
    }

    /// Scores and classifies without rounding.
    pub fn predict_raw(&self, embedding: &Embedding) -> Result<RawPrediction, InferenceError> {
        if embedding.shape() != self.input_shape.as_slice() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.input_shape.clone(),
                actual: embedding.shape().to_vec(),
            });
        }

        let logit = self
            .scorer
            .forward(embedding.values(), embedding.shape())
            .inspect_err(|e| error!(error = %e, "Model inference failed"))?;
        if logit.is_nan() {
            error!("Model inference produced NaN");
            return Err(InferenceError::NanOutput);
        }

        let probability = sigmoid(logit);
        let risk_level = self.classifier.classify(probability);
        debug!(probability, risk_level, "Predicted probability");

        Ok(RawPrediction {
            probability,
            risk_level,
        })
    }

    /// Scores, classifies on the raw probability and reports the rounded score.
    pub fn predict(&self, embedding: &Embedding) -> Result<PredictionResult, InferenceError> {
        let raw = self.predict_raw(embedding)?;
        Ok(PredictionResult {
            risk_level: raw.risk_level,
            risk_score: round_score(raw.probability),
            model: self.model.clone(),
            version: self.version.clone(),
        })
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn architecture(&self) -> &str {
        self.scorer.architecture()
    }
}

/// Rounds a probability to the reported precision.
pub fn round_score(p: f64) -> f64 {
    let scale = 10f64.powi(RISK_SCORE_DECIMALS);
    (p * scale).round() / scale
}

//! The assembled risk pipeline: embed → predict → explain, shared across requests.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ServiceError;

use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, ModelConfig};
use crate::embedding::device::select_device;
use crate::embedding::{Embedding, EmbeddingAssembler, EmbeddingStrategy, FeatureMap, TextEncoder};
use crate::explain::{CounterfactualExplainer, ExplainerConfig, ExplanationResult};
use crate::scoring::{
    PredictionResult, Predictor, RiskCategory, RiskClassifier, RiskScorer, ScorerSpec,
    build_scorer,
};

/// Embedding assembler, predictor and explainer for one model.
///
/// Read-only after construction; wrap in an `Arc` and share freely.
#[derive(Debug)]
pub struct RiskService {
    assembler: Arc<EmbeddingAssembler>,
    predictor: Arc<Predictor>,
    explainer: Arc<CounterfactualExplainer>,
}

impl RiskService {
    /// Builds the pipeline for `model_id`.
    ///
    /// Order matters: the assembler checks its layout against `input_shape` before any weights
    /// load, and the explainer encodes every baseline before the service is returned.
    pub fn from_config(
        app: &AppConfig,
        model_id: &str,
        model: &ModelConfig,
        encoder: Arc<dyn TextEncoder>,
    ) -> Result<Self, ServiceError> {
        let assembler = EmbeddingAssembler::new(encoder, model.assembler_settings())?;

        let device = select_device();
        let scorer = build_scorer(&ScorerSpec {
            architecture: &model.architecture,
            weights_path: model.weights_path.as_deref(),
            input_shape: &model.input_shape,
            device: &device,
        })?;

        let baselines = model.baselines(model_id)?;

        let service = Self::assemble(
            assembler,
            scorer,
            app.service.risk_categories.clone(),
            &baselines,
            Metadata {
                model: model_id,
                version: &app.service.version,
            },
            ExplainerConfig {
                explanation_type: app.active_explanation_strategy.clone(),
                parallel_trials: app.service.explain_parallelism,
            },
        )?;

        info!(
            model = model_id,
            architecture = %model.architecture,
            strategy = %service.strategy(),
            features = service.expected_feature_count(),
            input_shape = ?service.input_shape(),
            "Risk service ready"
        );
        Ok(service)
    }

    /// Wires already-built parts together.
    pub fn assemble(
        assembler: EmbeddingAssembler,
        scorer: Arc<dyn RiskScorer>,
        categories: Vec<RiskCategory>,
        baselines: &FeatureMap,
        metadata: Metadata<'_>,
        explainer: ExplainerConfig,
    ) -> Result<Self, ServiceError> {
        let assembler = Arc::new(assembler);
        let predictor = Arc::new(Predictor::new(
            scorer,
            RiskClassifier::new(categories)?,
            assembler.input_shape().to_vec(),
            metadata.model,
            metadata.version,
        ));
        let explainer = Arc::new(CounterfactualExplainer::new(
            Arc::clone(&assembler),
            Arc::clone(&predictor),
            baselines,
            explainer,
        )?);

        Ok(Self {
            assembler,
            predictor,
            explainer,
        })
    }

    pub fn embed(&self, features: &FeatureMap) -> Result<Embedding, ServiceError> {
        Ok(self.assembler.embed(features)?)
    }

    pub fn predict(&self, embedding: &Embedding) -> Result<PredictionResult, ServiceError> {
        Ok(self.predictor.predict(embedding)?)
    }

    /// Embeds and predicts; the embedding is returned for persistence.
    pub fn predict_features(
        &self,
        features: &FeatureMap,
    ) -> Result<(Embedding, PredictionResult), ServiceError> {
        let embedding = self.embed(features)?;
        let result = self.predict(&embedding)?;
        Ok((embedding, result))
    }

    /// Runs the counterfactual search on the calling thread.
    pub fn explain(&self, features: &FeatureMap) -> Result<ExplanationResult, ServiceError> {
        Ok(self.explainer.explain(features)?)
    }

    /// Runs [`explain`](Self::explain) on the blocking pool.
    pub async fn explain_blocking(
        &self,
        features: FeatureMap,
    ) -> Result<ExplanationResult, ServiceError> {
        let explainer = Arc::clone(&self.explainer);
        let result = tokio::task::spawn_blocking(move || explainer.explain(&features))
            .await
            .map_err(|e| ServiceError::TaskFailed {
                reason: e.to_string(),
            })?;
        Ok(result?)
    }

    /// Canonical feature order (text features, then numeric).
    pub fn feature_order(&self) -> Vec<String> {
        self.assembler.space().names().map(String::from).collect()
    }

    pub fn expected_feature_count(&self) -> usize {
        self.assembler.space().len()
    }

    pub fn categories(&self) -> &[RiskCategory] {
        self.predictor.classifier().categories()
    }

    pub fn model(&self) -> &str {
        self.predictor.model()
    }

    pub fn version(&self) -> &str {
        self.predictor.version()
    }

    pub fn architecture(&self) -> &str {
        self.predictor.architecture()
    }

    pub fn explanation_type(&self) -> &str {
        &self.explainer.config().explanation_type
    }

    pub fn strategy(&self) -> EmbeddingStrategy {
        self.assembler.strategy()
    }

    pub fn input_shape(&self) -> &[usize] {
        self.assembler.input_shape()
    }
}

/// Identity reported on every prediction.
#[derive(Debug, Clone, Copy)]
pub struct Metadata<'a> {
    pub model: &'a str,
    pub version: &'a str,
}

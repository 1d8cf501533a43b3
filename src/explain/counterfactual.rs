use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::{DEFAULT_EXPLANATION_TYPE, NO_SINGLE_DRIVER_NOTE};
use crate::embedding::{Embedding, EmbeddingAssembler, FeatureMap, FeatureSlice};
use crate::scoring::Predictor;

use super::baseline::BaselineProfile;
use super::error::ExplainError;
use super::types::ExplanationResult;

#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    /// Reported as `explanation_type`.
    pub explanation_type: String,
    /// Worker threads for the ablation loop; `0` or `1` runs trials sequentially.
    pub parallel_trials: usize,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            explanation_type: DEFAULT_EXPLANATION_TYPE.to_string(),
            parallel_trials: 0,
        }
    }
}

/// Single-feature counterfactual search.
///
/// For a non-trivial prediction, each feature's slice is reset to its baseline in turn; a
/// feature is a driver iff that one reset moves the prediction to the lowest category. Costs
/// one scorer call for a low-risk input and `1 + |features|` otherwise.
#[derive(Debug)]
pub struct CounterfactualExplainer {
    assembler: Arc<EmbeddingAssembler>,
    predictor: Arc<Predictor>,
    baselines: BaselineProfile,
    config: ExplainerConfig,
}

impl CounterfactualExplainer {
    /// Encodes the baselines up front; a missing baseline fails construction.
    pub fn new(
        assembler: Arc<EmbeddingAssembler>,
        predictor: Arc<Predictor>,
        baselines: &FeatureMap,
        config: ExplainerConfig,
    ) -> Result<Self, ExplainError> {
        let baselines = BaselineProfile::build(&assembler, baselines)?;
        Ok(Self {
            assembler,
            predictor,
            baselines,
            config,
        })
    }

    /// Embeds `features` and explains the prediction.
    pub fn explain(&self, features: &FeatureMap) -> Result<ExplanationResult, ExplainError> {
        let embedding = self.assembler.embed(features)?;
        self.explain_embedding(&embedding)
    }

    /// Explains an already-assembled embedding.
    pub fn explain_embedding(
        &self,
        embedding: &Embedding,
    ) -> Result<ExplanationResult, ExplainError> {
        let initial = self.predictor.predict_raw(embedding)?;
        let classifier = self.predictor.classifier();

        if classifier.is_lowest(initial.risk_level) {
            info!("Prediction is low risk, no explanation needed");
            return Ok(self.result(Vec::new(), String::new()));
        }

        let risk_drivers = if self.config.parallel_trials > 1 {
            self.risk_drivers_parallel(embedding, self.config.parallel_trials)?
        } else {
            self.risk_drivers(embedding, self.baselines.entries())?
        };

        let notes = if risk_drivers.is_empty() {
            NO_SINGLE_DRIVER_NOTE.to_string()
        } else {
            String::new()
        };

        info!(
            risk_level = initial.risk_level,
            drivers = risk_drivers.len(),
            "Generated explanation"
        );
        Ok(self.result(risk_drivers, notes))
    }

    fn result(&self, risk_drivers: Vec<String>, notes: String) -> ExplanationResult {
        ExplanationResult {
            explanation_type: self.config.explanation_type.clone(),
            risk_drivers,
            notes,
        }
    }

    fn risk_drivers(
        &self,
        embedding: &Embedding,
        entries: &[(FeatureSlice, Vec<f32>)],
    ) -> Result<Vec<String>, ExplainError> {
        let mut drivers = Vec::new();
        for (slice, baseline) in entries {
            if self.clears_risk(embedding, slice, baseline)? {
                drivers.push(slice.name.clone());
            }
        }
        Ok(drivers)
    }

    fn risk_drivers_parallel(
        &self,
        embedding: &Embedding,
        workers: usize,
    ) -> Result<Vec<String>, ExplainError> {
        let entries = self.baselines.entries();
        let chunk_size = entries.len().div_ceil(workers).max(1);

        let per_chunk: Vec<Result<Vec<String>, ExplainError>> = std::thread::scope(|s| {
            let handles: Vec<_> = entries
                .chunks(chunk_size)
                .map(|chunk| s.spawn(move || self.risk_drivers(embedding, chunk)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|_| Err(ExplainError::WorkerPanicked)))
                .collect()
        });

        // Chunks are contiguous and joined in spawn order, so canonical order is preserved.
        let mut drivers = Vec::new();
        for chunk in per_chunk {
            drivers.extend(chunk?);
        }
        Ok(drivers)
    }

    fn clears_risk(
        &self,
        embedding: &Embedding,
        slice: &FeatureSlice,
        baseline: &[f32],
    ) -> Result<bool, ExplainError> {
        let trial = embedding
            .with_slice(slice, baseline)
            .ok_or_else(|| ExplainError::SliceOutOfBounds {
                feature: slice.name.clone(),
            })?;
        let outcome = self.predictor.predict_raw(&trial)?;
        let cleared = self.predictor.classifier().is_lowest(outcome.risk_level);
        debug!(
            feature = %slice.name,
            probability = outcome.probability,
            cleared,
            "Ablation trial"
        );
        Ok(cleared)
    }

    pub fn baselines(&self) -> &BaselineProfile {
        &self.baselines
    }

    pub fn config(&self) -> &ExplainerConfig {
        &self.config
    }
}

//! Static architecture table: config key to scorer constructor.

use std::path::Path;
use std::sync::Arc;

use candle_core::Device;
use tracing::{info, warn};

use super::cnn::{Cnn2dScorer, CnnScorer};
use super::error::ScoringError;
use super::mlp::MlpScorer;
use super::scorer::RiskScorer;
use super::stub::StubScorer;

/// What a constructor gets to build a scorer.
#[derive(Debug, Clone, Copy)]
pub struct ScorerSpec<'a> {
    pub architecture: &'a str,
    pub weights_path: Option<&'a Path>,
    pub input_shape: &'a [usize],
    pub device: &'a Device,
}

type Constructor = fn(&ScorerSpec<'_>) -> Result<Arc<dyn RiskScorer>, ScoringError>;

const ARCHITECTURES: &[(&str, Constructor)] = &[
    (MlpScorer::ARCHITECTURE, build_mlp),
    (CnnScorer::ARCHITECTURE, build_cnn),
    (Cnn2dScorer::ARCHITECTURE, build_cnn_2d),
    ("stub", build_stub),
];

/// Registered architecture keys.
pub fn architectures() -> Vec<&'static str> {
    ARCHITECTURES.iter().map(|(key, _)| *key).collect()
}

/// Builds the scorer registered under `spec.architecture`.
pub fn build_scorer(spec: &ScorerSpec<'_>) -> Result<Arc<dyn RiskScorer>, ScoringError> {
    if spec.input_shape.is_empty() || spec.input_shape.contains(&0) {
        return Err(ScoringError::InvalidInputShape {
            shape: spec.input_shape.to_vec(),
        });
    }

    let (_, constructor) = ARCHITECTURES
        .iter()
        .find(|(key, _)| *key == spec.architecture)
        .ok_or_else(|| ScoringError::UnknownArchitecture {
            architecture: spec.architecture.to_string(),
            available: architectures(),
        })?;

    let scorer = constructor(spec)?;
    info!(architecture = spec.architecture, input_shape = ?spec.input_shape, "Scorer ready");
    Ok(scorer)
}

fn required_weights<'a>(spec: &ScorerSpec<'a>) -> Result<&'a Path, ScoringError> {
    spec.weights_path.ok_or_else(|| ScoringError::MissingWeights {
        architecture: spec.architecture.to_string(),
    })
}

fn build_mlp(spec: &ScorerSpec<'_>) -> Result<Arc<dyn RiskScorer>, ScoringError> {
    let weights = required_weights(spec)?;
    let in_len = spec.input_shape.iter().product();
    Ok(Arc::new(MlpScorer::load(weights, in_len, spec.device)?))
}

fn build_cnn(spec: &ScorerSpec<'_>) -> Result<Arc<dyn RiskScorer>, ScoringError> {
    let weights = required_weights(spec)?;
    let in_len = spec.input_shape.iter().product();
    Ok(Arc::new(CnnScorer::load(weights, in_len, spec.device)?))
}

/// Expects the `[rows, cols]` layout produced by the `value_only` strategy.
fn build_cnn_2d(spec: &ScorerSpec<'_>) -> Result<Arc<dyn RiskScorer>, ScoringError> {
    let weights = required_weights(spec)?;
    Ok(Arc::new(Cnn2dScorer::load(
        weights,
        spec.input_shape,
        spec.device,
    )?))
}

fn build_stub(spec: &ScorerSpec<'_>) -> Result<Arc<dyn RiskScorer>, ScoringError> {
    if spec.weights_path.is_some() {
        warn!("Stub scorer ignores weights_path");
    }
    Ok(Arc::new(StubScorer::default()))
}

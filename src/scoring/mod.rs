//! Scoring: embedding → logit → probability → risk category.
//!
//! The [`RiskScorer`] is the opaque model. [`Predictor`] wraps it with the input-shape check
//! and the sigmoid, and hands the probability to the [`RiskClassifier`]. Scorers are
//! constructed from config through the static [`registry`].

pub mod classifier;
pub mod cnn;
pub mod error;
pub mod mlp;
pub mod predictor;
pub mod registry;
pub mod scorer;
pub mod stub;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use classifier::{RiskCategory, RiskClassifier, RiskLevel};
pub use cnn::{Cnn2dScorer, CnnScorer};
pub use error::{InferenceError, ScoringError};
pub use mlp::MlpScorer;
pub use predictor::{Predictor, round_score};
pub use registry::{ScorerSpec, build_scorer};
pub use scorer::{RiskScorer, sigmoid};
pub use stub::StubScorer;
pub use types::{PredictionResult, RawPrediction};

#[cfg(any(test, feature = "mock"))]
pub use mock::FnScorer;

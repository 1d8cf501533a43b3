//! Riskline library crate (used by the server and integration tests).
//!
//! # Pipeline
//!
//! Raw feature maps go through three read-only stages, shared across requests via `Arc`:
//!
//! 1. [`EmbeddingAssembler`] turns features into a fixed-layout vector: text features through
//!    a sentence encoder, numeric features through [`DiceEncoder`].
//! 2. [`Predictor`] runs the configured [`RiskScorer`], applies a sigmoid and maps the
//!    probability to a category with [`RiskClassifier`].
//! 3. [`CounterfactualExplainer`] resets one feature slice at a time to a baseline and reports
//!    which single resets clear the risk.
//!
//! [`RiskService`] wires the three together from an [`AppConfig`].
//!
//! ## Around the core
//! - [`config`] - environment settings and the JSON model file
//! - [`store`] - prediction persistence ([`InMemoryPredictionStore`])
//! - [`gateway`] - Axum routes over the service and store
//!
//! ## Test/Mock Support
//! Mock scorers are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod dice;
pub mod embedding;
pub mod explain;
pub mod gateway;
pub mod scoring;
pub mod service;
pub mod store;

pub use config::{AppConfig, Config, ConfigError, ModelConfig};
pub use dice::{DiceEncoder, DiceError};
pub use embedding::{
    BertTextEncoder, Embedding, EmbeddingAssembler, EmbeddingError, EmbeddingStrategy, FeatureMap,
    TextEncoder, TextEncoderConfig,
};
pub use explain::{CounterfactualExplainer, ExplainError, ExplainerConfig, ExplanationResult};
pub use gateway::{HandlerState, create_router_with_state};
pub use scoring::{
    InferenceError, PredictionResult, Predictor, RiskCategory, RiskClassifier, RiskLevel,
    RiskScorer, ScoringError,
};
pub use service::{RiskService, ServiceError};
pub use store::{InMemoryPredictionStore, PredictionRecord, PredictionStore, StoreError};

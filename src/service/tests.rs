use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::config::ConfigError;
use crate::embedding::{
    AssemblerSettings, BertTextEncoder, EmbeddingError, FeatureBounds, TextEncoderConfig,
};
use crate::explain::ExplainError;
use crate::scoring::{FnScorer, InferenceError};

const TEXT_DIM: usize = 8;
const NUMERIC_DIM: usize = 4;

fn config_json(input_len: usize, baselines: serde_json::Value) -> String {
    json!({
        "active_model": "stub_v1",
        "active_explanation_strategy": "counterfactual",
        "service": {
            "version": "2.1.0",
            "risk_categories": [
                {"code": 2, "upper_bound": 1.0},
                {"code": 0, "upper_bound": 0.4},
                {"code": 1, "upper_bound": 0.7}
            ]
        },
        "models": {
            "stub_v1": {
                "architecture": "stub",
                "input_shape": [input_len],
                "feature_bounds": {"age": [18, 100]},
                "baseline_values": baselines,
                "embedding": {
                    "strategy": "hybrid_1d",
                    "numeric_dim": NUMERIC_DIM,
                    "feature_order": ["occupation", "housing", "age"]
                }
            }
        }
    })
    .to_string()
}

fn default_baselines() -> serde_json::Value {
    json!({"occupation": "teacher", "housing": "own", "age": 45})
}

fn stub_encoder() -> Arc<dyn TextEncoder> {
    Arc::new(BertTextEncoder::load(TextEncoderConfig::stub_with_dim(TEXT_DIM)).unwrap())
}

fn build(json: &str) -> Result<RiskService, ServiceError> {
    let app = AppConfig::from_json(json, Path::new(".")).unwrap();
    let (id, model) = app.active(None).unwrap();
    RiskService::from_config(&app, id, model, stub_encoder())
}

fn service() -> RiskService {
    build(&config_json(2 * TEXT_DIM + NUMERIC_DIM, default_baselines())).unwrap()
}

fn features() -> FeatureMap {
    json!({"occupation": "welder", "housing": "rent", "age": 31})
        .as_object()
        .cloned()
        .unwrap()
}

#[test]
fn test_from_config_exposes_metadata() {
    let service = service();
    assert_eq!(service.feature_order(), ["housing", "occupation", "age"]);
    assert_eq!(service.expected_feature_count(), 3);
    assert_eq!(service.model(), "stub_v1");
    assert_eq!(service.version(), "2.1.0");
    assert_eq!(service.architecture(), "stub");
    assert_eq!(service.explanation_type(), "counterfactual");
    assert_eq!(service.strategy(), EmbeddingStrategy::Hybrid1d);
    assert_eq!(service.input_shape(), [2 * TEXT_DIM + NUMERIC_DIM]);

    let codes: Vec<u32> = service.categories().iter().map(|c| c.code).collect();
    assert_eq!(codes, [0, 1, 2]);
}

#[test]
fn test_predict_features_returns_embedding_and_result() {
    let service = service();
    let (embedding, result) = service.predict_features(&features()).unwrap();

    assert_eq!(embedding.len(), 2 * TEXT_DIM + NUMERIC_DIM);
    assert!((0.0..=1.0).contains(&result.risk_score));
    assert_eq!(result.risk_score, crate::scoring::round_score(result.risk_score));
    assert_eq!(result.model, "stub_v1");
    assert_eq!(result.version, "2.1.0");

    let again = service.predict(&embedding).unwrap();
    assert_eq!(again, result);
}

#[test]
fn test_embedding_errors_keep_their_type() {
    let service = service();
    let mut partial = features();
    partial.remove("age");

    assert!(matches!(
        service.predict_features(&partial),
        Err(ServiceError::Embedding(EmbeddingError::MissingFeatures { .. }))
    ));
    assert!(matches!(
        service.explain(&partial),
        Err(ServiceError::Embedding(EmbeddingError::MissingFeatures { .. }))
    ));
}

#[test]
fn test_input_shape_mismatch_fails_construction() {
    let err = build(&config_json(2 * TEXT_DIM + NUMERIC_DIM + 1, default_baselines())).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Embedding(EmbeddingError::ConfigMismatch { .. })
    ));
}

#[test]
fn test_missing_baseline_fails_construction() {
    let err = build(&config_json(
        2 * TEXT_DIM + NUMERIC_DIM,
        json!({"occupation": "teacher"}),
    ))
    .unwrap_err();

    match err {
        ServiceError::Explain(ExplainError::MissingBaselines { missing }) => {
            assert_eq!(missing, ["housing", "age"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_baseline_source_is_config_error() {
    let json = config_json(2 * TEXT_DIM + NUMERIC_DIM, serde_json::Value::Null);
    assert!(matches!(
        build(&json),
        Err(ServiceError::Config(ConfigError::NoBaselineSource { .. }))
    ));
}

fn assembled(scorer: Arc<FnScorer>) -> RiskService {
    let settings = AssemblerSettings {
        strategy: EmbeddingStrategy::Hybrid1d,
        feature_order: vec!["occupation".into(), "housing".into(), "age".into()],
        feature_bounds: FeatureBounds::from([("age".to_string(), (18.0, 100.0))]),
        numeric_dim: NUMERIC_DIM,
        dice_seed: 13,
        input_shape: vec![2 * TEXT_DIM + NUMERIC_DIM],
    };
    let assembler = EmbeddingAssembler::new(stub_encoder(), settings).unwrap();
    RiskService::assemble(
        assembler,
        scorer,
        vec![RiskCategory::new(0, 0.5), RiskCategory::new(1, 1.0)],
        default_baselines().as_object().unwrap(),
        Metadata {
            model: "fn_model",
            version: "0.0.1",
        },
        ExplainerConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_constant_high_risk_has_no_single_driver() {
    let scorer = Arc::new(FnScorer::constant(5.0));
    let service = assembled(scorer.clone());

    let result = service.explain(&features()).unwrap();
    assert!(result.risk_drivers.is_empty());
    assert!(!result.notes.is_empty());
    assert_eq!(scorer.calls(), 1 + 3);
}

#[tokio::test]
async fn test_explain_blocking_matches_explain() {
    let scorer = Arc::new(FnScorer::new(|input| input[2 * TEXT_DIM..].iter().sum::<f32>()));
    let service = Arc::new(assembled(scorer));

    let sync = service.explain(&features()).unwrap();
    let blocking = service.explain_blocking(features()).await.unwrap();
    assert_eq!(sync, blocking);
}

#[tokio::test]
async fn test_explain_blocking_surfaces_inference_errors() {
    let scorer = Arc::new(FnScorer::fallible(|_| {
        Err(InferenceError::ForwardFailed {
            reason: "boom".to_string(),
        })
    }));
    let service = assembled(scorer);

    assert!(matches!(
        service.explain_blocking(features()).await,
        Err(ServiceError::Inference(InferenceError::ForwardFailed { .. }))
    ));
}

use std::sync::Arc;

use super::*;
use crate::embedding::Embedding;

fn categories() -> Vec<RiskCategory> {
    vec![
        RiskCategory::new(2, 1.0),
        RiskCategory::new(0, 0.3),
        RiskCategory::new(1, 0.7),
    ]
}

fn logit_for(p: f64) -> f32 {
    (p / (1.0 - p)).ln() as f32
}

fn predictor(scorer: Arc<dyn RiskScorer>) -> Predictor {
    Predictor::new(
        scorer,
        RiskClassifier::new(categories()).unwrap(),
        vec![4],
        "mlp_v1",
        "1.0.0",
    )
}

#[test]
fn test_classify_examples() {
    let classifier = RiskClassifier::new(categories()).unwrap();
    assert_eq!(classifier.classify(0.3), 0);
    assert_eq!(classifier.classify(0.31), 1);
    assert_eq!(classifier.classify(0.7), 1);
    assert_eq!(classifier.classify(1.0), 2);
    assert_eq!(classifier.classify(1.5), 2);
    assert_eq!(classifier.classify(0.0), 0);
}

#[test]
fn test_classify_is_monotonic() {
    let classifier = RiskClassifier::new(categories()).unwrap();
    let position = |level: RiskLevel| {
        classifier
            .categories()
            .iter()
            .position(|c| c.code == level)
            .unwrap()
    };

    let mut previous = 0;
    for i in 0..=1200 {
        let score = i as f64 / 1000.0;
        let current = position(classifier.classify(score));
        assert!(current >= previous, "non-monotonic at {score}");
        previous = current;
    }
}

#[test]
fn test_classifier_sorting_and_accessors() {
    let classifier = RiskClassifier::new(categories()).unwrap();
    let bounds: Vec<f64> = classifier.categories().iter().map(|c| c.upper_bound).collect();
    assert_eq!(bounds, [0.3, 0.7, 1.0]);
    assert_eq!(classifier.lowest().code, 0);
    assert_eq!(classifier.fallback().code, 2);
    assert!(classifier.is_lowest(0));
    assert!(!classifier.is_lowest(1));
}

#[test]
fn test_single_category_always_matches() {
    let classifier = RiskClassifier::new(vec![RiskCategory::new(5, 0.1)]).unwrap();
    assert_eq!(classifier.classify(0.05), 5);
    assert_eq!(classifier.classify(0.9), 5);
}

#[test]
fn test_classifier_rejects_empty_and_nan() {
    assert!(matches!(
        RiskClassifier::new(vec![]),
        Err(ScoringError::EmptyCategories)
    ));
    assert!(matches!(
        RiskClassifier::new(vec![RiskCategory::new(0, f64::NAN)]),
        Err(ScoringError::InvalidCategory { .. })
    ));
}

#[test]
fn test_categories_deserialize() {
    let parsed: Vec<RiskCategory> =
        serde_json::from_str(r#"[{"code": 0, "upper_bound": 0.5}, {"code": 1, "upper_bound": 1}]"#)
            .unwrap();
    assert_eq!(parsed, [RiskCategory::new(0, 0.5), RiskCategory::new(1, 1.0)]);
}

#[test]
fn test_sigmoid() {
    assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    assert!(sigmoid(10.0) > 0.9999);
    assert!(sigmoid(-10.0) < 0.0001);
    assert_eq!(sigmoid(f32::INFINITY), 1.0);
    assert_eq!(sigmoid(f32::NEG_INFINITY), 0.0);
}

#[test]
fn test_round_score() {
    assert_eq!(round_score(0.123456), 0.1235);
    assert_eq!(round_score(0.99996), 1.0);
    assert_eq!(round_score(0.5), 0.5);
}

#[test]
fn test_predict_rounds_and_carries_metadata() {
    let scorer = Arc::new(FnScorer::constant(logit_for(0.654321)));
    let predictor = predictor(scorer.clone());
    let embedding = Embedding::new(vec![0.0; 4], vec![4]).unwrap();

    let result = predictor.predict(&embedding).unwrap();
    assert_eq!(result.risk_level, 1);
    assert_eq!(result.risk_score, 0.6543);
    assert_eq!(result.model, "mlp_v1");
    assert_eq!(result.version, "1.0.0");
    assert_eq!(scorer.calls(), 1);
}

#[test]
fn test_classification_uses_unrounded_probability() {
    // 0.30004 rounds to 0.3 but lies above the 0.3 threshold.
    let scorer = Arc::new(FnScorer::constant(logit_for(0.30004)));
    let predictor = predictor(scorer);
    let embedding = Embedding::new(vec![0.0; 4], vec![4]).unwrap();

    let result = predictor.predict(&embedding).unwrap();
    assert_eq!(result.risk_score, 0.3);
    assert_eq!(result.risk_level, 1);
}

#[test]
fn test_shape_mismatch_is_inference_error_without_scoring() {
    let scorer = Arc::new(FnScorer::constant(0.0));
    let predictor = predictor(scorer.clone());

    let wrong = Embedding::new(vec![0.0; 4], vec![2, 2]).unwrap();
    match predictor.predict(&wrong).unwrap_err() {
        InferenceError::ShapeMismatch { expected, actual } => {
            assert_eq!(expected, [4]);
            assert_eq!(actual, [2, 2]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(scorer.calls(), 0);
}

#[test]
fn test_scorer_failures_propagate() {
    let failing = Arc::new(FnScorer::fallible(|_| {
        Err(InferenceError::ForwardFailed {
            reason: "device lost".to_string(),
        })
    }));
    let embedding = Embedding::new(vec![0.0; 4], vec![4]).unwrap();
    assert!(matches!(
        predictor(failing).predict(&embedding),
        Err(InferenceError::ForwardFailed { .. })
    ));

    let nan = Arc::new(FnScorer::constant(f32::NAN));
    assert!(matches!(
        predictor(nan).predict(&embedding),
        Err(InferenceError::NanOutput)
    ));
}

#[test]
fn test_stub_scorer_is_affine_in_mean() {
    let scorer = StubScorer::new(2.0, -1.0);
    assert_eq!(scorer.forward(&[1.0, 0.0], &[2]).unwrap(), 0.0);
    assert_eq!(scorer.forward(&[1.0, 1.0], &[2]).unwrap(), 1.0);
    assert!(scorer.forward(&[], &[0]).is_err());
}

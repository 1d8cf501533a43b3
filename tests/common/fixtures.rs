//! Test fixtures for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};

use riskline::config::AppConfig;
use riskline::embedding::{BertTextEncoder, FeatureMap, TextEncoder};
use riskline::service::RiskService;

pub const DEMO_MODEL: &str = "stub_hybrid";

pub const DEMO_INPUT_LEN: usize = 3 * 384 + 2 * 32;

pub fn demo_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("config.json")
}

pub fn demo_config() -> AppConfig {
    AppConfig::load(demo_config_path()).expect("demo config should load")
}

pub fn stub_encoder() -> Arc<dyn TextEncoder> {
    Arc::new(BertTextEncoder::stub())
}

pub fn demo_service() -> RiskService {
    let app = demo_config();
    let (id, model) = app.active(None).expect("active model should exist");
    RiskService::from_config(&app, id, model, stub_encoder()).expect("demo service should build")
}

pub fn features(value: Value) -> FeatureMap {
    value
        .as_object()
        .cloned()
        .expect("feature fixture must be an object")
}

pub fn applicant(occupation: &str, housing: &str, age: f64, income: f64) -> FeatureMap {
    features(json!({
        "occupation": occupation,
        "housing": housing,
        "purpose": "car",
        "age": age,
        "income": income,
    }))
}

/// A spread of applicants used by property-style checks.
pub fn applicants() -> Vec<FeatureMap> {
    let mut out = Vec::new();
    for occupation in ["teacher", "contractor", "student", "unemployed"] {
        for housing in ["own", "rent", "free"] {
            for (age, income) in [(19.0, 4000.0), (45.0, 65000.0), (88.0, 240000.0)] {
                out.push(applicant(occupation, housing, age, income));
            }
        }
    }
    out
}

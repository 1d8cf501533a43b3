//! HTTP gateway (Axum) over the risk service and the prediction store.
//!
//! This module is primarily used by the `riskline` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{
    batch_predict_handler, explain_handler, explain_prediction_handler, get_prediction_handler,
    list_predictions_handler, nearest_handler, predict_handler,
};
pub use state::HandlerState;

use crate::store::PredictionStore;
use handler::make_response;
use payload::{HealthResponse, MetadataResponse};

pub const RISKLINE_STATUS_HEADER: &str = "X-Riskline-Status";
pub const RISKLINE_STATUS_OK: &str = "ok";
pub const RISKLINE_STATUS_STORED: &str = "stored";
pub const RISKLINE_STATUS_EXPLAINED: &str = "explained";
pub const RISKLINE_STATUS_CACHED: &str = "cached";

pub fn create_router_with_state<S>(state: HandlerState<S>) -> Router
where
    S: PredictionStore + Clone + 'static,
{
    Router::new()
        .route("/health", get(health_handler::<S>))
        .route("/metadata", get(metadata_handler::<S>))
        .route("/predict", post(predict_handler::<S>))
        .route("/predict/batch", post(batch_predict_handler::<S>))
        .route("/explain", post(explain_handler::<S>))
        .route("/predictions", get(list_predictions_handler::<S>))
        .route("/predictions/{id}", get(get_prediction_handler::<S>))
        .route(
            "/predictions/{id}/explain",
            post(explain_prediction_handler::<S>),
        )
        .route("/predictions/{id}/nearest", get(nearest_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tracing::instrument(skip(state))]
pub async fn health_handler<S>(State(state): State<HandlerState<S>>) -> Response
where
    S: PredictionStore + Clone + 'static,
{
    make_response(
        StatusCode::OK,
        RISKLINE_STATUS_OK,
        &HealthResponse {
            status: "ok".to_string(),
            version: state.service.version().to_string(),
        },
    )
}

#[tracing::instrument(skip(state))]
pub async fn metadata_handler<S>(State(state): State<HandlerState<S>>) -> Response
where
    S: PredictionStore + Clone + 'static,
{
    let service = &state.service;
    make_response(
        StatusCode::OK,
        RISKLINE_STATUS_OK,
        &MetadataResponse {
            status: "ok".to_string(),
            feature_order: service.feature_order(),
            risk_categories: service.categories().to_vec(),
            active_model: service.model().to_string(),
            version: service.version().to_string(),
            explanation_type: service.explanation_type().to_string(),
            strategy: service.strategy().to_string(),
            input_shape: service.input_shape().to_vec(),
        },
    )
}

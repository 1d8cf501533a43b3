use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::embedding::FeatureMap;
use crate::store::{
    ListQuery, MAX_NEIGHBOURS, Metric, PredictionRecord, PredictionStore, StoreTransaction,
};

use super::error::GatewayError;
use super::payload::{
    BatchPredictRequest, ExplainRecordRequest, NearestQuery, NearestResponse, PredictRequest,
    PredictResponse,
};
use super::state::HandlerState;
use super::{
    RISKLINE_STATUS_CACHED, RISKLINE_STATUS_EXPLAINED, RISKLINE_STATUS_HEADER, RISKLINE_STATUS_OK,
    RISKLINE_STATUS_STORED,
};

#[instrument(skip(state, request), fields(features = request.features.len()))]
pub async fn predict_handler<S>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<PredictRequest>,
) -> Result<Response, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    let (record, response) = score(&state, request.features)?;

    let mut tx = state.store.begin().await?;
    tx.insert(record);
    tx.commit().await?;

    info!(
        record_id = %response.record_id,
        risk_level = response.risk_level,
        "Prediction stored"
    );
    Ok(make_response(StatusCode::OK, RISKLINE_STATUS_STORED, &response))
}

/// All-or-nothing: every item is scored before anything is written.
#[instrument(skip(state, request), fields(items = request.items.len()))]
pub async fn batch_predict_handler<S>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<BatchPredictRequest>,
) -> Result<Response, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    if request.items.len() > state.max_batch {
        return Err(GatewayError::InvalidRequest(format!(
            "batch holds {} items, at most {} allowed",
            request.items.len(),
            state.max_batch
        )));
    }

    let mut records = Vec::with_capacity(request.items.len());
    let mut responses = Vec::with_capacity(request.items.len());
    for (index, item) in request.items.into_iter().enumerate() {
        let (record, response) = score(&state, item.features).inspect_err(|e| {
            debug!(index, error = %e, "Batch item failed, discarding batch");
        })?;
        records.push(record);
        responses.push(response);
    }

    let mut tx = state.store.begin().await?;
    for record in records {
        tx.insert(record);
    }
    tx.commit().await?;

    info!(stored = responses.len(), "Batch stored");
    Ok(make_response(StatusCode::OK, RISKLINE_STATUS_STORED, &responses))
}

#[instrument(skip(state, request), fields(features = request.features.len()))]
pub async fn explain_handler<S>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<PredictRequest>,
) -> Result<Response, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    let explanation = state.service.explain_blocking(request.features).await?;
    Ok(make_response(
        StatusCode::OK,
        RISKLINE_STATUS_EXPLAINED,
        &explanation,
    ))
}

#[instrument(skip(state))]
pub async fn list_predictions_handler<S>(
    State(state): State<HandlerState<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    let records = state.store.list(&query).await?;
    Ok(make_response(StatusCode::OK, RISKLINE_STATUS_OK, &records))
}

#[instrument(skip(state))]
pub async fn get_prediction_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Response, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    let record = fetch(&state, id).await?;
    Ok(make_response(StatusCode::OK, RISKLINE_STATUS_OK, &record))
}

/// Returns the stored explanation unless `overwrite` is set; otherwise recomputes and stores.
#[instrument(skip(state, body))]
pub async fn explain_prediction_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    let request = parse_optional_body::<ExplainRecordRequest>(&body)?;
    let record = fetch(&state, id).await?;

    if let Some(cached) = record.explanation
        && !request.overwrite
    {
        debug!("Returning stored explanation");
        return Ok(make_response(StatusCode::OK, RISKLINE_STATUS_CACHED, &cached));
    }

    let explanation = state.service.explain_blocking(record.features).await?;

    let mut tx = state.store.begin().await?;
    tx.attach_explanation(id, explanation.clone());
    tx.commit().await?;

    info!(drivers = explanation.risk_drivers.len(), "Explanation stored");
    Ok(make_response(
        StatusCode::OK,
        RISKLINE_STATUS_EXPLAINED,
        &explanation,
    ))
}

#[instrument(skip(state))]
pub async fn nearest_handler<S>(
    State(state): State<HandlerState<S>>,
    Path(id): Path<Uuid>,
    Query(query): Query<NearestQuery>,
) -> Result<Response, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    fetch(&state, id).await?;
    if !(1..=MAX_NEIGHBOURS).contains(&query.k) {
        return Err(GatewayError::InvalidRequest(format!(
            "k must be between 1 and {MAX_NEIGHBOURS}"
        )));
    }

    let euclidean = state.store.nearest(id, query.k, Metric::Euclidean).await?;
    let cosine = state.store.nearest(id, query.k, Metric::Cosine).await?;
    Ok(make_response(
        StatusCode::OK,
        RISKLINE_STATUS_OK,
        &NearestResponse { euclidean, cosine },
    ))
}

/// Rejects a payload whose feature count is off before any encoding happens.
pub(crate) fn check_feature_count<S>(
    state: &HandlerState<S>,
    features: &FeatureMap,
) -> Result<(), GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    let expected = state.service.expected_feature_count();
    if features.len() != expected {
        return Err(GatewayError::InvalidRequest(format!(
            "Expected {expected} features, got {}",
            features.len()
        )));
    }
    Ok(())
}

fn score<S>(
    state: &HandlerState<S>,
    features: FeatureMap,
) -> Result<(PredictionRecord, PredictResponse), GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    check_feature_count(state, &features)?;
    let (embedding, result) = state.service.predict_features(&features)?;
    let record = PredictionRecord::new(features, embedding, &result);
    let response = PredictResponse::new(record.id, result);
    Ok((record, response))
}

async fn fetch<S>(state: &HandlerState<S>, id: Uuid) -> Result<PredictionRecord, GatewayError>
where
    S: PredictionStore + Clone + 'static,
{
    state
        .store
        .get(id)
        .await?
        .ok_or(GatewayError::NotFound(id))
}

/// An empty body yields the default.
pub(crate) fn parse_optional_body<T>(body: &[u8]) -> Result<T, GatewayError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request body: {}", e)))
}

pub(crate) fn make_response<T: Serialize>(
    status: StatusCode,
    label: &'static str,
    body: &T,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(RISKLINE_STATUS_HEADER, HeaderValue::from_static(label));
    (status, headers, Json(body)).into_response()
}

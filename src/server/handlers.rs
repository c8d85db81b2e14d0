//! HTTP route handlers

use crate::metrics::MetricsSnapshot;
use crate::server::error::AppError;
use crate::server::AppState;
use crate::types::prediction::PredictionResponse;
use crate::types::record::RawRecord;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Scores one record submitted from the form.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawRecord>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let start_time = Instant::now();

    let outcome = payload
        .map_err(AppError::from)
        .and_then(|Json(record)| state.predictor.predict(&record).map_err(AppError::from));

    match outcome {
        Ok(result) => {
            let processing_time = start_time.elapsed();
            state
                .metrics
                .record_prediction(processing_time, result.probability, result.predicted_class);

            info!(
                prediction = result.predicted_class.as_label(),
                risk_percent = result.risk_percent,
                processing_time_us = processing_time.as_micros(),
                "Prediction served"
            );
            Ok(Json(result.to_response()))
        }
        Err(e) => {
            state.metrics.record_failure(start_time.elapsed(), e.kind());

            if e.status().is_server_error() {
                error!(error = %e, kind = e.kind(), "Prediction failed");
            } else {
                warn!(error = %e, kind = e.kind(), "Rejected prediction request");
            }
            Err(e)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub scaler_loaded: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.predictor.model_name().to_string(),
        scaler_loaded: state.predictor.scaler_loaded(),
    })
}

/// Serving metrics snapshot.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

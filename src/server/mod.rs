//! HTTP surface: `POST /predict`, `GET /health`, `GET /metrics`

pub mod error;
pub mod handlers;

use crate::metrics::PredictionMetrics;
use crate::predictor::Predictor;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{AppError, ErrorResponse};

/// Shared, read-only state handed to every request
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub metrics: Arc<PredictionMetrics>,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>, metrics: Arc<PredictionMetrics>) -> Self {
        Self { predictor, metrics }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency_us = latency.as_micros() as u64,
                status = res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/predict", post(handlers::predict))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(cors)
        .with_state(state)
}

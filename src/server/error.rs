//! HTTP error responses for the prediction API.

use crate::error::PredictionError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Failures surfaced at the HTTP boundary
#[derive(Debug)]
pub enum AppError {
    /// Body was not a valid record
    BadRequest(String),
    /// Record parsed but could not be scored
    Prediction(PredictionError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Prediction(e) if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "malformed_body",
            AppError::Prediction(e) => e.kind(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(message) => f.write_str(message),
            AppError::Prediction(e) => write!(f, "{}", e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PredictionError> for AppError {
    fn from(e: PredictionError) -> Self {
        AppError::Prediction(e)
    }
}

/// Body of every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

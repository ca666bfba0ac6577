//! Error handling for the Climate Forecast Service
//!
//! The HTTP contract distinguishes two classes only: validation failures on
//! the request boundary (400, naming the offending field) and everything else
//! (500, with the underlying message attached as details). Upstream fetch
//! failures inside a fan-out are handled where they occur (logged, the task
//! dropped) and never reach this type unless the whole request cannot
//! proceed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use shared::model::ModelError;
use shared::transform::TransformError;
use shared::types::Location;
use shared::wire::WireError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors on the request boundary
    #[error("Missing required parameter: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for parameter {field}: {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },

    // Upstream time-series API errors
    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Malformed upstream series: {0}")]
    MalformedSeries(#[from] WireError),

    // Pipeline errors
    #[error("No historical data collected for {0}")]
    NoData(Location),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Timezone lookup failed for {0}")]
    Timezone(Location),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Requested timestamp {0} is outside the forecast horizon")]
    ForecastIndex(NaiveDateTime),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response structure: `{error}` for validation failures,
/// `{error, details}` otherwise.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: format!("Missing required parameter: {field}"),
                    details: None,
                },
            ),
            AppError::InvalidParameter { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: format!("Invalid value for parameter {field}"),
                    details: Some(message.clone()),
                },
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "An internal error occurred during data processing.".to_string(),
                    details: Some(other.to_string()),
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

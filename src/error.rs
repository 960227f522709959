use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::places::PlacesError;
use crate::services::uploads::UploadError;
use crate::services::validate::ValidationError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
    #[error("Invalid query string: {0}")]
    QueryString(#[from] QueryRejection),
    #[error("Places API error: {0}")]
    Upstream(#[from] PlacesError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(e) => {
                tracing::warn!(field = e.field, reason = ?e.reason, "Rejected widget input");
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": "Validation failed",
                        "field": e.field,
                        "reason": e.reason,
                        "details": e.to_string(),
                    }),
                )
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::Body(e) => {
                tracing::warn!(error = %e, "Rejected request body");
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Invalid request body", "details": e.body_text() }),
                )
            }
            AppError::QueryString(e) => {
                tracing::warn!(error = %e, "Rejected query string");
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Invalid query parameters", "details": e.body_text() }),
                )
            }
            AppError::Upstream(e) => {
                let status = match e {
                    PlacesError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    PlacesError::Rejected { .. } => StatusCode::BAD_GATEWAY,
                    PlacesError::NotFound => StatusCode::NOT_FOUND,
                    PlacesError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::NOT_FOUND {
                    tracing::warn!("Places lookup returned no result");
                } else {
                    tracing::error!(error = %e, "Places API request failed");
                }
                let message = match e {
                    PlacesError::Timeout => "Places API timed out",
                    PlacesError::NotFound => "Place not found",
                    _ => "Failed to fetch place details",
                };
                (status, json!({ "error": message }))
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Widget store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Widget store unavailable" }),
                )
            }
            AppError::Upload(e) => {
                tracing::error!(error = %e, "Upload failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to store upload" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

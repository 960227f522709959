use axum::{response::IntoResponse, Json};
use serde_json::json;

pub async fn check() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": env!("CARGO_PKG_NAME") }))
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Widget embed API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

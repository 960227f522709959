use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::javascript;
use crate::error::AppError;
use crate::models::{WidgetKind, WidgetSettings};
use crate::services::registry::{embed_code, Submission};
use crate::services::script::{self, ScriptContext};
use crate::services::validate::RawWidgetInput;
use crate::AppState;

const DEFAULT_PHOTO_WIDTH: u32 = 800;
const MAX_PHOTO_WIDTH: u32 = 1600;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateClientRequest {
    pub client_id: Option<String>,
    #[serde(flatten)]
    pub fields: RawWidgetInput,
}

pub async fn generate_client(
    State(state): State<AppState>,
    payload: Result<Json<GenerateClientRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let submission = Submission {
        widget_id: payload.client_id,
        raw: payload.fields,
        image: None,
    };
    let record = state.registry.register(WidgetKind::Reviews, submission).await?;

    Ok(Json(json!({
        "clientId": record.id,
        "embedCode": embed_code(WidgetKind::Reviews, &record.id, &state.config.base_url),
    })))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Response, AppError> {
    let record = state.registry.get(WidgetKind::Reviews, &client_id).await?;
    Ok(Json(record).into_response())
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.registry.remove(WidgetKind::Reviews, &client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/google/widget/:script`, where the segment is `<clientId>.js`.
pub async fn client_script(
    State(state): State<AppState>,
    Path(script_name): Path<String>,
) -> Response {
    let client_id = script_name.strip_suffix(".js").unwrap_or(&script_name);
    if client_id.is_empty() {
        tracing::warn!("Reviews script requested without clientId");
        return javascript(script::not_found(None));
    }

    let ctx = ScriptContext {
        base_url: &state.config.base_url,
    };
    match state.registry.find(WidgetKind::Reviews, client_id).await {
        Ok(Some(record)) => javascript(script::render(&record, &ctx)),
        Ok(None) => {
            tracing::warn!(client_id, "Client not found for script");
            javascript(script::not_found(Some(client_id)))
        }
        Err(e) => {
            tracing::error!(client_id, error = %e, "Failed to load client for script");
            javascript(script::not_found(Some(client_id)))
        }
    }
}

#[derive(Deserialize)]
pub struct ReviewsParams {
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
}

pub async fn reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewsParams>,
) -> Result<Json<Value>, AppError> {
    let client_id = params.client_id.unwrap_or_default();
    let record = state
        .registry
        .find(WidgetKind::Reviews, &client_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(client_id = %client_id, "Reviews requested for unknown client");
            AppError::BadRequest("Invalid client ID".to_string())
        })?;
    let WidgetSettings::Reviews(settings) = &record.settings else {
        return Err(AppError::BadRequest("Invalid client ID".to_string()));
    };

    let result = state
        .places_cache
        .details(&state.places, &settings.place_id)
        .await?;

    Ok(Json(json!({
        "result": result,
        "config": {
            "themeColor": settings.theme_color,
            "widgetSize": settings.widget_size,
        },
    })))
}

#[derive(Deserialize)]
pub struct AutocompleteParams {
    pub input: Option<String>,
}

pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<Value>, AppError> {
    let input = params
        .input
        .filter(|input| !input.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Input query is required".to_string()))?;

    let predictions = state.places.autocomplete(&input).await?;
    Ok(Json(predictions))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

pub async fn search_place(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, AppError> {
    let query = params
        .query
        .filter(|query| !query.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Query is required".to_string()))?;

    let place_id = match query.strip_prefix("place_id:") {
        Some(id) => id.to_string(),
        None => state.places.find_place(&query).await?,
    };
    let result = state.places_cache.details(&state.places, &place_id).await?;

    Ok(Json(json!({ "result": result })))
}

#[derive(Deserialize)]
pub struct PhotoParams {
    pub photo_reference: Option<String>,
    pub maxwidth: Option<u32>,
}

pub async fn place_photo(
    State(state): State<AppState>,
    params: Result<Query<PhotoParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    let reference = params
        .photo_reference
        .filter(|reference| !reference.is_empty())
        .ok_or_else(|| AppError::BadRequest("Photo reference is required".to_string()))?;
    let max_width = params
        .maxwidth
        .unwrap_or(DEFAULT_PHOTO_WIDTH)
        .clamp(1, MAX_PHOTO_WIDTH);

    let photo = state.places.photo(&reference, max_width).await?;
    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        photo.bytes,
    )
        .into_response())
}

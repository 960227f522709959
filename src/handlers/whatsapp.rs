use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::javascript;
use crate::error::AppError;
use crate::models::{absolutize, WidgetKind};
use crate::services::registry::{embed_code, Submission};
use crate::services::script::{self, ScriptContext};
use crate::services::uploads::ImageUpload;
use crate::services::validate::{Reason, ValidationError};
use crate::AppState;

const IMAGE_FIELD: &str = "greetingImage";

fn form_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ValidationError::new(IMAGE_FIELD, Reason::TooLarge).into();
    }
    AppError::BadRequest(format!("Invalid form data: {}", e.body_text()))
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD && field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(form_error)?;
            // Browsers send an empty part when no file was picked.
            if !bytes.is_empty() {
                submission.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await.map_err(form_error)?;
        if name == "widgetId" {
            submission.widget_id = Some(value);
        } else {
            submission.raw.set(&name, value);
        }
    }

    Ok(submission)
}

pub async fn create_widget(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let submission = read_submission(multipart).await?;
    let record = state.registry.register(WidgetKind::Chat, submission).await?;

    let base_url = &state.config.base_url;
    Ok(Json(json!({
        "widgetId": record.id,
        "embedCode": embed_code(WidgetKind::Chat, &record.id, base_url),
        "greetingImageUrl": record
            .settings
            .greeting_image()
            .map(|image| absolutize(base_url, image)),
    })))
}

pub async fn get_widget(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
) -> Result<Response, AppError> {
    let record = state.registry.get(WidgetKind::Chat, &widget_id).await?;
    Ok(Json(record.with_absolute_assets(&state.config.base_url)).into_response())
}

pub async fn delete_widget(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.registry.remove(WidgetKind::Chat, &widget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ScriptParams {
    #[serde(rename = "widgetId")]
    pub widget_id: Option<String>,
}

pub async fn widget_script(
    State(state): State<AppState>,
    Query(params): Query<ScriptParams>,
) -> Response {
    let Some(widget_id) = params.widget_id.filter(|id| !id.trim().is_empty()) else {
        tracing::warn!("Widget script requested without widgetId");
        return javascript(script::not_found(None));
    };

    let ctx = ScriptContext {
        base_url: &state.config.base_url,
    };
    match state.registry.find(WidgetKind::Chat, &widget_id).await {
        Ok(Some(record)) => javascript(script::render(&record, &ctx)),
        Ok(None) => {
            tracing::warn!(widget_id = %widget_id, "Widget not found for script");
            javascript(script::not_found(Some(&widget_id)))
        }
        Err(e) => {
            tracing::error!(widget_id = %widget_id, error = %e, "Failed to load widget for script");
            javascript(script::not_found(Some(&widget_id)))
        }
    }
}

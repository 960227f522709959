use std::sync::Arc;

use crate::error::AppError;
use crate::models::{WidgetConfig, WidgetKind, WidgetSettings};
use crate::services::escape;
use crate::services::ids;
use crate::services::uploads::{ImageUpload, UploadStore};
use crate::services::validate::{
    self, RawWidgetInput, Reason, ValidationError, OWNED_UPLOAD_PREFIX,
};
use crate::store::WidgetStore;

/// One create-or-update request, as received from either widget family.
#[derive(Debug, Default)]
pub struct Submission {
    pub widget_id: Option<String>,
    pub raw: RawWidgetInput,
    pub image: Option<ImageUpload>,
}

/// Ties validation, id assignment, uploads and the store together.
pub struct Registry {
    store: Arc<dyn WidgetStore>,
    uploads: UploadStore,
}

impl Registry {
    pub fn new(store: Arc<dyn WidgetStore>, uploads: UploadStore) -> Self {
        Self { store, uploads }
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub async fn register(
        &self,
        kind: WidgetKind,
        submission: Submission,
    ) -> Result<WidgetConfig, AppError> {
        let mut settings = validate::validate(kind, &submission.raw)?;
        if let Some(image) = &submission.image {
            image.check()?;
        }

        let existing = match submission.widget_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(self.get(kind, id).await?),
            _ => None,
        };
        let id = existing
            .as_ref()
            .map(|record| record.id.clone())
            .unwrap_or_else(ids::generate);
        let previous_image = existing
            .as_ref()
            .and_then(|record| record.settings.greeting_image())
            .map(str::to_string);

        if let Some(claimed) = settings.greeting_image() {
            // Only the widget that stored an upload may keep referencing it.
            if claimed.starts_with(OWNED_UPLOAD_PREFIX)
                && previous_image.as_deref() != Some(claimed)
            {
                return Err(ValidationError::new("greetingImage", Reason::InvalidFormat).into());
            }
        }

        let saved = match &submission.image {
            Some(image) => Some(self.uploads.save(image).await?),
            None => None,
        };
        if let WidgetSettings::Chat(chat) = &mut settings {
            if let Some(reference) = &saved {
                chat.greeting_image = Some(reference.clone());
            } else if chat.greeting_image.is_none() {
                chat.greeting_image = previous_image.clone();
            }
        }

        let record = match self.store.upsert(&id, settings).await {
            Ok(record) => record,
            Err(e) => {
                if let Some(reference) = &saved {
                    self.uploads.remove(reference).await;
                }
                return Err(e.into());
            }
        };

        if let Some(old) = previous_image {
            if record.settings.greeting_image() != Some(old.as_str()) {
                self.uploads.remove(&old).await;
            }
        }

        if existing.is_some() {
            tracing::info!(id = %record.id, kind = %kind, "Updated widget");
        } else {
            tracing::info!(id = %record.id, kind = %kind, "Created widget");
        }
        Ok(record)
    }

    /// Record of the given family, or `NotFound` for unknown ids and for ids
    /// that belong to the other family.
    pub async fn get(&self, kind: WidgetKind, id: &str) -> Result<WidgetConfig, AppError> {
        self.find(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(not_found_message(kind)))
    }

    /// Like [`Registry::get`] but treats a miss as `None`.
    pub async fn find(&self, kind: WidgetKind, id: &str) -> Result<Option<WidgetConfig>, AppError> {
        let record = self.store.get_by_id(id).await?;
        Ok(record.filter(|record| record.kind() == kind))
    }

    pub async fn remove(&self, kind: WidgetKind, id: &str) -> Result<(), AppError> {
        let record = self.get(kind, id).await?;
        if !self.store.remove(id).await? {
            return Err(AppError::NotFound(not_found_message(kind)));
        }
        if let Some(image) = record.settings.greeting_image() {
            self.uploads.remove(image).await;
        }
        tracing::info!(id, kind = %kind, "Deleted widget");
        Ok(())
    }
}

fn not_found_message(kind: WidgetKind) -> String {
    match kind {
        WidgetKind::Chat => "Widget not found".to_string(),
        WidgetKind::Reviews => "Client not found".to_string(),
    }
}

/// The two-line HTML snippet a site owner pastes into their page.
pub fn embed_code(kind: WidgetKind, id: &str, base_url: &str) -> String {
    let base = escape::html_attr(base_url.trim_end_matches('/'));
    let attr_id = escape::html_attr(id);
    match kind {
        WidgetKind::Chat => format!(
            "<div id=\"whatsapp-widget-{attr_id}\"></div>\n<script src=\"{base}/api/whatsapp/widget.js?widgetId={}\" defer></script>",
            escape::html_attr(&escape::url_component(id)),
        ),
        WidgetKind::Reviews => format!(
            "<div id=\"google-reviews-{attr_id}\" data-client-id=\"{attr_id}\"></div>\n<script src=\"{base}/api/google/widget/{}.js\" async></script>",
            escape::html_attr(&escape::url_component(id)),
        ),
    }
}

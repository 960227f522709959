use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{StoreError, WidgetStore};
use crate::models::{WidgetConfig, WidgetSettings};

/// Process-local store. Used by tests and `WIDGET_STORE_URL=memory:`.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, WidgetConfig>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared upsert step for the map-backed stores.
pub(super) fn apply_upsert(
    records: &mut HashMap<String, WidgetConfig>,
    id: &str,
    settings: WidgetSettings,
) -> WidgetConfig {
    let created_at = records
        .get(id)
        .map(|existing| existing.created_at)
        .unwrap_or_else(Utc::now);
    let record = WidgetConfig {
        id: id.to_string(),
        settings,
        created_at,
    };
    records.insert(id.to_string(), record.clone());
    record
}

#[async_trait]
impl WidgetStore for MemoryStore {
    async fn upsert(&self, id: &str, settings: WidgetSettings) -> Result<WidgetConfig, StoreError> {
        let mut records = self.records.write().await;
        Ok(apply_upsert(&mut records, id, settings))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<WidgetConfig>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn get_all(&self) -> Result<HashMap<String, WidgetConfig>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}

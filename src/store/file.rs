use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::memory::apply_upsert;
use super::{StoreError, WidgetStore};
use crate::models::{WidgetConfig, WidgetSettings};

/// Whole-table JSON file with an in-memory mirror.
///
/// The table is read once at open and rewritten in full on every write, so
/// each write costs O(n). Fine for a handful of widgets; swap in
/// [`super::PgStore`] beyond that.
pub struct FileStore {
    path: PathBuf,
    records: RwLock<HashMap<String, WidgetConfig>>,
}

impl FileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "No widget file found, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path,
            records: RwLock::new(records),
        };
        // Fail at boot, not on the first request, if the file is not writable.
        store.persist(&*store.records.read().await).await?;
        tracing::info!(
            path = %store.path.display(),
            count = store.records.read().await.len(),
            "Loaded widget file"
        );
        Ok(store)
    }

    async fn persist(&self, records: &HashMap<String, WidgetConfig>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl WidgetStore for FileStore {
    async fn upsert(&self, id: &str, settings: WidgetSettings) -> Result<WidgetConfig, StoreError> {
        let mut records = self.records.write().await;
        let previous = records.get(id).cloned();
        let record = apply_upsert(&mut records, id, settings);

        if let Err(e) = self.persist(&records).await {
            match previous {
                Some(previous) => records.insert(id.to_string(), previous),
                None => records.remove(id),
            };
            tracing::error!(id, error = %e, "Failed to write widget file");
            return Err(e);
        }
        Ok(record)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<WidgetConfig>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn get_all(&self) -> Result<HashMap<String, WidgetConfig>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let Some(previous) = records.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&records).await {
            records.insert(id.to_string(), previous);
            tracing::error!(id, error = %e, "Failed to write widget file");
            return Err(e);
        }
        Ok(true)
    }
}

//! Widget configuration persistence.
//!
//! Every backend gives per-id last-write-wins semantics and keeps `created_at`
//! across updates. Nothing stronger is promised for concurrent writers to the
//! same id.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{WidgetConfig, WidgetSettings};

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
    #[error("Unsupported store location: {0}")]
    UnsupportedLocation(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(e.to_string())
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

#[async_trait]
pub trait WidgetStore: Send + Sync {
    /// Inserts or fully replaces the record under `id`, keeping the original
    /// `created_at` on replace. Returns the record as stored.
    async fn upsert(&self, id: &str, settings: WidgetSettings) -> Result<WidgetConfig, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<WidgetConfig>, StoreError>;

    async fn get_all(&self) -> Result<HashMap<String, WidgetConfig>, StoreError>;

    /// Returns whether a record was removed.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
}

/// Backend selected by `WIDGET_STORE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
    Postgres(String),
}

impl StoreLocation {
    pub fn parse(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if url == "memory" || url == "memory:" {
            return Ok(StoreLocation::Memory);
        }
        if let Some(path) = url.strip_prefix("file://").or_else(|| url.strip_prefix("file:")) {
            if path.is_empty() {
                return Err(StoreError::UnsupportedLocation(url.to_string()));
            }
            return Ok(StoreLocation::File(PathBuf::from(path)));
        }
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(StoreLocation::Postgres(url.to_string()));
        }
        Err(StoreError::UnsupportedLocation(url.to_string()))
    }
}

/// Opens the configured backend. Called once at startup; failure there is fatal.
pub async fn open(location: &StoreLocation) -> Result<Arc<dyn WidgetStore>, StoreError> {
    let store: Arc<dyn WidgetStore> = match location {
        StoreLocation::Memory => Arc::new(MemoryStore::new()),
        StoreLocation::File(path) => Arc::new(FileStore::open(path).await?),
        StoreLocation::Postgres(url) => Arc::new(PgStore::connect(url).await?),
    };
    Ok(store)
}

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{StoreError, WidgetStore};
use crate::models::{WidgetConfig, WidgetSettings};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS widgets (\
    id TEXT PRIMARY KEY, \
    kind TEXT NOT NULL, \
    settings JSONB NOT NULL, \
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now())";

type WidgetRow = (String, Json<WidgetSettings>, DateTime<Utc>);

/// One row per widget; settings live in a JSONB column tagged with `kind`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(20))
            .connect(url)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        tracing::info!("Connected to widget database");
        Ok(Self { pool })
    }
}

fn into_config((id, Json(settings), created_at): WidgetRow) -> WidgetConfig {
    WidgetConfig {
        id,
        settings,
        created_at,
    }
}

#[async_trait]
impl WidgetStore for PgStore {
    async fn upsert(&self, id: &str, settings: WidgetSettings) -> Result<WidgetConfig, StoreError> {
        let row = sqlx::query_as::<_, WidgetRow>(
            "INSERT INTO widgets (id, kind, settings) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE \
             SET kind = EXCLUDED.kind, settings = EXCLUDED.settings, updated_at = now() \
             RETURNING id, settings, created_at",
        )
        .bind(id)
        .bind(settings.kind().as_str())
        .bind(Json(&settings))
        .fetch_one(&self.pool)
        .await?;

        Ok(into_config(row))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<WidgetConfig>, StoreError> {
        let row = sqlx::query_as::<_, WidgetRow>(
            "SELECT id, settings, created_at FROM widgets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_config))
    }

    async fn get_all(&self) -> Result<HashMap<String, WidgetConfig>, StoreError> {
        let rows = sqlx::query_as::<_, WidgetRow>("SELECT id, settings, created_at FROM widgets")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(into_config)
            .map(|config| (config.id.clone(), config))
            .collect())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM widgets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

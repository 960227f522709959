//! # widget-embed-api
//!
//! Registers embeddable widget configurations (Google reviews, WhatsApp
//! chat) and serves the per-widget client scripts.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::Config;
use crate::handlers::{google, health, whatsapp};
use crate::services::places::{PlacesCache, PlacesClient};
use crate::services::registry::Registry;
use crate::services::uploads::{UploadStore, MAX_IMAGE_BYTES};

/// Multipart overhead allowed on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<Registry>,
    pub places: Arc<PlacesClient>,
    pub places_cache: Arc<PlacesCache>,
}

impl AppState {
    /// Opens the store and upload directory named by `config`. Any failure
    /// here should stop the process.
    pub async fn from_config(config: Config) -> Result<Self, anyhow::Error> {
        let store = store::open(&config.store).await?;
        let uploads = UploadStore::open(&config.uploads_dir).await?;
        Self::with_store(config, store, uploads)
    }

    pub fn with_store(
        config: Config,
        store: Arc<dyn store::WidgetStore>,
        uploads: UploadStore,
    ) -> Result<Self, anyhow::Error> {
        let places = PlacesClient::new(
            &config.places_api_url,
            &config.google_api_key,
            Duration::from_secs(config.places_timeout_secs),
        )?;
        let capacity = NonZeroUsize::new(config.places_cache_capacity)
            .ok_or_else(|| anyhow::anyhow!("PLACES_CACHE_CAPACITY must be at least 1"))?;
        let places_cache =
            PlacesCache::new(capacity, Duration::from_secs(config.places_cache_ttl_secs));

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(Registry::new(store, uploads)),
            places: Arc::new(places),
            places_cache: Arc::new(places_cache),
        })
    }
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("Endpoint not found: {}", uri.path()) })),
    )
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.registry.uploads().dir());

    let whatsapp_routes = Router::new()
        .route(
            "/widgets",
            post(whatsapp::create_widget)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route(
            "/widgets/:widget_id",
            get(whatsapp::get_widget).delete(whatsapp::delete_widget),
        )
        .route("/widget.js", get(whatsapp::widget_script));

    let google_routes = Router::new()
        .route("/generate-client", post(google::generate_client))
        .route(
            "/widgets/:client_id",
            get(google::get_client).delete(google::delete_client),
        )
        .route("/widget/:script", get(google::client_script))
        .route("/reviews", get(google::reviews))
        .route("/autocomplete", get(google::autocomplete))
        .route("/search-place", get(google::search_place))
        .route("/place-photo", get(google::place_photo));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::check))
        .nest("/api/whatsapp", whatsapp_routes)
        .nest("/api/google", google_routes)
        .nest_service("/uploads", uploads)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

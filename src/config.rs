use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use dotenvy::dotenv;

use crate::store::StoreLocation;

const DEFAULT_PLACES_API_URL: &str = "https://maps.googleapis.com/maps/api/place";

#[derive(Clone, Debug)]
pub struct Config {
    /// Public origin of this service, baked into embed codes and scripts.
    pub base_url: String,
    pub google_api_key: String,
    pub store: StoreLocation,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub places_api_url: String,
    pub places_timeout_secs: u64,
    pub places_cache_ttl_secs: u64,
    pub places_cache_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self, anyhow::Error> {
        dotenv().ok(); // Load .env if present (dev mode)
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} is required", name))
        };
        let optional = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let base_url = required("BASE_URL")?;
        url::Url::parse(&base_url).with_context(|| format!("BASE_URL is not a URL: {base_url}"))?;

        let store_url = required("WIDGET_STORE_URL")?;
        let store = StoreLocation::parse(&store_url).context("WIDGET_STORE_URL is invalid")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            google_api_key: required("GOOGLE_API_KEY")?,
            store,
            port: number("PORT", &optional("PORT", "5000"))?,
            uploads_dir: PathBuf::from(optional("UPLOADS_DIR", "uploads")),
            places_api_url: optional("PLACES_API_URL", DEFAULT_PLACES_API_URL),
            places_timeout_secs: number("PLACES_TIMEOUT_SECS", &optional("PLACES_TIMEOUT_SECS", "8"))?,
            places_cache_ttl_secs: number(
                "PLACES_CACHE_TTL_SECS",
                &optional("PLACES_CACHE_TTL_SECS", "3600"),
            )?,
            places_cache_capacity: number(
                "PLACES_CACHE_CAPACITY",
                &optional("PLACES_CACHE_CAPACITY", "256"),
            )?,
        })
    }
}

fn number<T: FromStr>(name: &str, value: &str) -> Result<T, anyhow::Error> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", name, value))
}

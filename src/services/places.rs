use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

const DETAIL_FIELDS: &str = "name,rating,user_ratings_total,formatted_address,website,reviews,photos";

#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("Places API timed out")]
    Timeout,
    #[error("Places API rejected the request: {status}")]
    Rejected { status: String, message: Option<String> },
    #[error("Place not found")]
    NotFound,
    #[error("Failed to reach Places API: {0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for PlacesError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PlacesError::Timeout
        } else {
            PlacesError::Transport(e)
        }
    }
}

/// Maps a Places `status` field onto the proxy's error model.
fn check_status(body: &Value) -> Result<(), PlacesError> {
    match body["status"].as_str().unwrap_or("UNKNOWN_ERROR") {
        "OK" => Ok(()),
        "ZERO_RESULTS" | "NOT_FOUND" | "INVALID_REQUEST" => Err(PlacesError::NotFound),
        status => Err(PlacesError::Rejected {
            status: status.to_string(),
            message: body["error_message"].as_str().map(str::to_string),
        }),
    }
}

pub struct PlacePhoto {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Thin proxy over the Google Places web service.
pub struct PlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PlacesError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, PlacesError> {
        let url = format!("{}/{}/json", self.base_url, endpoint);
        let res = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(endpoint, status = %res.status(), "Places API returned an HTTP error");
            return Err(PlacesError::Rejected {
                status: res.status().to_string(),
                message: None,
            });
        }

        let body: Value = res.json().await?;
        if let Err(e) = check_status(&body) {
            tracing::warn!(endpoint, status = %body["status"], "Places API returned a non-OK status");
            return Err(e);
        }
        Ok(body)
    }

    pub async fn autocomplete(&self, input: &str) -> Result<Value, PlacesError> {
        let body = self.get_json("autocomplete", &[("input", input)]).await?;
        Ok(body["predictions"].clone())
    }

    /// Resolves free text to the best matching place id.
    pub async fn find_place(&self, query: &str) -> Result<String, PlacesError> {
        let body = self
            .get_json(
                "findplacefromtext",
                &[("input", query), ("inputtype", "textquery"), ("fields", "place_id")],
            )
            .await?;

        body["candidates"][0]["place_id"]
            .as_str()
            .map(str::to_string)
            .ok_or(PlacesError::NotFound)
    }

    pub async fn details(&self, place_id: &str) -> Result<Value, PlacesError> {
        let body = self
            .get_json("details", &[("place_id", place_id), ("fields", DETAIL_FIELDS)])
            .await?;
        Ok(body["result"].clone())
    }

    pub async fn photo(&self, reference: &str, max_width: u32) -> Result<PlacePhoto, PlacesError> {
        let url = format!("{}/photo", self.base_url);
        let max_width = max_width.to_string();
        let res = self
            .client
            .get(&url)
            .query(&[
                ("photo_reference", reference),
                ("maxwidth", max_width.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        match res.status().as_u16() {
            200..=299 => {}
            400 | 404 => return Err(PlacesError::NotFound),
            status => {
                tracing::error!(status, "Places photo request failed");
                return Err(PlacesError::Rejected {
                    status: status.to_string(),
                    message: None,
                });
            }
        }

        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = res.bytes().await?.to_vec();

        Ok(PlacePhoto {
            content_type,
            bytes,
        })
    }
}

/// Place details keyed by place id, bounded in size and age.
pub struct PlacesCache {
    entries: Mutex<LruCache<String, (Instant, Value)>>,
    ttl: Duration,
}

impl PlacesCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn get(&self, place_id: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(place_id) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                return Some(value.clone())
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(place_id);
        }
        None
    }

    pub async fn insert(&self, place_id: &str, value: Value) {
        self.entries
            .lock()
            .await
            .put(place_id.to_string(), (Instant::now(), value));
    }

    /// Cached details, fetching through `client` on a miss.
    pub async fn details(&self, client: &PlacesClient, place_id: &str) -> Result<Value, PlacesError> {
        if let Some(cached) = self.get(place_id).await {
            tracing::debug!(place_id, "Place details served from cache");
            return Ok(cached);
        }
        let details = client.details(place_id).await?;
        self.insert(place_id, details.clone()).await;
        Ok(details)
    }
}

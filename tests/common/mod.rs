#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use widget_embed_api::config::Config;
use widget_embed_api::services::uploads::UploadStore;
use widget_embed_api::store::{MemoryStore, StoreLocation};
use widget_embed_api::AppState;

pub const BASE_URL: &str = "https://widgets.example.com";
pub const BOUNDARY: &str = "X-WIDGET-TEST-BOUNDARY";

pub struct TestApp {
    pub router: Router,
    pub uploads: tempfile::TempDir,
}

pub fn config(places_api_url: &str, uploads_dir: PathBuf, timeout_secs: u64) -> Config {
    Config {
        base_url: BASE_URL.to_string(),
        google_api_key: "test-key".to_string(),
        store: StoreLocation::Memory,
        port: 0,
        uploads_dir,
        places_api_url: places_api_url.to_string(),
        places_timeout_secs: timeout_secs,
        places_cache_ttl_secs: 3600,
        places_cache_capacity: 16,
    }
}

pub async fn app_with_places(places_api_url: &str, timeout_secs: u64) -> TestApp {
    let uploads = tempfile::tempdir().expect("temp uploads dir");
    let config = config(places_api_url, uploads.path().to_path_buf(), timeout_secs);
    let upload_store = UploadStore::open(uploads.path())
        .await
        .expect("open upload store");
    let state = AppState::with_store(config, Arc::new(MemoryStore::new()), upload_store)
        .expect("build state");

    TestApp {
        router: widget_embed_api::router(state),
        uploads,
    }
}

/// App whose Places client points at a closed port.
pub async fn app() -> TestApp {
    app_with_places("http://127.0.0.1:9", 1).await
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let resp = router.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, headers, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, req).await
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).expect("parse JSON"))
}

pub async fn post_json(
    router: &Router,
    uri: &str,
    payload: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _, body) = send(router, req).await;
    (status, serde_json::from_slice(&body).expect("parse JSON"))
}

/// A file part for [`multipart_body`]: (field, file name, content type, bytes).
pub type FilePart<'a> = (&'a str, &'a str, &'a str, &'a [u8]);

pub fn multipart_body(fields: &[(&str, &str)], file: Option<FilePart>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_form(
    router: &Router,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap();
    let (status, _, body) = send(router, req).await;
    (status, serde_json::from_slice(&body).expect("parse JSON"))
}

//! Registration and script endpoints driven through the router with an
//! in-memory store.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;

use common::{app, get, get_json, post_form, post_json, send, BASE_URL};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[tokio::test]
async fn chat_registration_round_trip() {
    let app = app().await;

    let (status, created) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "+14155550123"), ("agentName", "Ana")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{created}");

    let id = created["widgetId"].as_str().expect("widgetId").to_string();
    assert_eq!(id.len(), 36);
    assert_eq!(
        created["embedCode"],
        format!(
            "<div id=\"whatsapp-widget-{id}\"></div>\n<script src=\"{BASE_URL}/api/whatsapp/widget.js?widgetId={id}\" defer></script>"
        )
    );
    assert!(created["greetingImageUrl"].is_null());

    let (status, stored) = get_json(&app.router, &format!("/api/whatsapp/widgets/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["agentName"], "Ana");
    assert_eq!(stored["welcomeMessage"], "Hi there 🥰 How can I help you?");
    assert_eq!(stored["kind"], "chat");
    assert_eq!(stored["position"], "bottom-right");
    assert!(stored["createdAt"].is_string());
}

#[tokio::test]
async fn invalid_phone_is_rejected_with_field() {
    let app = app().await;
    let (status, body) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "12345"), ("agentName", "Ana")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "phoneNumber");
    assert_eq!(body["reason"], "invalid_format");
}

#[tokio::test]
async fn update_with_unknown_id_is_not_found() {
    let app = app().await;
    let (status, body) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "+14155550123"), ("widgetId", "doesnotexist")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Widget not found");
}

#[tokio::test]
async fn update_keeps_id_and_created_at() {
    let app = app().await;
    let (_, created) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "+14155550123"), ("agentName", "Ana")],
        None,
    )
    .await;
    let id = created["widgetId"].as_str().unwrap().to_string();
    let (_, before) = get_json(&app.router, &format!("/api/whatsapp/widgets/{id}")).await;

    let (status, updated) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[
            ("phoneNumber", "+14155550199"),
            ("agentName", "Bea"),
            ("widgetId", id.as_str()),
        ],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["widgetId"], id);

    let (_, after) = get_json(&app.router, &format!("/api/whatsapp/widgets/{id}")).await;
    assert_eq!(after["agentName"], "Bea");
    assert_eq!(after["phoneNumber"], "+14155550199");
    assert_eq!(after["createdAt"], before["createdAt"]);
}

#[tokio::test]
async fn greeting_image_is_stored_and_served() {
    let app = app().await;
    let (status, created) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "+14155550123")],
        Some(("greetingImage", "face.png", "image/png", PNG)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{created}");

    let url = created["greetingImageUrl"].as_str().expect("image url");
    let path = url.strip_prefix(BASE_URL).expect("absolute url");
    assert!(path.starts_with("/uploads/"));

    let (status, _, body) = get(&app.router, path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], PNG);
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = app().await;
    let (status, body) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "+14155550123")],
        Some(("greetingImage", "notes.txt", "text/plain", &b"hello"[..])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "greetingImage");
    assert_eq!(std::fs::read_dir(app.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn chat_script_is_served_with_javascript_headers() {
    let app = app().await;
    let (_, created) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "+14155550123"), ("agentName", "Ana")],
        None,
    )
    .await;
    let id = created["widgetId"].as_str().unwrap();

    let (status, headers, body) =
        get(&app.router, &format!("/api/whatsapp/widget.js?widgetId={id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/javascript; charset=utf-8"
    );
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    let script = String::from_utf8(body.to_vec()).unwrap();
    assert!(script.contains(r#""agentName":"Ana""#));
}

#[tokio::test]
async fn unknown_script_degrades_to_console_error() {
    let app = app().await;

    for uri in [
        "/api/whatsapp/widget.js?widgetId=doesnotexist",
        "/api/whatsapp/widget.js",
        "/api/google/widget/doesnotexist.js",
    ] {
        let (status, headers, body) = get(&app.router, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );
        let script = String::from_utf8(body.to_vec()).unwrap();
        assert!(script.contains("console.error("), "{uri}: {script}");
        assert!(!script.contains("throw"));
    }
}

#[tokio::test]
async fn script_for_other_family_is_not_served() {
    let app = app().await;
    let (_, created) = post_form(
        &app.router,
        "/api/whatsapp/widgets",
        &[("phoneNumber", "+14155550123")],
        None,
    )
    .await;
    let id = created["widgetId"].as_str().unwrap();

    let (status, _, body) = get(&app.router, &format!("/api/google/widget/{id}.js")).await;
    assert_eq!(status, StatusCode::OK);
    let script = String::from_utf8(body.to_vec()).unwrap();
    assert!(script.contains("Widget configuration not found"));
}

#[tokio::test]
async fn generate_client_requires_place_fields() {
    let app = app().await;
    let (status, body) = post_json(
        &app.router,
        "/api/google/generate-client",
        json!({ "placeId": "ChIJ123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "placeName");
    assert_eq!(body["reason"], "missing");
}

#[tokio::test]
async fn reviews_registration_and_escaped_script() {
    let app = app().await;
    let (status, created) = post_json(
        &app.router,
        "/api/google/generate-client",
        json!({
            "placeId": "ChIJ123",
            "placeName": "Joe's \"Best\" Café</script><script>evil()</script>",
            "themeColor": "purple",
            "widgetSize": "large",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let id = created["clientId"].as_str().unwrap().to_string();
    assert_eq!(
        created["embedCode"],
        format!(
            "<div id=\"google-reviews-{id}\" data-client-id=\"{id}\"></div>\n<script src=\"{BASE_URL}/api/google/widget/{id}.js\" async></script>"
        )
    );

    let (status, stored) = get_json(&app.router, &format!("/api/google/widgets/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["placeName"], "Joe's \"Best\" Café");
    assert_eq!(stored["themeColor"], "purple");

    let (status, _, body) = get(&app.router, &format!("/api/google/widget/{id}.js")).await;
    assert_eq!(status, StatusCode::OK);
    let script = String::from_utf8(body.to_vec()).unwrap();
    assert!(!script.contains("</script"));
    assert!(!script.contains("<script"));
    assert!(script.contains(&format!("/api/google/reviews?clientId={id}")));
}

#[tokio::test]
async fn malformed_generate_client_body_is_a_json_bad_request() {
    let app = app().await;
    let (status, body) = post_json(
        &app.router,
        "/api/google/generate-client",
        json!({ "placeId": 123, "placeName": "Cafe" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");

    for (content_type, payload) in [
        (Some("application/json"), "{not json"),
        (None, r#"{"placeId":"ChIJ123","placeName":"Cafe"}"#),
    ] {
        let mut req = Request::builder()
            .method("POST")
            .uri("/api/google/generate-client");
        if let Some(content_type) = content_type {
            req = req.header(header::CONTENT_TYPE, content_type);
        }
        let (status, headers, body) =
            send(&app.router, req.body(Body::from(payload)).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Invalid request body");
    }
}

#[tokio::test]
async fn unsupported_reviews_theme_is_rejected() {
    let app = app().await;
    let (status, body) = post_json(
        &app.router,
        "/api/google/generate-client",
        json!({ "placeId": "ChIJ123", "placeName": "Cafe", "themeColor": "red" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "themeColor");
}

#[tokio::test]
async fn reviews_for_unknown_client_is_bad_request() {
    let app = app().await;
    let (status, body) = get_json(&app.router, "/api/google/reviews?clientId=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid client ID");
}

#[tokio::test]
async fn delete_removes_widget() {
    let app = app().await;
    let (_, created) = post_json(
        &app.router,
        "/api/google/generate-client",
        json!({ "placeId": "ChIJ123", "placeName": "Cafe" }),
    )
    .await;
    let id = created["clientId"].as_str().unwrap();

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/google/widgets/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get_json(&app.router, &format!("/api/google/widgets/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_reports_path() {
    let app = app().await;
    let (status, body) = get_json(&app.router, "/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found: /api/nothing-here");
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = app().await;
    let (status, body) = get_json(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = get_json(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
}

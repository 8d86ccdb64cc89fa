//! End-to-end tests for the request gate: every stage exercised through
//! the real router with an in-memory store behind it.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use amal_backend::config::AppConfig;
use amal_backend::http::{AppState, build_router};
use amal_backend::security::RateLimiters;
use amal_backend::store::{ContentStore, Seed};

const ORIGIN: &str = "http://localhost:5173";
const ADMIN_TOKEN: &str = "0123456789abcdef0123456789abcdef";

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.admin_token = ADMIN_TOKEN.to_string();
    config
}

async fn app_with(config: AppConfig) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ContentStore::new(dir.path().join("content.json")));
    store.initialize(Seed::default()).await.unwrap();
    let limiters = Arc::new(RateLimiters::from_config(&config.rate_limits));
    let state = AppState {
        store,
        limiters,
        config: Arc::new(config),
    };
    (build_router(state), dir)
}

async fn app() -> (Router, TempDir) {
    app_with(test_config()).await
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, origin: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    let value = format!("Bearer {token}");
    request
        .headers_mut()
        .insert("authorization", value.parse().unwrap());
    request
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn contact_body(email: &str) -> Value {
    json!({
        "name": "Amina",
        "email": email,
        "subject": "hello",
        "message": "Salam, I would like to volunteer.",
        "formStartedAt": now_ms() - 10_000,
    })
}

// ---- reads and rate metadata ----

#[tokio::test]
async fn health_carries_rate_headers() {
    let (app, _dir) = app().await;
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "100");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "99");
    assert!(response.headers().contains_key("x-ratelimit-reset"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn content_is_served_without_auth() {
    let (app, _dir) = app().await;
    let response = app.oneshot(get("/api/content")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], 1);
    assert!(body["settings"].is_object());
}

#[tokio::test]
async fn api_tier_exhaustion_returns_429_with_metadata() {
    let mut config = test_config();
    config.rate_limits.api.limit = 3;
    let (app, _dir) = app_with(config).await;

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let body = body_json(response).await;
    assert_eq!(body["error"], "too_many_requests");
    assert!(body["retryAfterSecs"].as_u64().unwrap() >= 1);
    assert!(!body["message"]["ar"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn endpoint_tier_is_tighter_than_api_tier() {
    let mut config = test_config();
    config.rate_limits.contact.limit = 1;
    let (app, _dir) = app_with(config).await;

    let first = app
        .clone()
        .oneshot(post_json("/api/contact", Some(ORIGIN), contact_body("a@b.example")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/api/contact", Some(ORIGIN), contact_body("a@b.example")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

// ---- shape limits ----

#[tokio::test]
async fn disallowed_method_is_rejected() {
    let (app, _dir) = app().await;
    let request = Request::builder()
        .method("TRACE")
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await["error"], "method_not_allowed");
}

#[tokio::test]
async fn oversized_uri_is_rejected() {
    let (app, _dir) = app().await;
    let uri = format!("/api/health?pad={}", "x".repeat(3000));
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::URI_TOO_LONG);
}

#[tokio::test]
async fn oversized_declared_body_is_rejected() {
    let (app, _dir) = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header("content-type", "application/json")
        .header("content-length", "10000000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn oversized_streamed_body_is_rejected_without_content_length() {
    let mut config = test_config();
    config.server.max_body_bytes = 256;
    let (app, _dir) = app_with(config).await;
    let request = post_json(
        "/api/contact",
        Some(ORIGIN),
        json!({ "message": "m".repeat(4096) }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ---- payload defense ----

#[tokio::test]
async fn reserved_keys_are_rejected() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json(
            "/api/contact",
            Some(ORIGIN),
            json!({ "__proto__": { "polluted": true } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "malformed_body");
}

#[tokio::test]
async fn hostile_nesting_is_rejected() {
    let (app, _dir) = app().await;
    let mut value = json!(1);
    for _ in 0..40 {
        value = json!({ "k": value });
    }
    let response = app
        .oneshot(post_json("/api/contact", Some(ORIGIN), value))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---- origin policy ----

#[tokio::test]
async fn mutation_without_origin_is_rejected() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json("/api/contact", None, contact_body("a@b.example")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "origin_rejected");
}

#[tokio::test]
async fn mutation_from_unlisted_origin_is_rejected() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json(
            "/api/contact",
            Some("https://evil.example"),
            contact_body("a@b.example"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reads_skip_the_origin_check() {
    let (app, _dir) = app().await;
    // No Origin header on a GET is fine.
    let response = app.oneshot(get("/api/content")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ---- public forms ----

#[tokio::test]
async fn contact_submission_round_trip() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json("/api/contact", Some(ORIGIN), contact_body("amina@example.org")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], true);
}

#[tokio::test]
async fn contact_with_bad_email_fails_validation() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_json("/api/contact", Some(ORIGIN), contact_body("not-an-email")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "validation_failed");
}

#[tokio::test]
async fn filled_honeypot_is_dropped() {
    let (app, _dir) = app().await;
    let mut body = contact_body("amina@example.org");
    body["website"] = json!("http://spam.example");
    let response = app
        .oneshot(post_json("/api/contact", Some(ORIGIN), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn newsletter_signup_succeeds() {
    let (app, _dir) = app().await;
    let body = json!({
        "email": "amina@example.org",
        "formStartedAt": now_ms() - 10_000,
    });
    let response = app
        .oneshot(post_json("/api/newsletter", Some(ORIGIN), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ---- admin access ----

#[tokio::test]
async fn admin_requires_a_bearer_token() {
    let (app, _dir) = app().await;

    let bare = app.clone().oneshot(get("/api/admin/content")).await.unwrap();
    assert_eq!(bare.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .clone()
        .oneshot(with_bearer(get("/api/admin/content"), "wrong-token"))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let right = app
        .oneshot(with_bearer(get("/api/admin/content"), ADMIN_TOKEN))
        .await
        .unwrap();
    assert_eq!(right.status(), StatusCode::OK);
}

#[tokio::test]
async fn unconfigured_token_never_matches() {
    let mut config = test_config();
    config.security.admin_token = String::new();
    let (app, _dir) = app_with(config).await;
    let response = app
        .oneshot(with_bearer(get("/api/admin/content"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn production_with_weak_token_disables_admin() {
    let mut config = test_config();
    config.security.production = true;
    config.security.admin_token = "short".to_string();
    let (app, _dir) = app_with(config).await;
    let response = app
        .oneshot(with_bearer(get("/api/admin/content"), "short"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"], "admin_unavailable");
}

// ---- admin mutations through the full gate ----

fn admin_post(uri: &str, body: Value) -> Request<Body> {
    with_bearer(post_json(uri, Some(ORIGIN), body), ADMIN_TOKEN)
}

fn admin_put(uri: &str, body: Value) -> Request<Body> {
    let mut request = admin_post(uri, body);
    *request.method_mut() = axum::http::Method::PUT;
    request
}

#[tokio::test]
async fn project_create_assigns_id_and_slug() {
    let (app, _dir) = app().await;
    let response = app
        .clone()
        .oneshot(admin_post(
            "/api/admin/projects",
            json!({ "title": { "en": "Water Wells", "ar": "آبار المياه" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["id"], 1);
    assert_eq!(created["slug"], "water-wells");

    let content = body_json(app.oneshot(get("/api/content")).await.unwrap()).await;
    assert_eq!(content["projects"].as_array().unwrap().len(), 1);
    assert_eq!(content["nextIds"]["projects"], 2);
    assert_eq!(content["version"], 2);
}

#[tokio::test]
async fn duplicate_slugs_get_numeric_suffixes() {
    let (app, _dir) = app().await;
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(admin_post(
                "/api/admin/news",
                json!({ "title": { "en": "Ramadan Drive" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let content = body_json(app.oneshot(get("/api/content")).await.unwrap()).await;
    let news = content["news"].as_array().unwrap();
    assert_eq!(news[0]["slug"], "ramadan-drive");
    assert_eq!(news[1]["slug"], "ramadan-drive-2");
}

#[tokio::test]
async fn untitled_entries_fail_validation() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(admin_post("/api/admin/projects", json!({ "title": {} })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn updating_a_missing_entry_is_not_found() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(admin_put(
            "/api/admin/projects/99",
            json!({ "title": { "en": "Ghost" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn delete_removes_the_entry_and_bumps_the_version() {
    let (app, _dir) = app().await;
    let created = body_json(
        app.clone()
            .oneshot(admin_post(
                "/api/admin/media",
                json!({
                    "title": { "en": "Opening day" },
                    "url": "https://photos.example/opening.jpg",
                }),
            ))
            .await
            .unwrap(),
    )
    .await;

    let uri = format!("/api/admin/media/{}", created["id"]);
    let mut request = admin_post(&uri, json!({}));
    *request.method_mut() = axum::http::Method::DELETE;
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let content = body_json(app.oneshot(get("/api/content")).await.unwrap()).await;
    assert!(content["media"].as_array().unwrap().is_empty());
    assert_eq!(content["version"], 3);
}

#[tokio::test]
async fn settings_update_replaces_the_whole_section() {
    let (app, _dir) = app().await;
    let response = app
        .clone()
        .oneshot(admin_put(
            "/api/admin/settings",
            json!({
                "heroTitle": { "ar": "جمعية أمل", "en": "Amal Association" },
                "contactEmail": "info@amal.example",
                "facebook": "https://facebook.com/amal",
                "twitter": "javascript:alert(1)",
                "donationInstructions": { "en": "Open the app\nPick a project\n\nTransfer" },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let settings = body_json(response).await;
    assert_eq!(settings["heroTitle"]["en"], "Amal Association");
    assert_eq!(settings["social"]["facebook"], "https://facebook.com/amal");
    // Non-http(s) URLs are dropped, not echoed back.
    assert_eq!(settings["social"]["twitter"], "");
    assert_eq!(
        settings["donation"]["instructions"]["en"],
        json!(["Open the app", "Pick a project", "Transfer"])
    );
}

#[tokio::test]
async fn impact_update_coerces_bad_stats_to_zero() {
    let (app, _dir) = app().await;
    let response = app
        .clone()
        .oneshot(admin_put(
            "/api/admin/impact",
            json!({ "beneficiaries": 1200, "volunteers": "lots", "regions": -3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let impact = body_json(response).await;
    assert_eq!(impact["beneficiaries"], 1200);
    assert_eq!(impact["volunteers"], 0);
    assert_eq!(impact["regions"], 0);

    let content = body_json(app.oneshot(get("/api/content")).await.unwrap()).await;
    assert_eq!(content["impact"]["beneficiaries"], 1200);
}

#[tokio::test]
async fn media_requires_an_absolute_url() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(admin_post(
            "/api/admin/media",
            json!({ "title": { "en": "Broken" }, "url": "not-a-url" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

//! End-to-end tests through the full router: routing, auth, validation,
//! error mapping, and the lifecycle guarantees as seen over HTTP.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lauth_api::state::{AppConfig, AppState};
use lauth_crypto::SecretToken;
use lauth_registry::{JsonFileStore, LicenseRegistry};

const TOKEN: &str = "test-admin-token";

fn app() -> Router {
    lauth_api::app(AppState::new())
}

fn authed_app() -> Router {
    lauth_api::app(AppState::with_config(AppConfig {
        admin_token: Some(SecretToken::new(TOKEN)),
        ..AppConfig::default()
    }))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, license) = send(app, post_json("/v1/licenses", &body)).await;
    assert_eq!(status, StatusCode::CREATED, "{license}");
    license
}

fn key_of(license: &Value) -> String {
    license["key"].as_str().unwrap().to_string()
}

// ── Health & metadata ────────────────────────────────────────────────

#[tokio::test]
async fn health_probes_respond() {
    let app = authed_app();
    let (status, body) = send(&app, get_req("/health/liveness")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));

    let (status, body) = send(&app, get_req("/health/readiness")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ready".into()));
}

#[tokio::test]
async fn metrics_unavailable_without_recorder() {
    let (status, _) = send(&app(), get_req("/metrics")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn openapi_document_served_without_auth() {
    let (status, body) = send(&authed_app(), get_req("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/licenses/{key}/extend"].is_object());
}

// ── Scenarios ────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_fresh_key_and_fields() {
    let app = app();
    let license = create(
        &app,
        json!({"expiration_date": "2099-01-01T00:00:00Z", "extra_data": null}),
    )
    .await;

    let key = key_of(&license);
    assert_eq!(key.len(), 35);
    assert_eq!(license["expiration_date"], "2099-01-01T00:00:00Z");
    assert_eq!(license["extra_data"], Value::Null);
    assert_eq!(license["status"], "active");
    assert_eq!(license["revoked_at"], Value::Null);
}

#[tokio::test]
async fn extend_forward_then_backward() {
    let app = app();
    let key = key_of(&create(&app, json!({"expiration_date": "2025-01-01T00:00:00Z"})).await);

    let (status, body) = send(
        &app,
        post_json(
            &format!("/v1/licenses/{key}/extend"),
            &json!({"expiration_date": "2025-06-01T00:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["expiration_date"], "2025-06-01T00:00:00Z");

    let (status, body) = send(
        &app,
        post_json(
            &format!("/v1/licenses/{key}/extend"),
            &json!({"expiration_date": "2025-02-01T00:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_EXTENSION");

    let (_, current) = send(&app, get_req(&format!("/v1/licenses/{key}"))).await;
    assert_eq!(current["expiration_date"], "2025-06-01T00:00:00Z");
}

#[tokio::test]
async fn extend_after_revoke_is_conflict() {
    let app = app();
    let key = key_of(&create(&app, json!({"expiration_date": "2025-01-01T00:00:00Z"})).await);

    let (status, body) = send(&app, post_empty(&format!("/v1/licenses/{key}/revoke"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "revoked");

    let (status, body) = send(
        &app,
        post_json(
            &format!("/v1/licenses/{key}/extend"),
            &json!({"expiration_date": "2099-01-01T00:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_REVOKED");
}

#[tokio::test]
async fn revoke_unknown_key_not_found() {
    let (status, body) = send(
        &app(),
        post_empty("/v1/licenses/0000AAAA-0000BBBB-0000CCCC-0000DDDD/revoke"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn revoke_twice_returns_same_record() {
    let app = app();
    let key = key_of(&create(&app, json!({})).await);

    let (first_status, first) = send(&app, post_empty(&format!("/v1/licenses/{key}/revoke"))).await;
    let (second_status, second) =
        send(&app, post_empty(&format!("/v1/licenses/{key}/revoke"))).await;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);

    let (_, history) = send(&app, get_req(&format!("/v1/licenses/{key}/history"))).await;
    let kinds: Vec<&str> = history["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["created", "revoked"]);
}

// ── Validation ───────────────────────────────────────────────────────

#[tokio::test]
async fn extend_never_expiring_license_rejected() {
    let app = app();
    let key = key_of(&create(&app, json!({})).await);
    let (status, body) = send(
        &app,
        post_json(
            &format!("/v1/licenses/{key}/extend"),
            &json!({"expiration_date": "2030-01-01T00:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_EXTENSION");
}

#[tokio::test]
async fn malformed_timestamp_is_bad_request() {
    let (status, body) = send(
        &app(),
        post_json("/v1/licenses", &json!({"expiration_date": "next tuesday"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn pre_epoch_expiration_is_validation_error() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json("/v1/licenses", &json!({"expiration_date": "1969-07-20T20:17:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, list) = send(&app, get_req("/v1/licenses")).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn missing_extend_body_is_bad_request() {
    let app = app();
    let key = key_of(&create(&app, json!({"expiration_date": "2030-01-01T00:00:00Z"})).await);
    let (status, body) = send(&app, post_json(&format!("/v1/licenses/{key}/extend"), &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn undecodable_key_segment_uses_error_envelope() {
    let app = app();
    for request in [
        get_req("/v1/licenses/%FF"),
        post_empty("/v1/licenses/%FF/revoke"),
        get_req("/v1/licenses/%FF/history"),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST", "{body}");
    }
}

#[tokio::test]
async fn malformed_list_query_uses_error_envelope() {
    let (status, body) = send(&app(), get_req("/v1/licenses?status=active&status=revoked")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST", "{body}");
}

#[tokio::test]
async fn percent_encoded_key_is_looked_up_verbatim() {
    let app = app();
    let key = key_of(&create(&app, json!({})).await);
    let (prefix, rest) = key.split_once('-').unwrap();

    // `%252D` decodes to the literal text `%2D`, which was never issued.
    let uri = format!("/v1/licenses/{prefix}%252D{rest}/revoke");
    let (status, body) = send(&app, post_empty(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (status, body) = send(&app, post_empty("/v1/licenses/a%2Fb/revoke")).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (_, fetched) = send(&app, get_req(&format!("/v1/licenses/{key}"))).await;
    assert_eq!(fetched["status"], "active");
}

#[tokio::test]
async fn oversized_body_rejected() {
    let filler = "x".repeat(lauth_api::MAX_BODY_BYTES + 1);
    let (status, _) = send(
        &app(),
        post_json("/v1/licenses", &json!({"extra_data": {"blob": filler}})),
    )
    .await;
    assert!(status.is_client_error());
    assert_ne!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn extra_data_round_trips() {
    let app = app();
    let extra = json!({"features": ["sso", "audit"], "seats": 25, "tier": {"name": "gold"}});
    let created = create(&app, json!({"extra_data": extra})).await;
    assert_eq!(created["extra_data"], extra);

    let (_, fetched) = send(&app, get_req(&format!("/v1/licenses/{}", key_of(&created)))).await;
    assert_eq!(fetched["extra_data"], extra);
}

// ── Listing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_by_status() {
    let app = app();
    create(&app, json!({"expiration_date": "2099-01-01T00:00:00Z"})).await;
    create(&app, json!({"expiration_date": "2001-01-01T00:00:00Z"})).await;
    let revoked = key_of(&create(&app, json!({})).await);
    send(&app, post_empty(&format!("/v1/licenses/{revoked}/revoke"))).await;

    let (status, all) = send(&app, get_req("/v1/licenses")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["total"], 3);

    for (status, expected) in [("active", 1), ("expired", 1), ("revoked", 1)] {
        let (_, page) = send(&app, get_req(&format!("/v1/licenses?status={status}"))).await;
        assert_eq!(page["total"], expected, "status={status}");
        assert_eq!(page["licenses"][0]["status"], status);
    }

    let (status, body) = send(&app, get_req("/v1/licenses?status=dormant")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ── Auth ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_require_token() {
    let app = authed_app();
    let (status, body) = send(&app, post_json("/v1/licenses", &json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/licenses")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn wrong_token_rejected() {
    let request = Request::builder()
        .uri("/v1/licenses")
        .header("authorization", "Bearer not-the-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&authed_app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Persistence ──────────────────────────────────────────────────────

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licenses.json");

    let key = {
        let registry = LicenseRegistry::builder()
            .store(JsonFileStore::open(&path).unwrap())
            .build();
        let app = lauth_api::app(AppState::with_registry(registry, AppConfig::default()));
        let key = key_of(&create(&app, json!({"expiration_date": "2099-01-01T00:00:00Z"})).await);
        send(&app, post_empty(&format!("/v1/licenses/{key}/revoke"))).await;
        key
    };

    let registry = LicenseRegistry::builder()
        .store(JsonFileStore::open(&path).unwrap())
        .build();
    let app = lauth_api::app(AppState::with_registry(registry, AppConfig::default()));
    let (status, license) = send(&app, get_req(&format!("/v1/licenses/{key}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(license["status"], "revoked");

    let (status, _) = send(
        &app,
        post_json(
            &format!("/v1/licenses/{key}/extend"),
            &json!({"expiration_date": "2199-01-01T00:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

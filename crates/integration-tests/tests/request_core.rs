//! Integration tests for the request core.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use marketlink_client::api::REQUEST_ID_HEADER;
use marketlink_client::{MemoryStore, RequestDescriptor, ResponseEnvelope};
use marketlink_core::{Role, Session};
use marketlink_integration_tests::{TestBackend, client_with_store};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_base_url_with_api_suffix_never_doubles() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .expect(3)
        .mount(&backend.server)
        .await;

    for base in [
        format!("{}/api", backend.server.uri()),
        format!("{}/api/", backend.server.uri()),
        format!("{}/", backend.server.uri()),
    ] {
        let client = client_with_store(&base, Arc::new(MemoryStore::new()));
        let envelope = client
            .execute(&RequestDescriptor::get("/users/me"))
            .await
            .unwrap();
        assert_eq!(envelope.data, json!({"id": "u1"}));
    }
}

#[tokio::test]
async fn test_explicit_api_and_upload_paths_hit_backend_root() {
    let backend = TestBackend::start().await;
    Mock::given(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(path("/uploads/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("file"))
        .expect(1)
        .mount(&backend.server)
        .await;

    let client = &backend.client;
    let health = client
        .execute(&RequestDescriptor::get("/api/health").without_auth())
        .await
        .unwrap();
    assert_eq!(health.data, json!({"raw": "ok", "message": "ok"}));

    client
        .execute(&RequestDescriptor::get("/uploads/a.txt").without_auth())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_absolute_url_passes_through() {
    let backend = TestBackend::start().await;
    Mock::given(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&backend.server)
        .await;

    let url = format!("{}/elsewhere", backend.server.uri());
    let envelope = backend
        .client
        .execute(&RequestDescriptor::get(url))
        .await
        .unwrap();

    assert_eq!(
        envelope,
        ResponseEnvelope {
            ok: true,
            status: 204,
            data: json!({}),
        }
    );
}

#[tokio::test]
async fn test_active_role_token_is_attached() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/stats"))
        .and(header("authorization", "Bearer admin-jwt"))
        .and(header("accept", "application/json"))
        .and(header_exists(REQUEST_ID_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": 3})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let sessions = backend.sessions();
    sessions
        .set_session(&Session::new(Role::User, "user-jwt", json!({})))
        .unwrap();
    sessions
        .set_session(&Session::new(Role::Admin, "admin-jwt", json!({})))
        .unwrap();

    let envelope = backend
        .client
        .execute(&RequestDescriptor::get("/admin/stats"))
        .await
        .unwrap();
    assert_eq!(envelope.data, json!({"users": 3}));
}

#[tokio::test]
async fn test_legacy_token_authenticates_user() {
    let backend = TestBackend::start().await;
    Mock::given(header("authorization", "Bearer old-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;

    let client = client_with_store(
        &backend.server.uri(),
        Arc::new(MemoryStore::with_entries([("token", "old-jwt")])),
    );
    client
        .execute(&RequestDescriptor::get("/orders/my"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_validation_error_carries_status_and_body() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "Reason is required",
            "fields": ["reason"]
        })))
        .mount(&backend.server)
        .await;

    let err = backend
        .client
        .execute(&RequestDescriptor::post("/returns").json(json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "Reason is required");
    assert_eq!(err.data().unwrap()["fields"], json!(["reason"]));
}

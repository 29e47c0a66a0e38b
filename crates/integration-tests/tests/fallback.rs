//! Integration tests for candidate-endpoint resolution through the resource
//! catalogue.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use marketlink_client::{ApiError, MemoryStore};
use marketlink_core::{Role, Session};
use marketlink_integration_tests::{TestBackend, client_with_store};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn missing(backend: &TestBackend, route: &str, times: u64) {
    Mock::given(path(route))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
        .expect(times)
        .mount(&backend.server)
        .await;
}

#[tokio::test]
async fn test_my_returns_found_on_third_shape() {
    let backend = TestBackend::start().await;
    missing(&backend, "/api/returns/my", 1).await;
    missing(&backend, "/api/returns/mine", 1).await;
    Mock::given(method("GET"))
        .and(path("/api/users/me/returns"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"returns": [{"id": "r1"}, {"id": "r2"}]})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(path("/api/orders/returns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&backend.server)
        .await;

    let returns = backend.client.my_returns().await.unwrap();
    assert_eq!(returns, vec![json!({"id": "r1"}), json!({"id": "r2"})]);
}

#[tokio::test]
async fn test_read_with_no_routes_is_empty() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&backend.server)
        .await;

    assert!(backend.client.my_commissions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_stops_the_walk() {
    let backend = TestBackend::start().await;
    Mock::given(path("/api/orders/my"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(path("/api/orders/mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&backend.server)
        .await;

    let err = backend.client.my_orders().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "db down");
}

#[tokio::test]
async fn test_create_return_with_no_routes_names_the_operation() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&backend.server)
        .await;

    let err = backend
        .client
        .create_return(Some("o1"), &json!({"reason": "damaged"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::EndpointNotFound { .. }));
    assert_eq!(err.to_string(), "create return endpoint not found on backend");

    // /returns, /orders/o1/return, /returns/request
    let requests = backend.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_create_return_falls_through_to_order_route() {
    let backend = TestBackend::start().await;
    missing(&backend, "/api/returns", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/orders/o1/return"))
        .and(body_json(json!({"reason": "damaged"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"return": {"id": "r9"}}})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let record = backend
        .client
        .create_return(Some("o1"), &json!({"reason": "damaged"}))
        .await
        .unwrap();
    assert_eq!(record, json!({"id": "r9"}));
}

#[tokio::test]
async fn test_referral_tree_unwraps_envelope() {
    let backend = TestBackend::start().await;
    Mock::given(path("/api/referrals/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "tree": {"id": "u1", "children": [{"id": "u2", "children": []}]}
        })))
        .mount(&backend.server)
        .await;

    let tree = backend.client.referral_tree().await.unwrap();
    assert_eq!(tree["id"], "u1");
}

#[tokio::test]
async fn test_user_login_stores_session_without_touching_shop() {
    let backend = TestBackend::start().await;
    backend
        .sessions()
        .set_session(&Session::new(Role::Shop, "shop-jwt", json!({"_id": "s1"})))
        .unwrap();

    missing(&backend, "/api/auth/login", 1).await;
    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"token": "user-jwt", "user": {"_id": "u1", "email": "a@b.c"}}
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let session = backend
        .client
        .login(Role::User, &json!({"email": "a@b.c", "password": "pw"}))
        .await
        .unwrap();

    assert_eq!(session.principal()["email"], "a@b.c");
    let sessions = backend.sessions();
    assert_eq!(sessions.active_role().unwrap(), Role::User);
    assert!(sessions.get_session(Role::Shop).unwrap().is_some());
    assert_eq!(sessions.shop_id().unwrap().as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_login_without_token_is_an_error() {
    let backend = TestBackend::start().await;
    Mock::given(path("/api/admin/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "check email"})))
        .mount(&backend.server)
        .await;

    let err = backend
        .client
        .login(Role::Admin, &json!({"email": "a@b.c", "password": "pw"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::MissingToken { .. }));
    assert!(backend.sessions().get_session(Role::Admin).unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error_not_an_empty_list() {
    let client = client_with_store("http://127.0.0.1:9", Arc::new(MemoryStore::new()));

    let err = client.my_orders().await.unwrap_err();

    let ApiError::Http(source) = err else {
        panic!("expected a transport error, got {err:?}");
    };
    assert_eq!(source.url().map(|url| url.path()), Some("/api/orders/my"));
}

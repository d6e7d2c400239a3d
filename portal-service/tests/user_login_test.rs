mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::util::ServiceExt;

use common::{body_json, json_body, json_request, test_backend, RequestBuilderExt, TestBackend};

async fn register_bob(backend: &TestBackend) {
    let request = json_request("POST", "/api/user/register")
        .with_csrf()
        .body(json_body(json!({
            "name": "bob",
            "email": "bob@test.com",
            "password": "abcABC123"
        })))
        .unwrap();
    let response = backend.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_returns_access_token() {
    let backend = test_backend();
    register_bob(&backend).await;

    let request = json_request("POST", "/api/user/login")
        .with_csrf()
        .body(json_body(json!({
            "email": "bob@test.com",
            "password": "abcABC123"
        })))
        .unwrap();

    let response = backend.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["data"]["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let backend = test_backend();
    register_bob(&backend).await;

    let request = json_request("POST", "/api/user/login")
        .with_csrf()
        .body(json_body(json!({
            "email": "bob@test.com",
            "password": "abcABC124"
        })))
        .unwrap();

    let response = backend.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Unauthorized");
    assert_eq!(body["code"], 40101);
    assert!(body["context"].is_null());
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let backend = test_backend();

    let request = json_request("POST", "/api/user/login")
        .with_csrf()
        .body(json_body(json!({
            "email": "nobody@test.com",
            "password": "abcABC123"
        })))
        .unwrap();

    let response = backend.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_validation_reports_missing_fields() {
    let backend = test_backend();

    let request = json_request("POST", "/api/user/login")
        .with_csrf()
        .body(json_body(json!({})))
        .unwrap();

    let response = backend.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "RequestValidationFailed");
    assert_eq!(
        body["context"],
        json!({ "email": "required", "password": "required" })
    );
}

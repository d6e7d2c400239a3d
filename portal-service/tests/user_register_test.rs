mod common;

use axum::body::Body;
use axum::http::StatusCode;
use serde_json::json;
use tower::util::ServiceExt;

use common::{body_json, json_body, json_request, test_backend, RequestBuilderExt};

#[tokio::test]
async fn register_returns_access_token() {
    let backend = test_backend();

    let request = json_request("POST", "/api/user/register")
        .with_csrf()
        .body(json_body(json!({
            "name": "bob",
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
async fn register_without_csrf_is_forbidden() {
    let backend = test_backend();

    let request = json_request("POST", "/api/user/register")
        .body(Body::empty())
        .unwrap();

    let response = backend.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Forbidden");
    assert_eq!(body["code"], 40301);
    assert!(body["context"].is_null());
}

#[tokio::test]
async fn register_validation_failures_report_first_failing_rule() {
    let cases: Vec<(serde_json::Value, serde_json::Value)> = vec![
        (
            json!({}),
            json!({ "name": "required", "email": "required", "password": "required" }),
        ),
        (
            json!({"name": "bob", "email": "not-an-email", "password": "abcABC123"}),
            json!({ "email": "email" }),
        ),
        (
            json!({"name": "bob", "email": "bob@test.com", "password": "Abc12"}),
            json!({ "password": "gte" }),
        ),
        (
            json!({"name": "bob", "email": "bob@test.com", "password": "ABCDEFG1"}),
            json!({ "password": "containsany" }),
        ),
        (
            json!({"name": "bob", "email": "bob@test.com", "password": "abcdefg1"}),
            json!({ "password": "containsany" }),
        ),
        (
            json!({"name": "bob", "email": "bob@test.com", "password": "abcABCdef"}),
            json!({ "password": "containsany" }),
        ),
    ];

    for (request_body, expected_context) in cases {
        let backend = test_backend();
        let request = json_request("POST", "/api/user/register")
            .with_csrf()
            .body(json_body(request_body.clone()))
            .unwrap();

        let response = backend.app.oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "body {}",
            request_body
        );

        let body = body_json(response).await;
        assert_eq!(body["message"], "RequestValidationFailed");
        assert_eq!(body["code"], 40001);
        assert_eq!(body["context"], expected_context, "body {}", request_body);
    }
}

#[tokio::test]
async fn register_malformed_json_reports_validation_failure_without_context() {
    let backend = test_backend();

    let request = json_request("POST", "/api/user/register")
        .with_csrf()
        .body(Body::from("{not json"))
        .unwrap();

    let response = backend.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "RequestValidationFailed");
    assert!(body["context"].is_null());
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let backend = test_backend();
    let payload = json!({
        "name": "bob",
        "email": "bob@test.com",
        "password": "abcABC123"
    });

    let first = json_request("POST", "/api/user/register")
        .with_csrf()
        .body(json_body(payload.clone()))
        .unwrap();
    let response = backend.app.clone().oneshot(first).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let second = json_request("POST", "/api/user/register")
        .with_csrf()
        .body(json_body(payload))
        .unwrap();
    let response = backend.app.oneshot(second).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Conflict");
    assert_eq!(body["code"], 40901);
}

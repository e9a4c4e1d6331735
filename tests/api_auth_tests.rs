//! 认证 API 集成测试

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{assert_error_body, body_json, create_test_app};

#[tokio::test]
async fn test_register_success() {
    let app = create_test_app();

    let (status, json) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "pw1" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["username"], "alice");
    assert_eq!(json["role"], "regular");
    assert!(json["id"].is_string());
    assert!(json.get("password").is_none());
    assert!(json.get("password_hash").is_none());
    assert!(json.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = create_test_app();
    app.register("alice", "pw1").await;

    let (status, json) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "pw2" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_error_body(&json, 409);
    assert_eq!(json["error"]["message"], "Username is already taken");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = create_test_app();

    for body in [json!({ "username": "alice" }), json!({ "password": "pw1" }), json!({})] {
        let (status, json) = app.request(Method::POST, "/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&json, 400);
    }
}

#[tokio::test]
async fn test_register_malformed_json() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"username\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_body(&body_json(response).await, 400);
}

#[tokio::test]
async fn test_login_success() {
    let app = create_test_app();
    app.register("alice", "pw1").await;

    let (status, json) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "pw1" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["accessToken"].is_string());
    assert_eq!(json["tokenType"], "Bearer");
    assert_eq!(json["expiresIn"], 300);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = create_test_app();
    app.register("alice", "pw1").await;

    let (wrong_status, wrong_body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
    let (ghost_status, ghost_body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "ghost", "password": "pw1" })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, ghost_status);
    assert_eq!(wrong_body["error"]["code"], ghost_body["error"]["code"]);
    assert_eq!(wrong_body["error"]["message"], ghost_body["error"]["message"]);
    assert_eq!(wrong_body["error"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_missing_password() {
    let app = create_test_app();

    let (status, json) = app
        .request(Method::POST, "/auth/login", None, Some(json!({ "username": "alice" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&json, 400);
}

#[tokio::test]
async fn test_me_returns_principal() {
    let app = create_test_app();
    let registered = app.register("alice", "pw1").await;
    let token = app.login("alice", "pw1").await;

    let (status, json) = app.get("/auth/me", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], registered["id"]);
    assert_eq!(json["username"], "alice");
    assert_eq!(json["role"], "regular");
}

#[tokio::test]
async fn test_me_without_token() {
    let app = create_test_app();

    let (status, json) = app.get("/auth/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_body(&json, 401);
    assert_eq!(json["error"]["message"], "Missing credential");
}

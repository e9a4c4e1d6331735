//! 测试公共模块
//! 基于内存存储构建完整应用，并提供请求辅助函数

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use movies_gateway::{
    auth::{ClaimSet, PasswordHasher, TokenCodec},
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, RoleSource, SecurityConfig, ServerConfig,
    },
    middleware::AppState,
    routes::{self, Storage},
};
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置
///
/// Argon2 参数调到最低，保证测试速度。
pub fn create_test_config(role_source: RoleSource) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
            body_limit_bytes: 64 * 1024,
            cors_origins: None,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
            query_timeout_secs: 5,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            access_token_exp_secs: 300, // 5分钟用于测试
            password_memory_kib: 1024,
            password_iterations: 1,
            password_parallelism: 1,
            role_source,
            bootstrap_admin_username: None,
            bootstrap_admin_password: None,
        },
    }
}

/// 测试应用
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub storage: Storage,
}

/// 创建使用内存存储的测试应用（角色来自令牌）
pub fn create_test_app() -> TestApp {
    create_test_app_with(RoleSource::Token)
}

pub fn create_test_app_with(role_source: RoleSource) -> TestApp {
    create_test_app_on(role_source, Storage::in_memory())
}

/// 使用指定存储后端创建测试应用
pub fn create_test_app_on(role_source: RoleSource, storage: Storage) -> TestApp {
    let config = create_test_config(role_source);
    let hasher =
        Arc::new(PasswordHasher::from_config(&config.security).expect("Failed to create hasher"));

    let state = routes::build_state(config, storage.clone(), hasher)
        .expect("Failed to build application state");
    let router = routes::create_router(state.clone());

    TestApp {
        router,
        state,
        storage,
    }
}

/// 与被测应用共享密钥的令牌编解码器，用于构造过期等特殊令牌
pub fn test_codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET, 300).expect("Failed to create token codec")
}

/// 读取响应体为 JSON；空响应体返回 Null
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

impl TestApp {
    /// 发送请求，返回状态码与 JSON 响应体
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    /// 注册并返回响应体
    pub async fn register(&self, username: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body
    }

    /// 登录并返回访问令牌
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// 创建管理员并返回其访问令牌
    pub async fn admin_token(&self, username: &str, password: &str) -> String {
        self.state
            .auth_service
            .ensure_admin(username, password)
            .await
            .expect("Failed to create admin");
        self.login(username, password).await
    }

    /// 为已存在的账户直接签发令牌
    pub fn issue_token(&self, claims: &ClaimSet, ttl: chrono::Duration) -> String {
        test_codec().issue(claims, ttl).unwrap()
    }
}

/// 断言错误响应体格式
pub fn assert_error_body(body: &Value, code: u16) {
    assert_eq!(body["error"]["code"], code, "unexpected error body: {body}");
    assert!(body["error"]["message"].is_string());
    assert!(body["error"]["request_id"].is_string());
}

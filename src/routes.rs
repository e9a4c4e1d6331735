//! 路由注册
//! 创建所有 API 路由，在注册处声明访问策略，并应用中间件

use axum::{
    http::{header, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{
    auth::{
        guard_middleware, Gatekeeper, GuardChain, PasswordHasher, PolicyRouter, RoutePolicy,
        TokenCodec,
    },
    config::{AppConfig, ServerConfig},
    error::AppError,
    handlers,
    middleware::AppState,
    models::user::Role,
    repository::{
        Bounded, CredentialRepository, InMemoryCredentialRepository, InMemoryMovieRepository,
        MovieRepository, PgCredentialRepository, PgMovieRepository,
    },
    services::{AuthService, MovieService, UserService},
};

/// 存储后端
#[derive(Clone)]
pub struct Storage {
    pub credentials: Arc<dyn CredentialRepository>,
    pub movies: Arc<dyn MovieRepository>,
    pub db: Option<PgPool>,
}

impl Storage {
    /// 内存存储（开发与测试）
    pub fn in_memory() -> Self {
        Self {
            credentials: Arc::new(InMemoryCredentialRepository::new()),
            movies: Arc::new(InMemoryMovieRepository::new()),
            db: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            credentials: Arc::new(PgCredentialRepository::new(pool.clone())),
            movies: Arc::new(PgMovieRepository::new(pool.clone())),
            db: Some(pool),
        }
    }

    /// 为每次仓储调用加上截止时间
    pub fn bounded(self, limit: Duration) -> Self {
        Self {
            credentials: Arc::new(Bounded::new(self.credentials, limit)),
            movies: Arc::new(Bounded::new(self.movies, limit)),
            db: self.db,
        }
    }
}

/// 构建应用状态
///
/// 令牌密钥与守卫链在此处一次性创建，之后只读共享。
pub fn build_state(
    config: AppConfig,
    storage: Storage,
    hasher: Arc<PasswordHasher>,
) -> Result<Arc<AppState>, AppError> {
    let codec = Arc::new(TokenCodec::from_config(&config.security)?);

    let auth_service = Arc::new(AuthService::new(
        storage.credentials.clone(),
        hasher,
        codec.clone(),
    ));
    let user_service = Arc::new(UserService::new(storage.credentials.clone()));
    let movie_service = Arc::new(MovieService::new(storage.movies.clone()));

    let guards = GuardChain::standard(
        codec,
        storage.credentials.clone(),
        config.security.role_source,
    );

    Ok(Arc::new(AppState {
        config,
        db: storage.db,
        auth_service,
        user_service,
        movie_service,
        guards,
    }))
}

/// 所有路由及其访问策略
fn api_routes() -> PolicyRouter<Arc<AppState>> {
    use RoutePolicy::*;

    PolicyRouter::new()
        // 健康检查
        .route(Method::GET, "/health", get(handlers::health::health_check), Public)
        .route(Method::GET, "/ready", get(handlers::health::readiness_check), Public)
        // API 文档
        .route(
            Method::GET,
            handlers::docs::OPENAPI_JSON_PATH,
            get(handlers::docs::openapi_json),
            Public,
        )
        .route(Method::GET, "/api", get(handlers::docs::swagger_ui_redirect), Public)
        .route(Method::GET, "/api/", get(handlers::docs::swagger_ui_index), Public)
        .route(
            Method::GET,
            "/api/{*file}",
            get(handlers::docs::swagger_ui_asset),
            Public,
        )
        // 认证
        .route(Method::POST, "/auth/register", post(handlers::auth::register), Public)
        .route(Method::POST, "/auth/login", post(handlers::auth::login), Public)
        .route(
            Method::GET,
            "/auth/me",
            get(handlers::auth::get_current_user),
            AuthenticatedOnly,
        )
        // 用户管理
        .route(
            Method::GET,
            "/users",
            get(handlers::user::list_users),
            RequiresRole(Role::Admin),
        )
        .route(
            Method::GET,
            "/users/{id}",
            get(handlers::user::get_user),
            AuthenticatedOnly,
        )
        .route(
            Method::DELETE,
            "/users/{id}",
            delete(handlers::user::delete_user),
            RequiresRole(Role::Admin),
        )
        .route(
            Method::PATCH,
            "/users/{id}/role",
            patch(handlers::user::update_user_role),
            RequiresRole(Role::Admin),
        )
        // 电影目录
        .route(
            Method::GET,
            "/movies",
            get(handlers::movie::list_movies),
            AuthenticatedOnly,
        )
        .route(
            Method::POST,
            "/movies",
            post(handlers::movie::create_movie),
            RequiresRole(Role::Admin),
        )
        .route(
            Method::GET,
            "/movies/{id}",
            get(handlers::movie::get_movie),
            RequiresRole(Role::Regular),
        )
        .route(
            Method::PUT,
            "/movies/{id}",
            put(handlers::movie::update_movie),
            RequiresRole(Role::Admin),
        )
        .route(
            Method::DELETE,
            "/movies/{id}",
            delete(handlers::movie::delete_movie),
            RequiresRole(Role::Admin),
        )
}

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let (routes, policies) = api_routes().into_parts();
    for (route, policy) in policies.iter() {
        tracing::debug!(%route, %policy, "Route policy registered");
    }
    tracing::info!(routes = policies.len(), "Route policy table built");

    let gatekeeper = Arc::new(Gatekeeper::new(policies, state.guards.clone()));

    // 访问控制只作用于已匹配的路由，未知路径仍返回 404
    routes
        .route_layer(axum::middleware::from_fn_with_state(gatekeeper, guard_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server))
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}

/// CORS 配置
///
/// 配置了 `server.cors_origins` 时只允许列出的来源，否则允许任意来源。
/// 令牌通过 Authorization 头传递，不需要 credentials。
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let allow_origin = match config.cors_origins.as_deref() {
        Some(origins) if !origins.trim().is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                tracing::warn!("cors_origins is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                AllowOrigin::list(origins)
            }
        }
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

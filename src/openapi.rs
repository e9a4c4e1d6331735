//! OpenAPI 文档定义
//!
//! 新增端点时：请求/响应类型派生 `ToSchema`，处理器加 `#[utoipa::path]`，
//! 并在下面的 `paths(...)` 中登记。

use crate::{
    auth::Principal,
    error::{ErrorDetail, ErrorResponse},
    handlers::{
        self,
        health::{HealthCheck, HealthResponse, ReadinessResponse},
        MessageResponse,
    },
    models::{
        auth::{LoginRequest, LoginResponse},
        movie::{CreateMovieRequest, Movie, UpdateMovieRequest},
        user::{RegisterRequest, Role, UpdateRoleRequest, UserResponse},
    },
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Star Wars Movies API",
        description = "API for managing movies and user authentication"
    ),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "auth", description = "Registration, login and the current caller"),
        (name = "users", description = "Account administration"),
        (name = "movies", description = "Movie catalogue")
    ),
    components(
        schemas(
            ErrorResponse,
            ErrorDetail,
            MessageResponse,
            HealthResponse,
            ReadinessResponse,
            HealthCheck,
            Principal,
            Role,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserResponse,
            UpdateRoleRequest,
            Movie,
            CreateMovieRequest,
            UpdateMovieRequest,
        )
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_current_user,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::update_user_role,
        handlers::user::delete_user,
        handlers::movie::list_movies,
        handlers::movie::get_movie,
        handlers::movie::create_movie,
        handlers::movie::update_movie,
        handlers::movie::delete_movie,
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// 注册 `bearer_auth` 安全方案，Swagger UI 中可直接填入访问令牌
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

//! 用户管理的 HTTP 处理器

use super::{parse_id, JsonBody, MessageResponse};
use crate::{
    auth::Principal,
    error::{AppError, ErrorResponse},
    middleware::AppState,
    models::user::*,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

const USER_NOT_FOUND: &str = "User not found";

/// 列出用户
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All accounts", body = [UserResponse]),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let users = state.user_service.list().await?;

    Ok(Json(users))
}

/// 获取用户详情
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID (UUID)")),
    responses(
        (status = 200, description = "The account", body = UserResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let user = state.user_service.get(id).await?;

    Ok(Json(user))
}

/// 修改用户角色
#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    params(("id" = String, Path, description = "User ID (UUID)")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Invalid role provided", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let user = state.user_service.update_role(principal.id(), id, req).await?;

    Ok(Json(user))
}

/// 删除用户
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID (UUID)")),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Cannot delete your own account", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    state.user_service.delete(principal.id(), id).await?;

    Ok(Json(MessageResponse::new("User deleted")))
}

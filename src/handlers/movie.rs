//! 电影目录的 HTTP 处理器

use super::{parse_id, JsonBody, MessageResponse};
use crate::{
    error::{AppError, ErrorResponse},
    middleware::AppState,
    models::movie::*,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

const MOVIE_NOT_FOUND: &str = "Movie not found";

#[utoipa::path(
    get,
    path = "/movies",
    responses(
        (status = 200, description = "The whole catalogue", body = [Movie]),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn list_movies(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let movies = state.movie_service.list().await?;

    Ok(Json(movies))
}

#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie ID (UUID)")),
    responses(
        (status = 200, description = "The movie", body = Movie),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 403, description = "Regular role required", body = ErrorResponse),
        (status = 404, description = "Movie not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, MOVIE_NOT_FOUND)?;
    let movie = state.movie_service.get(id).await?;

    Ok(Json(movie))
}

#[utoipa::path(
    post,
    path = "/movies",
    request_body = CreateMovieRequest,
    responses(
        (status = 201, description = "Movie created", body = Movie),
        (status = 400, description = "Title missing or malformed body", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    let movie = state.movie_service.create(req).await?;

    Ok((StatusCode::CREATED, Json(movie)))
}

#[utoipa::path(
    put,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie ID (UUID)")),
    request_body = UpdateMovieRequest,
    responses(
        (status = 200, description = "Movie updated", body = Movie),
        (status = 400, description = "No fields provided", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Movie not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, MOVIE_NOT_FOUND)?;
    let movie = state.movie_service.update(id, req).await?;

    Ok(Json(movie))
}

#[utoipa::path(
    delete,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie ID (UUID)")),
    responses(
        (status = 200, description = "Movie deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Movie not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "movies"
)]
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, MOVIE_NOT_FOUND)?;
    state.movie_service.delete(id).await?;

    Ok(Json(MessageResponse::new("Movie deleted")))
}

//! API 文档处理器
//! `/api-docs/openapi.json` 提供 OpenAPI 文档，`/api/` 下提供 Swagger UI 静态资源

use crate::{error::AppError, openapi::ApiDoc};
use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::Config;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI 文档
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// `/api` 重定向到 `/api/`，保证 UI 资源的相对路径正确
pub async fn swagger_ui_redirect() -> Redirect {
    Redirect::permanent("/api/")
}

/// Swagger UI 首页
pub async fn swagger_ui_index() -> Result<Response, AppError> {
    serve_swagger_file("")
}

/// Swagger UI 静态资源
pub async fn swagger_ui_asset(Path(file): Path<String>) -> Result<Response, AppError> {
    serve_swagger_file(&file)
}

fn serve_swagger_file(file: &str) -> Result<Response, AppError> {
    let config = Arc::new(Config::from(OPENAPI_JSON_PATH));

    match utoipa_swagger_ui::serve(file, config) {
        Ok(Some(file)) => Ok((
            [(header::CONTENT_TYPE, file.content_type)],
            file.bytes.into_owned(),
        )
            .into_response()),
        Ok(None) => Err(AppError::not_found("Not found")),
        Err(e) => Err(AppError::Internal(format!("swagger ui: {}", e))),
    }
}

//! 电影目录服务

use crate::{
    error::AppError,
    models::movie::*,
    repository::MovieRepository,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const MOVIE_NOT_FOUND: &str = "Movie not found";

pub struct MovieService {
    movies: Arc<dyn MovieRepository>,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieRepository>) -> Self {
        Self { movies }
    }

    pub async fn list(&self) -> Result<Vec<Movie>, AppError> {
        self.movies.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Movie, AppError> {
        self.movies
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(MOVIE_NOT_FOUND))
    }

    /// 创建电影；external_id 只由同步任务写入
    pub async fn create(&self, req: CreateMovieRequest) -> Result<Movie, AppError> {
        req.validate()?;
        let Some(title) = req.title else {
            return Err(AppError::validation("Movie title is required"));
        };

        let movie = self
            .movies
            .insert(NewMovie {
                title,
                opening_crawl: req.opening_crawl,
                director: req.director,
                release_date: req.release_date,
            })
            .await?;

        tracing::info!(movie_id = %movie.id, title = %movie.title, "Movie created");
        Ok(movie)
    }

    /// 部分更新，未提供的字段保持不变
    pub async fn update(&self, id: Uuid, req: UpdateMovieRequest) -> Result<Movie, AppError> {
        req.validate()?;
        if req.is_empty() {
            return Err(AppError::validation("At least one field must be provided"));
        }

        let movie = self
            .movies
            .update(id, req)
            .await?
            .ok_or_else(|| AppError::not_found(MOVIE_NOT_FOUND))?;

        tracing::info!(movie_id = %movie.id, "Movie updated");
        Ok(movie)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.movies.delete(id).await? {
            return Err(AppError::not_found(MOVIE_NOT_FOUND));
        }

        tracing::info!(movie_id = %id, "Movie deleted");
        Ok(())
    }
}

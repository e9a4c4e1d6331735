//! Movie repository (数据库访问层)
//!
//! ```sql
//! CREATE TABLE movies (
//!     id            UUID PRIMARY KEY,
//!     external_id   TEXT UNIQUE,
//!     title         TEXT NOT NULL,
//!     opening_crawl TEXT,
//!     director      TEXT,
//!     release_date  TEXT
//! );
//! ```

use crate::{
    error::AppError,
    models::movie::{Movie, NewMovie, UpdateMovieRequest},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Movie>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError>;

    async fn insert(&self, movie: NewMovie) -> Result<Movie, AppError>;

    /// 部分更新，电影不存在时返回 None
    async fn update(&self, id: Uuid, changes: UpdateMovieRequest) -> Result<Option<Movie>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    external_id: Option<String>,
    title: String,
    opening_crawl: Option<String>,
    director: Option<String>,
    release_date: Option<String>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            title: row.title,
            opening_crawl: row.opening_crawl,
            director: row.director,
            release_date: row.release_date,
        }
    }
}

const MOVIE_COLUMNS: &str = "id, external_id, title, opening_crawl, director, release_date";

/// PostgreSQL-backed movie repository
pub struct PgMovieRepository {
    db: PgPool,
}

impl PgMovieRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovieRepository for PgMovieRepository {
    async fn list(&self) -> Result<Vec<Movie>, AppError> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies ORDER BY release_date NULLS LAST, title",
            MOVIE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies WHERE id = $1",
            MOVIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Movie::from))
    }

    async fn insert(&self, movie: NewMovie) -> Result<Movie, AppError> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            r#"
            INSERT INTO movies (id, title, opening_crawl, director, release_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&movie.title)
        .bind(&movie.opening_crawl)
        .bind(&movie.director)
        .bind(&movie.release_date)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, id: Uuid, changes: UpdateMovieRequest) -> Result<Option<Movie>, AppError> {
        // external_id 不允许通过 API 修改
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            r#"
            UPDATE movies
            SET
                title = COALESCE($2, title),
                opening_crawl = COALESCE($3, opening_crawl),
                director = COALESCE($4, director),
                release_date = COALESCE($5, release_date)
            WHERE id = $1
            RETURNING {}
            "#,
            MOVIE_COLUMNS
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.opening_crawl)
        .bind(&changes.director)
        .bind(&changes.release_date)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Movie::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

//! Deadline decorator for repositories
//!
//! Every call is bounded by `database.query_timeout_secs`. A call that does
//! not finish in time fails the enclosing request with
//! [`AppError::Unavailable`]; nothing is retried.

use super::{CredentialRepository, MovieRepository};
use crate::{
    error::AppError,
    models::{
        movie::{Movie, NewMovie, UpdateMovieRequest},
        user::{Identity, NewIdentity, Role},
    },
};
use async_trait::async_trait;
use std::{future::Future, sync::Arc, time::Duration};
use uuid::Uuid;

/// Run `fut` with a deadline
pub async fn with_deadline<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Repository call timed out"
            );
            metrics::counter!("repository_timeouts_total", "operation" => operation).increment(1);
            Err(AppError::Unavailable(format!("{} timed out", operation)))
        }
    }
}

/// Wraps any repository and bounds each call
pub struct Bounded<R: ?Sized> {
    inner: Arc<R>,
    limit: Duration,
}

impl<R: ?Sized> Bounded<R> {
    pub fn new(inner: Arc<R>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<R> CredentialRepository for Bounded<R>
where
    R: CredentialRepository + ?Sized,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        with_deadline(self.limit, "users.find_by_id", self.inner.find_by_id(id)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        with_deadline(
            self.limit,
            "users.find_by_username",
            self.inner.find_by_username(username),
        )
        .await
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, AppError> {
        with_deadline(self.limit, "users.insert", self.inner.insert(identity)).await
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<Identity>, AppError> {
        with_deadline(self.limit, "users.update_role", self.inner.update_role(id, role)).await
    }

    async fn list(&self) -> Result<Vec<Identity>, AppError> {
        with_deadline(self.limit, "users.list", self.inner.list()).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        with_deadline(self.limit, "users.delete", self.inner.delete(id)).await
    }
}

#[async_trait]
impl<R> MovieRepository for Bounded<R>
where
    R: MovieRepository + ?Sized,
{
    async fn list(&self) -> Result<Vec<Movie>, AppError> {
        with_deadline(self.limit, "movies.list", self.inner.list()).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        with_deadline(self.limit, "movies.find_by_id", self.inner.find_by_id(id)).await
    }

    async fn insert(&self, movie: NewMovie) -> Result<Movie, AppError> {
        with_deadline(self.limit, "movies.insert", self.inner.insert(movie)).await
    }

    async fn update(&self, id: Uuid, changes: UpdateMovieRequest) -> Result<Option<Movie>, AppError> {
        with_deadline(self.limit, "movies.update", self.inner.update(id, changes)).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        with_deadline(self.limit, "movies.delete", self.inner.delete(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCredentialRepository;

    /// Never answers
    struct Stalled;

    #[async_trait]
    impl CredentialRepository for Stalled {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Identity>, AppError> {
            std::future::pending().await
        }
        async fn find_by_username(&self, _username: &str) -> Result<Option<Identity>, AppError> {
            std::future::pending().await
        }
        async fn insert(&self, _identity: NewIdentity) -> Result<Identity, AppError> {
            std::future::pending().await
        }
        async fn update_role(&self, _id: Uuid, _role: Role) -> Result<Option<Identity>, AppError> {
            std::future::pending().await
        }
        async fn list(&self) -> Result<Vec<Identity>, AppError> {
            std::future::pending().await
        }
        async fn delete(&self, _id: Uuid) -> Result<bool, AppError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_unavailable() {
        let repo = Bounded::new(Arc::new(Stalled), Duration::from_millis(20));

        let err = repo.find_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert_eq!(err.code(), 503);
    }

    #[tokio::test]
    async fn test_passes_through_results() {
        let inner: Arc<dyn CredentialRepository> = Arc::new(InMemoryCredentialRepository::new());
        let repo = Bounded::new(inner, Duration::from_secs(1));

        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }
}

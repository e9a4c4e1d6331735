//! In-memory repositories
//!
//! Used when no database URL is configured (local development) and by the
//! test suite. Each mutation holds the write lock for its whole
//! check-and-write, which gives the same uniqueness guarantee as the
//! Postgres constraint.

use super::{credential_repo::USERNAME_TAKEN, CredentialRepository, MovieRepository};
use crate::{
    error::AppError,
    models::{
        movie::{Movie, NewMovie, UpdateMovieRequest},
        user::{Identity, NewIdentity, Role},
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryCredentialRepository {
    users: RwLock<HashMap<Uuid, Identity>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, AppError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == identity.username) {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let stored = Identity {
            id: Uuid::new_v4(),
            username: identity.username,
            password_hash: identity.password_hash,
            role: identity.role,
        };
        users.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<Identity>, AppError> {
        let mut users = self.users.write().await;

        Ok(users.get_mut(&id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn list(&self) -> Result<Vec<Identity>, AppError> {
        let mut users: Vec<Identity> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryMovieRepository {
    movies: RwLock<HashMap<Uuid, Movie>>,
}

impl InMemoryMovieRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovieRepository for InMemoryMovieRepository {
    async fn list(&self) -> Result<Vec<Movie>, AppError> {
        let mut movies: Vec<Movie> = self.movies.read().await.values().cloned().collect();
        movies.sort_by(|a, b| {
            a.release_date
                .is_none()
                .cmp(&b.release_date.is_none())
                .then_with(|| a.release_date.cmp(&b.release_date))
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(movies)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        Ok(self.movies.read().await.get(&id).cloned())
    }

    async fn insert(&self, movie: NewMovie) -> Result<Movie, AppError> {
        let stored = Movie {
            id: Uuid::new_v4(),
            external_id: None,
            title: movie.title,
            opening_crawl: movie.opening_crawl,
            director: movie.director,
            release_date: movie.release_date,
        };
        self.movies.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: Uuid, changes: UpdateMovieRequest) -> Result<Option<Movie>, AppError> {
        let mut movies = self.movies.write().await;

        Ok(movies.get_mut(&id).map(|movie| {
            movie.apply(&changes);
            movie.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.movies.write().await.remove(&id).is_some())
    }
}

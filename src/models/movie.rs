//! Movie catalogue domain models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Movie record
///
/// `external_id` is assigned by the catalogue sync job and is read-only
/// through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub title: String,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub release_date: Option<String>,
}

/// Create movie request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    #[schema(example = "A New Hope")]
    #[validate(
        required(message = "Movie title is required"),
        length(min = 1, max = 255, message = "Movie title must be 1-255 characters")
    )]
    pub title: Option<String>,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub release_date: Option<String>,
}

/// Update movie request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    #[validate(length(min = 1, max = 255, message = "Movie title must be 1-255 characters"))]
    pub title: Option<String>,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub release_date: Option<String>,
}

impl UpdateMovieRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.opening_crawl.is_none()
            && self.director.is_none()
            && self.release_date.is_none()
    }
}

/// Validated insert payload
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub release_date: Option<String>,
}

impl Movie {
    /// Apply a partial update in place
    pub fn apply(&mut self, changes: &UpdateMovieRequest) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(crawl) = &changes.opening_crawl {
            self.opening_crawl = Some(crawl.clone());
        }
        if let Some(director) = &changes.director {
            self.director = Some(director.clone());
        }
        if let Some(date) = &changes.release_date {
            self.release_date = Some(date.clone());
        }
    }
}

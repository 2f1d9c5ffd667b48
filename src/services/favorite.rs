//! Favorite service
//!
//! Favorite and unfavorite resolve the slug through the read model and then
//! apply a single atomic counter delta. There is no read-then-write here, so
//! concurrent requests never lose updates.

use crate::db::repositories::{ArticleReadModel, FavoritesRepository};
use anyhow::Context;
use std::sync::Arc;

/// Error types for favorite service operations
#[derive(Debug, thiserror::Error)]
pub enum FavoriteServiceError {
    /// No article carries the requested slug
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Storage failure
    #[error("Storage error: {0}")]
    StorageError(#[from] anyhow::Error),
}

/// Favorite service
pub struct FavoriteService {
    read_model: Arc<dyn ArticleReadModel>,
    favorites: Arc<dyn FavoritesRepository>,
}

impl FavoriteService {
    pub fn new(
        read_model: Arc<dyn ArticleReadModel>,
        favorites: Arc<dyn FavoritesRepository>,
    ) -> Self {
        Self {
            read_model,
            favorites,
        }
    }

    /// Add one favorite to the article behind `slug`, returning the new count
    pub async fn favorite(&self, slug: &str) -> Result<i64, FavoriteServiceError> {
        self.apply(slug, 1).await
    }

    /// Remove one favorite from the article behind `slug`, returning the new
    /// count. A counter already at zero stays at zero.
    pub async fn unfavorite(&self, slug: &str) -> Result<i64, FavoriteServiceError> {
        self.apply(slug, -1).await
    }

    async fn apply(&self, slug: &str, delta: i64) -> Result<i64, FavoriteServiceError> {
        let article_id = self
            .read_model
            .find_article_id_by_slug(slug)
            .await
            .context("Failed to resolve article slug")?
            .ok_or_else(|| FavoriteServiceError::NotFound(slug.to_string()))?;

        let count = self
            .favorites
            .increment(&article_id, delta)
            .await
            .context("Failed to update favorite count")?;

        tracing::debug!(article_id = %article_id, delta, count, "Favorite count changed");
        Ok(count)
    }
}

//! In-memory storage backend
//!
//! `MemoryStore` holds the article table and the favorite counters in
//! process memory. It is created by the composition root and shared through
//! `Arc`; the repositories below are thin views over it. Every write happens
//! under a single `RwLock` write guard, so multi-field changes are never
//! observed half-applied.

use crate::db::repositories::{
    ArticleChange, ArticleReadModel, ArticleRepository, FavoritesRepository,
};
use crate::models::{Article, ArticleId, ArticleView, FavoriteCount};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored article with its insertion sequence number
#[derive(Debug, Clone)]
struct StoredArticle {
    seq: u64,
    article: Article,
}

#[derive(Debug, Default)]
struct ArticleTable {
    rows: HashMap<ArticleId, StoredArticle>,
    next_seq: u64,
}

impl ArticleTable {
    /// Most recently created article carrying `slug`
    fn latest_by_slug(&self, slug: &str) -> Option<&Article> {
        self.rows
            .values()
            .filter(|row| row.article.slug == slug)
            .max_by_key(|row| row.seq)
            .map(|row| &row.article)
    }

    fn latest_by_slug_mut(&mut self, slug: &str) -> Option<&mut StoredArticle> {
        self.rows
            .values_mut()
            .filter(|row| row.article.slug == slug)
            .max_by_key(|row| row.seq)
    }
}

/// Process-local storage shared by the in-memory repositories
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: RwLock<ArticleTable>,
    favorites: RwLock<HashMap<ArticleId, FavoriteCount>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Remove every article and counter
    pub async fn clear(&self) {
        let mut articles = self.articles.write().await;
        let mut favorites = self.favorites.write().await;
        articles.rows.clear();
        articles.next_seq = 0;
        favorites.clear();
    }
}

// ============================================================================
// Article repository
// ============================================================================

/// Map-backed article repository
pub struct InMemoryArticleRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryArticleRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn boxed(store: Arc<MemoryStore>) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(store))
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn create(&self, article: &Article) -> Result<()> {
        let mut table = self.store.articles.write().await;
        if table.rows.contains_key(&article.id) {
            bail!("Article already exists: {}", article.id);
        }
        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(
            article.id.clone(),
            StoredArticle {
                seq,
                article: article.clone(),
            },
        );
        Ok(())
    }

    async fn update(&self, article: &Article) -> Result<()> {
        let mut table = self.store.articles.write().await;
        match table.rows.get_mut(&article.id) {
            Some(row) => {
                row.article = article.clone();
                Ok(())
            }
            None => bail!("Article not found: {}", article.id),
        }
    }

    async fn update_by_slug(
        &self,
        slug: &str,
        change: &ArticleChange<'_>,
    ) -> Result<Option<Article>> {
        let mut table = self.store.articles.write().await;
        let Some(row) = table.latest_by_slug_mut(slug) else {
            return Ok(None);
        };
        let updated = change(row.article.clone());
        if updated.id != row.article.id {
            bail!("Article id cannot change: {}", row.article.id);
        }
        row.article = updated.clone();
        Ok(Some(updated))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let table = self.store.articles.read().await;
        Ok(table.latest_by_slug(slug).cloned())
    }
}

// ============================================================================
// Favorites repository
// ============================================================================

/// Map-backed favorites repository
pub struct InMemoryFavoritesRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryFavoritesRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn boxed(store: Arc<MemoryStore>) -> Arc<dyn FavoritesRepository> {
        Arc::new(Self::new(store))
    }
}

#[async_trait]
impl FavoritesRepository for InMemoryFavoritesRepository {
    async fn find(&self, article_id: &str) -> Result<i64> {
        let favorites = self.store.favorites.read().await;
        Ok(favorites.get(article_id).map_or(0, |counter| counter.count))
    }

    async fn update(&self, article_id: &str, count: i64) -> Result<()> {
        let mut favorites = self.store.favorites.write().await;
        favorites.insert(
            article_id.to_string(),
            FavoriteCount::new(article_id, count.max(0)),
        );
        Ok(())
    }

    async fn increment(&self, article_id: &str, delta: i64) -> Result<i64> {
        let mut favorites = self.store.favorites.write().await;
        let counter = favorites
            .entry(article_id.to_string())
            .or_insert_with(|| FavoriteCount::new(article_id, 0));
        Ok(counter.apply(delta))
    }
}

// ============================================================================
// Read model
// ============================================================================

/// Read model composed from the two in-memory repositories
pub struct InMemoryArticleReadModel {
    articles: InMemoryArticleRepository,
    favorites: InMemoryFavoritesRepository,
}

impl InMemoryArticleReadModel {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            articles: InMemoryArticleRepository::new(store.clone()),
            favorites: InMemoryFavoritesRepository::new(store),
        }
    }

    pub fn boxed(store: Arc<MemoryStore>) -> Arc<dyn ArticleReadModel> {
        Arc::new(Self::new(store))
    }
}

#[async_trait]
impl ArticleReadModel for InMemoryArticleReadModel {
    async fn find_article_id_by_slug(&self, slug: &str) -> Result<Option<ArticleId>> {
        Ok(self
            .articles
            .find_by_slug(slug)
            .await?
            .map(|article| article.id))
    }

    async fn find_article_by_slug(&self, slug: &str) -> Result<Option<ArticleView>> {
        let Some(article) = self.articles.find_by_slug(slug).await? else {
            return Ok(None);
        };
        let favorites_count = self.favorites.find(&article.id).await?;
        Ok(Some(article.into_view(favorites_count)))
    }
}

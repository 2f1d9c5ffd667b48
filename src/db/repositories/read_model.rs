//! Article read model
//!
//! Query-only projection joining an article, its tags and its favorite
//! counter into an `ArticleView`. It owns no data and never goes through
//! the use-cases.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::repositories::article::{
    load_tags_mysql, load_tags_sqlite, row_to_article_mysql, row_to_article_sqlite,
};
use crate::db::DynDatabasePool;
use crate::models::{ArticleId, ArticleView};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Read model trait
#[async_trait]
pub trait ArticleReadModel: Send + Sync {
    /// Resolve a slug to the id of the article it currently points at
    async fn find_article_id_by_slug(&self, slug: &str) -> Result<Option<ArticleId>>;

    /// Build the public view of the article behind a slug
    async fn find_article_by_slug(&self, slug: &str) -> Result<Option<ArticleView>>;
}

/// SQLx-based read model
pub struct SqlxArticleReadModel {
    pool: DynDatabasePool,
}

impl SqlxArticleReadModel {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleReadModel> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleReadModel for SqlxArticleReadModel {
    async fn find_article_id_by_slug(&self, slug: &str) -> Result<Option<ArticleId>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => find_id_sqlite(sqlite(&self.pool)?, slug).await,
            DatabaseDriver::Mysql => find_id_mysql(mysql(&self.pool)?, slug).await,
        }
    }

    async fn find_article_by_slug(&self, slug: &str) -> Result<Option<ArticleView>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => find_view_sqlite(sqlite(&self.pool)?, slug).await,
            DatabaseDriver::Mysql => find_view_mysql(mysql(&self.pool)?, slug).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn find_id_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<ArticleId>> {
    sqlx::query_scalar("SELECT id FROM article WHERE slug = ? ORDER BY seq DESC LIMIT 1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to resolve article slug")
}

async fn find_view_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<ArticleView>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        r#"
        SELECT a.id, a.slug, a.title, a.body, a.description, a.created_at, a.updated_at,
               COALESCE(f.count, 0) AS favorites_count
        FROM article a
        LEFT JOIN favorite_count f ON f.article_id = a.id
        WHERE a.slug = ?
        ORDER BY a.seq DESC
        LIMIT 1
        "#,
    )
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to load article view")?;

    let view = match row {
        Some(row) => {
            let favorites_count: i64 = row.try_get("favorites_count")?;
            let mut article = row_to_article_sqlite(&row)?;
            article.tag_list = load_tags_sqlite(&mut tx, &article.id).await?;
            Some(article.into_view(favorites_count))
        }
        None => None,
    };

    tx.commit().await?;
    Ok(view)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn find_id_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<ArticleId>> {
    sqlx::query_scalar("SELECT id FROM article WHERE slug = ? ORDER BY seq DESC LIMIT 1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to resolve article slug")
}

async fn find_view_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<ArticleView>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        r#"
        SELECT a.id, a.slug, a.title, a.body, a.description, a.created_at, a.updated_at,
               CAST(COALESCE(f.count, 0) AS SIGNED) AS favorites_count
        FROM article a
        LEFT JOIN favorite_count f ON f.article_id = a.id
        WHERE a.slug = ?
        ORDER BY a.seq DESC
        LIMIT 1
        "#,
    )
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to load article view")?;

    let view = match row {
        Some(row) => {
            let favorites_count: i64 = row.try_get("favorites_count")?;
            let mut article = row_to_article_mysql(&row)?;
            article.tag_list = load_tags_mysql(&mut tx, &article.id).await?;
            Some(article.into_view(favorites_count))
        }
        None => None,
    };

    tx.commit().await?;
    Ok(view)
}

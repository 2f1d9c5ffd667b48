//! Favorites repository
//!
//! Owns the `favorite_count` rows. A row is created lazily on the first
//! write; an absent row reads as zero.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, SqlitePool};
use std::sync::Arc;

/// Favorites repository trait
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Current favorite count of an article, 0 when no counter exists
    async fn find(&self, article_id: &str) -> Result<i64>;

    /// Set the counter to an absolute value, creating it when absent
    async fn update(&self, article_id: &str, count: i64) -> Result<()>;

    /// Apply `delta` to the counter in one atomic storage operation and
    /// return the new value.
    ///
    /// The counter never drops below zero.
    async fn increment(&self, article_id: &str, delta: i64) -> Result<i64>;
}

/// SQLx-based favorites repository implementation
pub struct SqlxFavoritesRepository {
    pool: DynDatabasePool,
}

impl SqlxFavoritesRepository {
    /// Create a new SQLx favorites repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FavoritesRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FavoritesRepository for SqlxFavoritesRepository {
    async fn find(&self, article_id: &str) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => find_count_sqlite(sqlite(&self.pool)?, article_id).await,
            DatabaseDriver::Mysql => find_count_mysql(mysql(&self.pool)?, article_id).await,
        }
    }

    async fn update(&self, article_id: &str, count: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                upsert_count_sqlite(sqlite(&self.pool)?, article_id, count).await
            }
            DatabaseDriver::Mysql => upsert_count_mysql(mysql(&self.pool)?, article_id, count).await,
        }
    }

    async fn increment(&self, article_id: &str, delta: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_count_sqlite(sqlite(&self.pool)?, article_id, delta).await
            }
            DatabaseDriver::Mysql => {
                increment_count_mysql(mysql(&self.pool)?, article_id, delta).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn find_count_sqlite(pool: &SqlitePool, article_id: &str) -> Result<i64> {
    let count: Option<i64> =
        sqlx::query_scalar("SELECT count FROM favorite_count WHERE article_id = ?")
            .bind(article_id)
            .fetch_optional(pool)
            .await
            .context("Failed to get favorite count")?;
    Ok(count.unwrap_or(0))
}

async fn upsert_count_sqlite(pool: &SqlitePool, article_id: &str, count: i64) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO favorite_count (article_id, count) VALUES (?, ?)
           ON CONFLICT(article_id) DO UPDATE SET count = excluded.count"#,
    )
    .bind(article_id)
    .bind(count.max(0))
    .execute(pool)
    .await
    .context("Failed to set favorite count")?;
    Ok(())
}

async fn increment_count_sqlite(pool: &SqlitePool, article_id: &str, delta: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"INSERT INTO favorite_count (article_id, count) VALUES (?, MAX(?, 0))
           ON CONFLICT(article_id) DO UPDATE SET count = MAX(favorite_count.count + ?, 0)
           RETURNING count"#,
    )
    .bind(article_id)
    .bind(delta)
    .bind(delta)
    .fetch_one(pool)
    .await
    .context("Failed to increment favorite count")?;
    Ok(count)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn find_count_mysql(pool: &MySqlPool, article_id: &str) -> Result<i64> {
    let count: Option<i64> =
        sqlx::query_scalar("SELECT count FROM favorite_count WHERE article_id = ?")
            .bind(article_id)
            .fetch_optional(pool)
            .await
            .context("Failed to get favorite count")?;
    Ok(count.unwrap_or(0))
}

async fn upsert_count_mysql(pool: &MySqlPool, article_id: &str, count: i64) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO favorite_count (article_id, count) VALUES (?, ?)
           ON DUPLICATE KEY UPDATE count = VALUES(count)"#,
    )
    .bind(article_id)
    .bind(count.max(0))
    .execute(pool)
    .await
    .context("Failed to set favorite count")?;
    Ok(())
}

async fn increment_count_mysql(pool: &MySqlPool, article_id: &str, delta: i64) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"INSERT INTO favorite_count (article_id, count) VALUES (?, GREATEST(?, 0))
           ON DUPLICATE KEY UPDATE count = GREATEST(count + ?, 0)"#,
    )
    .bind(article_id)
    .bind(delta)
    .bind(delta)
    .execute(&mut *tx)
    .await
    .context("Failed to increment favorite count")?;

    // The row lock taken by the upsert is held until commit.
    let count: i64 = sqlx::query_scalar("SELECT count FROM favorite_count WHERE article_id = ?")
        .bind(article_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read favorite count")?;

    tx.commit().await.context("Failed to commit favorite count")?;
    Ok(count)
}

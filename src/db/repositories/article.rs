//! Article repository
//!
//! This module provides:
//! - `ArticleRepository` trait defining the storage operations the article
//!   use-cases need
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL
//!
//! Article rows and their tag rows are always written together inside one
//! transaction, so readers never see an article with a partial tag set.

use crate::config::DatabaseDriver;
use crate::db::pool::{mysql, sqlite};
use crate::db::DynDatabasePool;
use crate::models::Article;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool, Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

/// Transformation applied to a stored article by `update_by_slug`
pub type ArticleChange<'a> = dyn Fn(Article) -> Article + Send + Sync + 'a;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Persist a new article and its tags.
    ///
    /// Fails if an article with the same id already exists.
    async fn create(&self, article: &Article) -> Result<()>;

    /// Overwrite the stored article with the same id and replace its tags.
    ///
    /// Fails if no article with that id exists.
    async fn update(&self, article: &Article) -> Result<()>;

    /// Read the article behind `slug`, pass it through `change` and store the
    /// result, with no other writer able to touch the article in between.
    ///
    /// Returns `None` without writing if no article carries `slug`.
    async fn update_by_slug(
        &self,
        slug: &str,
        change: &ArticleChange<'_>,
    ) -> Result<Option<Article>>;

    /// Find an article by slug.
    ///
    /// Slugs are not unique; when several articles share one, the most
    /// recently created article is returned.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_article_sqlite(sqlite(&self.pool)?, article).await,
            DatabaseDriver::Mysql => create_article_mysql(mysql(&self.pool)?, article).await,
        }
    }

    async fn update(&self, article: &Article) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_article_sqlite(sqlite(&self.pool)?, article).await,
            DatabaseDriver::Mysql => update_article_mysql(mysql(&self.pool)?, article).await,
        }
    }

    async fn update_by_slug(
        &self,
        slug: &str,
        change: &ArticleChange<'_>,
    ) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_article_by_slug_sqlite(sqlite(&self.pool)?, slug, change).await
            }
            DatabaseDriver::Mysql => {
                update_article_by_slug_mysql(mysql(&self.pool)?, slug, change).await
            }
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => find_article_by_slug_sqlite(sqlite(&self.pool)?, slug).await,
            DatabaseDriver::Mysql => find_article_by_slug_mysql(mysql(&self.pool)?, slug).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        INSERT INTO article (id, slug, title, body, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.id)
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.body)
    .bind(&article.description)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("Failed to create article {}", article.id))?;

    insert_tags_sqlite(&mut tx, &article.id, &article.tag_list).await?;

    tx.commit().await.context("Failed to commit article creation")?;
    Ok(())
}

async fn update_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    write_article_sqlite(&mut tx, article).await?;
    tx.commit().await.context("Failed to commit article update")?;
    Ok(())
}

async fn update_article_by_slug_sqlite(
    pool: &SqlitePool,
    slug: &str,
    change: &ArticleChange<'_>,
) -> Result<Option<Article>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // Writing first takes the database write lock before the read, so a
    // concurrent update waits on the busy handler instead of reading a
    // snapshot it would later overwrite.
    sqlx::query("UPDATE article SET updated_at = updated_at WHERE slug = ?")
        .bind(slug)
        .execute(&mut *tx)
        .await
        .context("Failed to lock article")?;

    let row = sqlx::query(
        r#"
        SELECT id, slug, title, body, description, created_at, updated_at
        FROM article
        WHERE slug = ?
        ORDER BY seq DESC
        LIMIT 1
        "#,
    )
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to get article by slug")?;

    let Some(row) = row else {
        tx.rollback().await.context("Failed to roll back")?;
        return Ok(None);
    };
    let mut current = row_to_article_sqlite(&row)?;
    current.tag_list = load_tags_sqlite(&mut tx, &current.id).await?;

    let updated = change(current);
    write_article_sqlite(&mut tx, &updated).await?;

    tx.commit().await.context("Failed to commit article update")?;
    Ok(Some(updated))
}

/// Overwrite an article row and replace its tags (SQLite)
async fn write_article_sqlite(conn: &mut SqliteConnection, article: &Article) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE article
        SET slug = ?, title = ?, body = ?, description = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.body)
    .bind(&article.description)
    .bind(article.updated_at)
    .bind(&article.id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update article {}", article.id))?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Article not found: {}", article.id);
    }

    sqlx::query("DELETE FROM tags WHERE article_id = ?")
        .bind(&article.id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear article tags")?;

    insert_tags_sqlite(conn, &article.id, &article.tag_list).await
}

async fn find_article_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Article>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        r#"
        SELECT id, slug, title, body, description, created_at, updated_at
        FROM article
        WHERE slug = ?
        ORDER BY seq DESC
        LIMIT 1
        "#,
    )
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to get article by slug")?;

    let article = match row {
        Some(row) => {
            let mut article = row_to_article_sqlite(&row)?;
            article.tag_list = load_tags_sqlite(&mut tx, &article.id).await?;
            Some(article)
        }
        None => None,
    };

    tx.commit().await?;
    Ok(article)
}

async fn insert_tags_sqlite(
    conn: &mut SqliteConnection,
    article_id: &str,
    tags: &[String],
) -> Result<()> {
    for (position, name) in tags.iter().enumerate() {
        sqlx::query("INSERT INTO tags (article_id, position, name) VALUES (?, ?, ?)")
            .bind(article_id)
            .bind(position as i64)
            .bind(name)
            .execute(&mut *conn)
            .await
            .context("Failed to insert article tag")?;
    }
    Ok(())
}

/// Load the ordered tag names of an article (SQLite)
pub(crate) async fn load_tags_sqlite(
    conn: &mut SqliteConnection,
    article_id: &str,
) -> Result<Vec<String>> {
    sqlx::query_scalar("SELECT name FROM tags WHERE article_id = ? ORDER BY position")
        .bind(article_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load article tags")
}

/// Map an article row (SQLite); tags are loaded separately
pub(crate) fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        description: row.try_get("description")?,
        tag_list: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, article: &Article) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        INSERT INTO article (id, slug, title, body, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.id)
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.body)
    .bind(&article.description)
    .bind(article.created_at)
    .bind(article.updated_at)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("Failed to create article {}", article.id))?;

    insert_tags_mysql(&mut tx, &article.id, &article.tag_list).await?;

    tx.commit().await.context("Failed to commit article creation")?;
    Ok(())
}

async fn update_article_mysql(pool: &MySqlPool, article: &Article) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // MySQL reports changed rows, not matched rows, so existence is checked first.
    let exists: Option<String> =
        sqlx::query_scalar("SELECT id FROM article WHERE id = ? FOR UPDATE")
            .bind(&article.id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to lock article")?;
    if exists.is_none() {
        anyhow::bail!("Article not found: {}", article.id);
    }

    write_article_mysql(&mut tx, article).await?;

    tx.commit().await.context("Failed to commit article update")?;
    Ok(())
}

async fn update_article_by_slug_mysql(
    pool: &MySqlPool,
    slug: &str,
    change: &ArticleChange<'_>,
) -> Result<Option<Article>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        r#"
        SELECT id, slug, title, body, description, created_at, updated_at
        FROM article
        WHERE slug = ?
        ORDER BY seq DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to lock article by slug")?;

    let Some(row) = row else {
        tx.rollback().await.context("Failed to roll back")?;
        return Ok(None);
    };
    let mut current = row_to_article_mysql(&row)?;
    current.tag_list = load_tags_mysql(&mut tx, &current.id).await?;

    let updated = change(current);
    write_article_mysql(&mut tx, &updated).await?;

    tx.commit().await.context("Failed to commit article update")?;
    Ok(Some(updated))
}

/// Overwrite a locked article row and replace its tags (MySQL)
async fn write_article_mysql(conn: &mut MySqlConnection, article: &Article) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE article
        SET slug = ?, title = ?, body = ?, description = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.body)
    .bind(&article.description)
    .bind(article.updated_at)
    .bind(&article.id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update article {}", article.id))?;

    sqlx::query("DELETE FROM tags WHERE article_id = ?")
        .bind(&article.id)
        .execute(&mut *conn)
        .await
        .context("Failed to clear article tags")?;

    insert_tags_mysql(conn, &article.id, &article.tag_list).await
}

async fn find_article_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Article>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let row = sqlx::query(
        r#"
        SELECT id, slug, title, body, description, created_at, updated_at
        FROM article
        WHERE slug = ?
        ORDER BY seq DESC
        LIMIT 1
        "#,
    )
    .bind(slug)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to get article by slug")?;

    let article = match row {
        Some(row) => {
            let mut article = row_to_article_mysql(&row)?;
            article.tag_list = load_tags_mysql(&mut tx, &article.id).await?;
            Some(article)
        }
        None => None,
    };

    tx.commit().await?;
    Ok(article)
}

async fn insert_tags_mysql(
    conn: &mut MySqlConnection,
    article_id: &str,
    tags: &[String],
) -> Result<()> {
    for (position, name) in tags.iter().enumerate() {
        sqlx::query("INSERT INTO tags (article_id, position, name) VALUES (?, ?, ?)")
            .bind(article_id)
            .bind(position as i64)
            .bind(name)
            .execute(&mut *conn)
            .await
            .context("Failed to insert article tag")?;
    }
    Ok(())
}

/// Load the ordered tag names of an article (MySQL)
pub(crate) async fn load_tags_mysql(
    conn: &mut MySqlConnection,
    article_id: &str,
) -> Result<Vec<String>> {
    sqlx::query_scalar("SELECT name FROM tags WHERE article_id = ? ORDER BY position")
        .bind(article_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load article tags")
}

/// Map an article row (MySQL); tags are loaded separately
pub(crate) fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        description: row.try_get("description")?,
        tag_list: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{create_pool, create_test_pool, migrations};
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxArticleRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxArticleRepository::new(pool.clone());
        (pool, repo)
    }

    /// File-backed repository, for tests that fail transactions or write
    /// from several connections at once
    async fn setup_file_repo() -> (TempDir, DynDatabasePool, SqlxArticleRepository) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url: temp_dir.path().join("conduit.db").to_string_lossy().to_string(),
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxArticleRepository::new(pool.clone());
        (temp_dir, pool, repo)
    }

    /// Make every insert of a tag named `boom` fail
    async fn install_failing_tag_trigger(pool: &DynDatabasePool) {
        pool.execute(
            "CREATE TRIGGER fail_on_boom_tag BEFORE INSERT ON tags WHEN NEW.name = 'boom' \
             BEGIN SELECT RAISE(ABORT, 'boom'); END",
        )
        .await
        .expect("Failed to create trigger");
    }

    fn create_test_article(id: &str, slug: &str, tags: &[&str]) -> Article {
        let at = Utc.with_ymd_and_hms(2010, 11, 10, 12, 0, 0).unwrap();
        Article {
            id: id.to_string(),
            slug: slug.to_string(),
            title: format!("Title {}", id),
            body: "body".to_string(),
            description: "description".to_string(),
            tag_list: tags.iter().map(|t| t.to_string()).collect(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_article() {
        let (_pool, repo) = setup_test_repo().await;
        let article = create_test_article("a1", "the-title", &["tag1", "tag2"]);

        repo.create(&article).await.expect("Failed to create article");

        let found = repo
            .find_by_slug("the-title")
            .await
            .expect("Failed to find article")
            .expect("Article not found");
        assert_eq!(found, article);
    }

    #[tokio::test]
    async fn test_find_by_slug_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.find_by_slug("nonexistent").await.expect("Query failed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_tag_order_is_preserved() {
        let (_pool, repo) = setup_test_repo().await;
        let article = create_test_article("a1", "ordered", &["zeta", "alpha", "mid", "alpha"]);

        repo.create(&article).await.unwrap();

        let found = repo.find_by_slug("ordered").await.unwrap().unwrap();
        assert_eq!(found.tag_list, vec!["zeta", "alpha", "mid", "alpha"]);
    }

    #[tokio::test]
    async fn test_create_duplicate_id_fails() {
        let (_pool, repo) = setup_test_repo().await;
        let article = create_test_article("a1", "first", &[]);

        repo.create(&article).await.unwrap();
        let duplicate = create_test_article("a1", "second", &["t"]);
        let result = repo.create(&duplicate).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_tags() {
        let (pool, repo) = setup_test_repo().await;
        let article = create_test_article("a1", "the-title", &["tag1", "tag2"]);
        repo.create(&article).await.unwrap();

        let mut updated = article.clone();
        updated.title = "The title updated".to_string();
        updated.slug = "the-title-updated".to_string();
        updated.body = "body updated".to_string();
        updated.tag_list = vec!["tag1".to_string(), "tag3".to_string()];
        updated.updated_at = article.created_at + Duration::hours(1);
        repo.update(&updated).await.expect("Failed to update");

        assert!(repo.find_by_slug("the-title").await.unwrap().is_none());
        let found = repo.find_by_slug("the-title-updated").await.unwrap().unwrap();
        assert_eq!(found, updated);

        let tag_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE article_id = 'a1'")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(tag_rows, 2);
    }

    #[tokio::test]
    async fn test_update_missing_article_fails() {
        let (_pool, repo) = setup_test_repo().await;
        let article = create_test_article("ghost", "ghost", &["t"]);

        let result = repo.update(&article).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_slug_returns_most_recently_created() {
        let (_pool, repo) = setup_test_repo().await;
        let older = create_test_article("b", "shared", &["old"]);
        let newer = create_test_article("a", "shared", &["new"]);

        repo.create(&older).await.unwrap();
        repo.create(&newer).await.unwrap();

        let found = repo.find_by_slug("shared").await.unwrap().unwrap();
        assert_eq!(found.id, "a");

        // Updating the older article does not change the tie-break
        repo.update(&older).await.unwrap();
        let found = repo.find_by_slug("shared").await.unwrap().unwrap();
        assert_eq!(found.id, "a");
    }

    #[tokio::test]
    async fn test_duplicate_slug_order_survives_vacuum() {
        let (_dir, pool, repo) = setup_file_repo().await;
        repo.create(&create_test_article("b", "shared", &[]))
            .await
            .unwrap();
        repo.create(&create_test_article("a", "shared", &[]))
            .await
            .unwrap();

        pool.execute("VACUUM").await.expect("Failed to vacuum");

        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM article ORDER BY seq")
            .fetch_all(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(repo.find_by_slug("shared").await.unwrap().unwrap().id, "a");
        pool.close().await;
    }

    #[tokio::test]
    async fn test_failed_create_leaves_no_article_row() {
        let (_dir, pool, repo) = setup_file_repo().await;
        install_failing_tag_trigger(&pool).await;

        let article = create_test_article("a1", "the-title", &["ok", "boom"]);
        assert!(repo.create(&article).await.is_err());

        assert!(repo.find_by_slug("the-title").await.unwrap().is_none());
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(rows, 0);
        let tag_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(tag_rows, 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_article() {
        let (_dir, pool, repo) = setup_file_repo().await;
        let article = create_test_article("a1", "the-title", &["tag1", "tag2"]);
        repo.create(&article).await.unwrap();
        install_failing_tag_trigger(&pool).await;

        let mut updated = article.clone();
        updated.title = "Other title".to_string();
        updated.tag_list = vec!["tag3".to_string(), "boom".to_string()];
        assert!(repo.update(&updated).await.is_err());

        let result = repo
            .update_by_slug("the-title", &|mut current: Article| {
                current.title = "Other title".to_string();
                current.tag_list = vec!["boom".to_string()];
                current
            })
            .await;
        assert!(result.is_err());

        let found = repo.find_by_slug("the-title").await.unwrap().unwrap();
        assert_eq!(found.title, "Title a1");
        assert_eq!(found.tag_list, vec!["tag1", "tag2"]);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_update_by_slug_applies_change_to_newest() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_article("b", "shared", &["old"]))
            .await
            .unwrap();
        repo.create(&create_test_article("a", "shared", &["new"]))
            .await
            .unwrap();

        let updated = repo
            .update_by_slug("shared", &|mut current: Article| {
                current.slug = "moved".to_string();
                current.tag_list.push("extra".to_string());
                current
            })
            .await
            .expect("Failed to update")
            .expect("Article not found");

        assert_eq!(updated.id, "a");
        assert_eq!(updated.tag_list, vec!["new", "extra"]);
        assert_eq!(repo.find_by_slug("moved").await.unwrap(), Some(updated));
        assert_eq!(repo.find_by_slug("shared").await.unwrap().unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_update_by_slug_missing_returns_none() {
        let (_pool, repo) = setup_test_repo().await;

        let result = repo
            .update_by_slug("ghost", &|current: Article| current)
            .await
            .expect("Query failed");
        assert!(result.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_update_by_slug_serializes_changes() {
        let (_dir, pool, repo) = setup_file_repo().await;
        repo.create(&create_test_article("a1", "the-title", &[]))
            .await
            .unwrap();
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.update_by_slug("the-title", &move |mut current: Article| {
                        current.tag_list.push(format!("t{}", i));
                        current
                    })
                    .await
                })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.expect("Task panicked").expect("Update failed");
        }

        let found = repo.find_by_slug("the-title").await.unwrap().unwrap();
        assert_eq!(found.tag_list.len(), 10);
        pool.close().await;
    }
}

//! Database migrations
//!
//! Schema migrations are embedded as SQL strings for both SQLite and MySQL
//! and tracked in the `_migrations` table.
//!
//! ```ignore
//! use conduit::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use sqlx::{MySqlPool, SqlitePool};

use super::pool::{mysql, sqlite};
use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// All schema migrations, in application order.
///
/// The article table keeps insertion order in an explicit `seq` column so
/// duplicate slugs resolve to the most recently created article.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_article",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS article (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id VARCHAR(64) NOT NULL UNIQUE,
                slug VARCHAR(255) NOT NULL,
                title VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_article_slug ON article(slug);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS article (
                id VARCHAR(64) PRIMARY KEY,
                seq BIGINT NOT NULL AUTO_INCREMENT UNIQUE,
                slug VARCHAR(255) NOT NULL,
                title VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL
            );
            CREATE INDEX idx_article_slug ON article(slug);
        "#,
    },
    Migration {
        version: 2,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                article_id VARCHAR(64) NOT NULL,
                position INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                FOREIGN KEY (article_id) REFERENCES article(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tags_article_id ON tags(article_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                article_id VARCHAR(64) NOT NULL,
                position INT NOT NULL,
                name VARCHAR(255) NOT NULL,
                FOREIGN KEY (article_id) REFERENCES article(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_tags_article_id ON tags(article_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_favorite_count",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS favorite_count (
                article_id VARCHAR(64) PRIMARY KEY,
                count INTEGER NOT NULL,
                FOREIGN KEY (article_id) REFERENCES article(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS favorite_count (
                article_id VARCHAR(64) PRIMARY KEY,
                count BIGINT NOT NULL,
                FOREIGN KEY (article_id) REFERENCES article(id) ON DELETE CASCADE
            );
        "#,
    },
];

/// Run all pending migrations
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_versions(pool).await?;

    let mut count = 0;
    for migration in MIGRATIONS {
        if !applied.contains(&migration.version) {
            tracing::debug!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    let versions: Vec<i64> = match pool.driver() {
        DatabaseDriver::Sqlite => {
            sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
                .fetch_all(sqlite(pool)?)
                .await?
        }
        DatabaseDriver::Mysql => {
            let versions: Vec<i32> =
                sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
                    .fetch_all(mysql(pool)?)
                    .await?;
            versions.into_iter().map(i64::from).collect()
        }
    };

    Ok(versions.into_iter().map(|v| v as i32).collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(sqlite(pool)?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(mysql(pool)?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;

    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

// MySQL commits DDL implicitly, so statements run one by one on the pool.
async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping empty and comment-only ones
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_versions(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .count())
}

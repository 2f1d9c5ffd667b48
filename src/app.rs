//! Composition root
//!
//! Picks a storage backend and wires repositories, id generation, the clock
//! and the services into an `AppState` shared by every request handler.

use crate::config::{Config, StorageBackend};
use crate::db::memory::{
    InMemoryArticleReadModel, InMemoryArticleRepository, InMemoryFavoritesRepository,
};
use crate::db::repositories::{
    ArticleReadModel, FavoritesRepository, SqlxArticleReadModel, SqlxArticleRepository,
    SqlxFavoritesRepository,
};
use crate::db::{self, DynDatabasePool, MemoryStore};
use crate::services::{
    ArticleService, Clock, FavoriteService, IncrementIdGenerator, SystemClock, UuidGenerator,
};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Storage owned by the application
#[derive(Clone)]
pub enum Storage {
    Memory(Arc<MemoryStore>),
    Database(DynDatabasePool),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub article_service: Arc<ArticleService>,
    pub favorite_service: Arc<FavoriteService>,
    pub read_model: Arc<dyn ArticleReadModel>,
    pub favorites: Arc<dyn FavoritesRepository>,
    pub storage: Storage,
}

impl AppState {
    /// State backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Self {
        let store = MemoryStore::new();
        let read_model = InMemoryArticleReadModel::boxed(store.clone());
        let favorites = InMemoryFavoritesRepository::boxed(store.clone());

        let article_service = Arc::new(ArticleService::new(
            InMemoryArticleRepository::boxed(store.clone()),
            Arc::new(IncrementIdGenerator::new()),
            clock,
        ));
        let favorite_service = Arc::new(FavoriteService::new(read_model.clone(), favorites.clone()));

        Self {
            article_service,
            favorite_service,
            read_model,
            favorites,
            storage: Storage::Memory(store),
        }
    }

    /// State backed by a migrated database pool
    pub fn with_database(pool: DynDatabasePool) -> Self {
        Self::with_database_and_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_database_and_clock(pool: DynDatabasePool, clock: Arc<dyn Clock>) -> Self {
        let read_model = SqlxArticleReadModel::boxed(pool.clone());
        let favorites = SqlxFavoritesRepository::boxed(pool.clone());

        let article_service = Arc::new(ArticleService::new(
            SqlxArticleRepository::boxed(pool.clone()),
            Arc::new(UuidGenerator),
            clock,
        ));
        let favorite_service = Arc::new(FavoriteService::new(read_model.clone(), favorites.clone()));

        Self {
            article_service,
            favorite_service,
            read_model,
            favorites,
            storage: Storage::Database(pool),
        }
    }

    /// Build the state selected by `config.storage.backend`
    ///
    /// The database backend connects and applies pending migrations first.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.storage.backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Database => {
                let pool = db::create_pool(&config.database).await?;
                tracing::info!("Database connected: {:?}", config.database.driver);

                let pending = db::migrations::pending_count(&pool).await?;
                if pending > 0 {
                    tracing::info!("{} pending database migration(s)", pending);
                }
                let applied = db::migrations::run_migrations(&pool).await?;
                tracing::info!("Database migrations completed ({} applied)", applied);

                Ok(Self::with_database(pool))
            }
        }
    }

    /// Remove all articles, tags and favorite counters
    pub async fn clean(&self) -> Result<()> {
        match &self.storage {
            Storage::Memory(store) => store.clear().await,
            Storage::Database(pool) => {
                for table in ["favorite_count", "tags", "article"] {
                    pool.execute(&format!("DELETE FROM {}", table))
                        .await
                        .with_context(|| format!("Failed to clean table {}", table))?;
                }
            }
        }
        Ok(())
    }
}

//! Storage layer
//!
//! Two interchangeable backends implement the repository traits:
//! - `memory`: volatile maps behind an explicit `MemoryStore`
//! - `repositories`: sqlx-backed tables on SQLite or MySQL
//!
//! The relational driver is selected from configuration through the
//! `DatabasePool` abstraction.
//!
//! # Usage
//!
//! ```ignore
//! use conduit::config::DatabaseConfig;
//! use conduit::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use memory::MemoryStore;
pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

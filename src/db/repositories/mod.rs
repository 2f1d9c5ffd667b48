//! Database repositories
//!
//! Repository pattern implementations for relational storage.
//! Each repository owns the rows of one aggregate; the read model joins
//! them for queries.

pub mod article;
pub mod favorite;
pub mod read_model;

pub use article::{ArticleChange, ArticleRepository, SqlxArticleRepository};
pub use favorite::{FavoritesRepository, SqlxFavoritesRepository};
pub use read_model::{ArticleReadModel, SqlxArticleReadModel};

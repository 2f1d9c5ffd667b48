//! Data models
//!
//! This module contains the data structures shared by every layer:
//! - Aggregates owned by repositories (Article, FavoriteCount)
//! - The client-facing read projection (ArticleView)
//! - Use-case input types

mod article;
mod favorite;

pub use article::{Article, ArticleId, ArticleView, CreateArticleInput, UpdateArticleInput};
pub use favorite::FavoriteCount;

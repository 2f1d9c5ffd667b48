//! Favorite counter model
//!
//! The counter is denormalized: it lives apart from the article row and is
//! created lazily on the first favorite. An absent counter reads as zero.

use serde::{Deserialize, Serialize};

use super::ArticleId;

/// Favorite count for one article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCount {
    /// Article this counter belongs to
    pub article_id: ArticleId,
    /// Number of favorites, never negative
    pub count: i64,
}

impl FavoriteCount {
    /// Create a new FavoriteCount
    pub fn new(article_id: impl Into<ArticleId>, count: i64) -> Self {
        Self {
            article_id: article_id.into(),
            count,
        }
    }

    /// Apply `delta` in place, returning the new value
    pub fn apply(&mut self, delta: i64) -> i64 {
        self.count = Self::apply_delta(self.count, delta);
        self.count
    }

    /// Counter value after applying `delta`, floored at zero
    pub fn apply_delta(current: i64, delta: i64) -> i64 {
        current.saturating_add(delta).max(0)
    }
}

//! Article model
//!
//! This module provides:
//! - `Article` aggregate as stored by the article repository
//! - `ArticleView` read projection served to clients
//! - Input types for creating and updating articles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque article identifier assigned by an `IdGenerator`
pub type ArticleId = String;

/// Article aggregate
///
/// `id` never changes after creation. `slug` is derived from `title` and is
/// recomputed whenever the article is updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique identifier
    pub id: ArticleId,
    /// URL-friendly slug derived from the title
    pub slug: String,
    /// Article title
    pub title: String,
    /// Article body
    pub body: String,
    /// Short description
    pub description: String,
    /// Ordered tag names
    pub tag_list: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Build the public projection of this article with the given favorite count
    pub fn into_view(self, favorites_count: i64) -> ArticleView {
        ArticleView {
            slug: self.slug,
            title: self.title,
            body: self.body,
            description: self.description,
            tag_list: self.tag_list,
            created_at: self.created_at,
            updated_at: self.updated_at,
            favorites_count,
        }
    }
}

/// Read-only article projection
///
/// Combines the article fields (minus the internal id) with the favorite
/// counter. Reconstructed on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub description: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorites_count: i64,
}

/// Input for creating a new article
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput {
    /// Article title (must not be empty)
    pub title: String,
    /// Short description
    pub description: String,
    /// Ordered tag names
    pub tag_list: Vec<String>,
    /// Article body
    pub body: String,
}

impl CreateArticleInput {
    /// Create a new CreateArticleInput
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        tag_list: Vec<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tag_list,
            body: body.into(),
        }
    }
}

/// Partial input for updating an article
///
/// `None` keeps the stored value; `Some` replaces it, including with an
/// empty string or an empty tag list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag_list: Option<Vec<String>>,
    pub body: Option<String>,
}

impl UpdateArticleInput {
    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tag list
    pub fn with_tag_list(mut self, tag_list: Vec<String>) -> Self {
        self.tag_list = Some(tag_list);
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Merge this input over an existing article, keeping fields that are `None`.
    ///
    /// The slug and timestamps are left untouched; the caller owns them.
    pub fn apply_to(self, mut article: Article) -> Article {
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(description) = self.description {
            article.description = description;
        }
        if let Some(tag_list) = self.tag_list {
            article.tag_list = tag_list;
        }
        if let Some(body) = self.body {
            article.body = body;
        }
        article
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_article() -> Article {
        let at = Utc.with_ymd_and_hms(2010, 11, 10, 0, 0, 0).unwrap();
        Article {
            id: "1".to_string(),
            slug: "the-title".to_string(),
            title: "The title".to_string(),
            body: "body".to_string(),
            description: "description".to_string(),
            tag_list: vec!["tag1".to_string(), "tag2".to_string()],
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_into_view_drops_id_and_adds_count() {
        let article = sample_article();
        let view = article.clone().into_view(3);

        assert_eq!(view.slug, article.slug);
        assert_eq!(view.tag_list, article.tag_list);
        assert_eq!(view.favorites_count, 3);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["favoritesCount"], 3);
        assert_eq!(json["tagList"], serde_json::json!(["tag1", "tag2"]));
    }

    #[test]
    fn test_apply_to_keeps_omitted_fields() {
        let article = sample_article();
        let merged = UpdateArticleInput::default()
            .with_body("new body")
            .apply_to(article.clone());

        assert_eq!(merged.body, "new body");
        assert_eq!(merged.title, article.title);
        assert_eq!(merged.description, article.description);
        assert_eq!(merged.tag_list, article.tag_list);
    }

    #[test]
    fn test_apply_to_explicit_empty_clears() {
        let merged = UpdateArticleInput::default()
            .with_description("")
            .with_tag_list(vec![])
            .apply_to(sample_article());

        assert_eq!(merged.description, "");
        assert!(merged.tag_list.is_empty());
    }

    #[test]
    fn test_update_input_deserializes_partial_camel_case() {
        let input: UpdateArticleInput =
            serde_json::from_str(r#"{"title": "New", "tagList": ["a"]}"#).unwrap();

        assert_eq!(input.title.as_deref(), Some("New"));
        assert_eq!(input.tag_list, Some(vec!["a".to_string()]));
        assert!(input.body.is_none());
        assert!(input.description.is_none());
    }
}

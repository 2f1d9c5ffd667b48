//! Article API endpoints
//!
//! Handles HTTP requests for articles:
//! - POST /api/articles - Create article
//! - GET /api/articles/{slug} - Get article view by slug
//! - PUT /api/articles/{slug} - Partially update article
//!
//! Request bodies are validated field by field before reaching the
//! services, so a rejected request reports every invalid field at once.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::api::middleware::ApiError;
use crate::api::responses::{ArticleEnvelope, FieldError};
use crate::app::AppState;
use crate::models::{ArticleView, CreateArticleInput, UpdateArticleInput};

type ArticleResponse = Json<ArticleEnvelope<ArticleView>>;

/// Wire order of article fields, used to sort validation details
const FIELD_ORDER: [&str; 4] = ["title", "description", "tagList", "body"];

/// Request body for creating an article
///
/// Every field is optional at the serde level so that missing fields are
/// reported by validation, one entry each.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    #[validate(required, length(min = 1, message = "Must not be empty"))]
    pub title: Option<String>,
    #[validate(required)]
    pub description: Option<String>,
    #[validate(required)]
    pub tag_list: Option<Vec<String>>,
    #[validate(required)]
    pub body: Option<String>,
}

impl CreateArticleRequest {
    fn into_input(self) -> Result<CreateArticleInput, ApiError> {
        match (self.title, self.description, self.tag_list, self.body) {
            (Some(title), Some(description), Some(tag_list), Some(body)) => {
                Ok(CreateArticleInput::new(title, description, tag_list, body))
            }
            _ => Err(ApiError::validation_error("Missing article fields")),
        }
    }
}

/// Request body for a partial article update
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag_list: Option<Vec<String>>,
    pub body: Option<String>,
}

impl From<UpdateArticleRequest> for UpdateArticleInput {
    fn from(req: UpdateArticleRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            tag_list: req.tag_list,
            body: req.body,
        }
    }
}

/// POST /api/articles - Create new article
pub async fn create_article(
    State(state): State<AppState>,
    payload: Result<Json<ArticleEnvelope<CreateArticleRequest>>, JsonRejection>,
) -> Result<ArticleResponse, ApiError> {
    let Json(ArticleEnvelope { article: request }) =
        payload.map_err(|e| ApiError::validation_error(e.body_text()))?;
    request.validate().map_err(invalid_fields)?;

    let article = state.article_service.create(request.into_input()?).await?;

    // A new article has no favorite counter yet
    Ok(Json(ArticleEnvelope::new(article.into_view(0))))
}

/// PUT /api/articles/{slug} - Update article
pub async fn update_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    payload: Result<Json<ArticleEnvelope<UpdateArticleRequest>>, JsonRejection>,
) -> Result<ArticleResponse, ApiError> {
    let Json(ArticleEnvelope { article: request }) =
        payload.map_err(|e| ApiError::validation_error(e.body_text()))?;
    request.validate().map_err(invalid_fields)?;

    let article = state.article_service.update(&slug, request.into()).await?;
    let favorites_count = state.favorites.find(&article.id).await.map_err(|e| {
        tracing::error!("Failed to read favorite count: {:#}", e);
        ApiError::internal_error("Storage failure")
    })?;

    Ok(Json(ArticleEnvelope::new(article.into_view(favorites_count))))
}

/// GET /api/articles/{slug} - Get article view
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ArticleResponse, ApiError> {
    let view = state
        .read_model
        .find_article_by_slug(&slug)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load article view: {:#}", e);
            ApiError::internal_error("Storage failure")
        })?
        .ok_or_else(|| ApiError::not_found(format!("Article with slug {} does not exist", slug)))?;

    Ok(Json(ArticleEnvelope::new(view)))
}

/// Flatten validator output into one `FieldError` per failed rule, keyed by
/// the camelCase wire name
fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            let field = wire_name(&field.to_string());
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                FieldError::new(field.clone(), message)
            })
        })
        .collect();

    fields.sort_by_key(|e| {
        FIELD_ORDER
            .iter()
            .position(|name| *name == e.field)
            .unwrap_or(FIELD_ORDER.len())
    });
    fields
}

fn invalid_fields(errors: ValidationErrors) -> ApiError {
    ApiError::invalid_fields(field_errors(&errors))
}

fn wire_name(field: &str) -> String {
    match field {
        "tag_list" => "tagList".to_string(),
        other => other.to_string(),
    }
}

//! Favorite API endpoints
//!
//! - POST /api/articles/{slug}/favorite - Favorite article
//! - DELETE /api/articles/{slug}/favorite - Unfavorite article
//!
//! Both answer with a 303 redirect to the article view.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::api::middleware::ApiError;
use crate::app::AppState;

/// POST /api/articles/{slug}/favorite
pub async fn favorite_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect, ApiError> {
    state.favorite_service.favorite(&slug).await?;
    Ok(redirect_to_article(&slug))
}

/// DELETE /api/articles/{slug}/favorite
pub async fn unfavorite_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect, ApiError> {
    state.favorite_service.unfavorite(&slug).await?;
    Ok(redirect_to_article(&slug))
}

fn redirect_to_article(slug: &str) -> Redirect {
    Redirect::to(&format!("/api/articles/{}", urlencoding::encode(slug)))
}

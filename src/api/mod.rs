//! HTTP API layer
//!
//! Routes:
//! - POST /api/articles
//! - GET /api/articles/{slug}
//! - PUT /api/articles/{slug}
//! - POST /api/articles/{slug}/favorite
//! - DELETE /api/articles/{slug}/favorite

pub mod articles;
pub mod favorites;
pub mod middleware;
pub mod responses;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub use middleware::ApiError;
pub use responses::{ArticleEnvelope, FieldError};

/// Build the API routes
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/articles", post(articles::create_article))
        .route(
            "/articles/{slug}",
            get(articles::get_article).put(articles::update_article),
        )
        .route(
            "/articles/{slug}/favorite",
            post(favorites::favorite_article).delete(favorites::unfavorite_article),
        )
}

/// Build the application router with CORS and request tracing
///
/// `cors_origin` is either `*` or a single origin.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_allow_origin(cors_origin))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", build_api_router())
        .fallback(middleware::not_found_fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_allow_origin(origin: &str) -> AllowOrigin {
    if origin == "*" {
        return AllowOrigin::any();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            AllowOrigin::any()
        }
    }
}

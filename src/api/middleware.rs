//! API error type and fallback handler
//!
//! `ApiError` is the single error body returned by every endpoint:
//! `{"error": {"code", "message", "details"?}}`. The code decides the
//! HTTP status.

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::responses::FieldError;
use crate::services::{ArticleServiceError, FavoriteServiceError};

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Validation failure listing every rejected field
    pub fn invalid_fields(errors: Vec<FieldError>) -> Self {
        let message = format!("{} invalid field(s)", errors.len());
        let details = serde_json::to_value(errors).unwrap_or_default();
        Self::with_details("VALIDATION_ERROR", message, details)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::NotFound(slug) => {
                ApiError::not_found(format!("Article with slug {} does not exist", slug))
            }
            ArticleServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ArticleServiceError::StorageError(e) => {
                tracing::error!("Article storage failure: {:#}", e);
                ApiError::internal_error("Storage failure")
            }
        }
    }
}

impl From<FavoriteServiceError> for ApiError {
    fn from(err: FavoriteServiceError) -> Self {
        match err {
            FavoriteServiceError::NotFound(slug) => {
                ApiError::not_found(format!("Article with slug {} does not exist", slug))
            }
            FavoriteServiceError::StorageError(e) => {
                tracing::error!("Favorite storage failure: {:#}", e);
                ApiError::internal_error("Storage failure")
            }
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found_fallback(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

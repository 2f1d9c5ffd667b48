//! Shared API envelope types
//!
//! Every article payload travels wrapped as `{"article": {...}}`, in both
//! directions.

use serde::{Deserialize, Serialize};

/// `{"article": T}` wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleEnvelope<T> {
    pub article: T,
}

impl<T> ArticleEnvelope<T> {
    pub fn new(article: T) -> Self {
        Self { article }
    }
}

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

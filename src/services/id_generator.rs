//! Article id generation
//!
//! The relational backend uses random UUIDs; the in-memory backend hands out
//! increasing integers, which keeps fixtures readable.

use crate::models::ArticleId;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of fresh article ids
pub trait IdGenerator: Send + Sync {
    /// Produce an id never returned before by this generator
    fn next_id(&self) -> ArticleId;
}

/// UUID v4 generator
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> ArticleId {
        Uuid::new_v4().to_string()
    }
}

/// Monotonic counter starting at 1
#[derive(Debug)]
pub struct IncrementIdGenerator {
    next: AtomicU64,
}

impl IncrementIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for IncrementIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for IncrementIdGenerator {
    fn next_id(&self) -> ArticleId {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

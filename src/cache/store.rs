//! Cache store contract.
//!
//! Stores hold encoded payloads plus the tags they were written with. The
//! only eviction primitive exposed to handlers is tag invalidation; there is
//! no per-key delete.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem {
    pub value: Bytes,
    pub tags: Vec<String>,
}

impl CacheItem {
    pub fn has_any_tag<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> bool {
        tags.into_iter().any(|tag| self.tags.contains(tag))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {message}")]
    Unavailable { message: String },
    #[error("failed to encode cache payload: {message}")]
    Encode { message: String },
    #[error("failed to decode cache payload: {message}")]
    Decode { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn encode(err: impl std::fmt::Display) -> Self {
        Self::Encode {
            message: err.to_string(),
        }
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}

/// Key/value store with tag-based bulk invalidation.
///
/// Implementations may be process-local or backed by a shared service. Calls
/// are individually atomic; nothing is promised across calls.
#[async_trait]
pub trait TagAwareStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheItem>, StoreError>;

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    /// Drop every entry carrying at least one of `tags`. Idempotent.
    async fn invalidate_tags(&self, tags: &[String]) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;

    async fn begin_transaction(&self) {}

    async fn commit_transaction(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn rollback_transaction(&self) {}
}

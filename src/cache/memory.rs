//! In-process tag-aware store.
//!
//! Bounded LRU of encoded entries plus a [`TagIndex`] so tag invalidation
//! can find every entry written under a tag.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tracing::{debug, trace};

use super::lock::{rw_read, rw_write};
use super::store::{CacheItem, StoreError, TagAwareStore};
use super::tag_index::TagIndex;

const SOURCE: &str = "cache::memory";
const METRIC_EVICT_TOTAL: &str = "persistence_cache_evict_total";

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    tags: Vec<String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

struct State {
    entries: LruCache<String, Entry>,
    index: TagIndex,
}

impl State {
    fn remove(&mut self, key: &str) {
        self.entries.pop(key);
        self.index.unregister(key);
    }
}

pub struct InMemoryTagStore {
    state: RwLock<State>,
    layer: &'static str,
}

impl InMemoryTagStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::with_layer(capacity, "shared")
    }

    /// `layer` labels eviction metrics so stacked stores can be told apart.
    pub fn with_layer(capacity: NonZeroUsize, layer: &'static str) -> Self {
        Self {
            state: RwLock::new(State {
                entries: LruCache::new(capacity),
                index: TagIndex::new(),
            }),
            layer,
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.state, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a live entry exists, without touching LRU order.
    pub fn contains_key(&self, key: &str) -> bool {
        let state = rw_read(&self.state, SOURCE, "contains_key");
        state
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    pub fn tags_for_key(&self, key: &str) -> Vec<String> {
        let state = rw_read(&self.state, SOURCE, "tags_for_key");
        let mut tags: Vec<String> = state.index.tags_for_key(key).into_iter().collect();
        tags.sort();
        tags
    }

    pub(crate) fn get_sync(&self, key: &str) -> Option<CacheItem> {
        let mut state = rw_write(&self.state, SOURCE, "get");
        let now = Instant::now();

        match state.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => {
                return Some(CacheItem {
                    value: entry.value.clone(),
                    tags: entry.tags.clone(),
                });
            }
            Some(_) => {}
        }

        trace!(layer = self.layer, key, "cache entry expired");
        state.remove(key);
        None
    }

    pub(crate) fn set_sync(&self, key: &str, value: Bytes, tags: &[String], ttl: Option<Duration>) {
        let mut state = rw_write(&self.state, SOURCE, "set");
        let entry = Entry {
            value,
            tags: tags.to_vec(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };

        state.index.unregister(key);
        let displaced = state.entries.push(key.to_string(), entry);
        if let Some((evicted_key, _)) = displaced.filter(|(displaced_key, _)| displaced_key != key) {
            state.index.unregister(&evicted_key);
            counter!(METRIC_EVICT_TOTAL, "layer" => self.layer).increment(1);
            trace!(layer = self.layer, key = %evicted_key, "cache entry evicted");
        }
        state.index.register(key, tags);
    }

    pub(crate) fn invalidate_sync(&self, tags: &[String]) -> usize {
        let mut state = rw_write(&self.state, SOURCE, "invalidate_tags");
        let affected = state.index.take_keys_for_tags(tags);
        for key in &affected {
            state.entries.pop(key.as_str());
        }
        affected.len()
    }

    pub(crate) fn clear_sync(&self) {
        let mut state = rw_write(&self.state, SOURCE, "clear");
        state.entries.clear();
        state.index.clear();
    }
}

#[async_trait]
impl TagAwareStore for InMemoryTagStore {
    async fn get(&self, key: &str) -> Result<Option<CacheItem>, StoreError> {
        Ok(self.get_sync(key))
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.set_sync(key, value, tags, ttl);
        Ok(())
    }

    async fn invalidate_tags(&self, tags: &[String]) -> Result<(), StoreError> {
        let removed = self.invalidate_sync(tags);
        debug!(
            layer = self.layer,
            tags = ?tags,
            removed,
            "cache tags invalidated"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.clear_sync();
        Ok(())
    }
}

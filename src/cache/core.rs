//! Read-through, multi-get and mutate-then-invalidate protocol shared by every
//! domain cache handler.
//!
//! Each handler method supplies the key, a description of the inner call, the
//! (not yet polled) inner future and a function deriving tags from the result.
//! Store failures never reach the caller: reads fail open as misses, writes and
//! invalidations are logged and counted.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use metrics::{counter, histogram};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, trace, warn};

use super::config::CacheConfig;
use super::identifier::{Arg, CacheIdentifierGenerator, KeyKind, PatternError, TagKind};
use super::logger::CallLogger;
use super::store::{StoreError, TagAwareStore};
use crate::application::handlers::HandlerResult;

pub(crate) const METRIC_HIT_TOTAL: &str = "persistence_cache_hit_total";
pub(crate) const METRIC_MISS_TOTAL: &str = "persistence_cache_miss_total";
pub(crate) const METRIC_STORE_ERROR_TOTAL: &str = "persistence_cache_store_error_total";
pub(crate) const METRIC_INVALIDATED_TAGS_TOTAL: &str = "persistence_cache_invalidated_tags_total";
pub(crate) const METRIC_INNER_CALL_MS: &str = "persistence_cache_inner_call_ms";

/// Description of one inner round trip, handed to the [`CallLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct InnerCall {
    pub operation: &'static str,
    pub arguments: Value,
}

impl InnerCall {
    pub fn new(operation: &'static str, arguments: Value) -> Self {
        Self {
            operation,
            arguments,
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    invalidations: AtomicU64,
    store_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub invalidations: u64,
    pub store_errors: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

pub struct CacheCore {
    store: Arc<dyn TagAwareStore>,
    ids: CacheIdentifierGenerator,
    logger: Arc<dyn CallLogger>,
    ttl: Option<Duration>,
    stats: CacheStats,
    flights: Option<DashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CacheCore {
    pub fn new(
        store: Arc<dyn TagAwareStore>,
        ids: CacheIdentifierGenerator,
        logger: Arc<dyn CallLogger>,
    ) -> Self {
        Self {
            store,
            ids,
            logger,
            ttl: None,
            stats: CacheStats::default(),
            flights: None,
        }
    }

    pub fn from_config(
        store: Arc<dyn TagAwareStore>,
        config: &CacheConfig,
        logger: Arc<dyn CallLogger>,
    ) -> Result<Self, PatternError> {
        Ok(Self::new(store, config.identifier_generator()?, logger)
            .with_ttl(config.default_ttl())
            .with_single_flight(config.single_flight))
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.flights = enabled.then(DashMap::new);
        self
    }

    pub fn store(&self) -> &Arc<dyn TagAwareStore> {
        &self.store
    }

    pub fn identifiers(&self) -> &CacheIdentifierGenerator {
        &self.ids
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn key(&self, kind: KeyKind, args: &[Arg<'_>]) -> String {
        self.ids.generate_key(kind, args)
    }

    pub fn tag(&self, kind: TagKind, args: &[Arg<'_>]) -> String {
        self.ids.generate_tag(kind, args)
    }

    /// Read through the cache: serve a hit, or call `load` and store its result
    /// under `key` with the tags `tags` derives from it.
    pub async fn get_cached<T, Fut, TagFn>(
        &self,
        key: String,
        call: InnerCall,
        load: Fut,
        tags: TagFn,
    ) -> HandlerResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        Fut: Future<Output = HandlerResult<T>> + Send,
        TagFn: FnOnce(&T) -> Vec<String> + Send,
    {
        if let Some(value) = self.fetch::<T>(&key, call.operation).await {
            return Ok(value);
        }

        let flight = self.enter_flight(&key).await;
        if flight.is_some()
            && let Some(value) = self.fetch::<T>(&key, call.operation).await
        {
            drop(flight);
            self.leave_flight(&key);
            return Ok(value);
        }

        self.record_miss(call.operation, 1);
        let result = self.call_inner(call, load).await;
        if let Ok(value) = &result {
            self.write(&key, value, tags(value)).await;
        }

        drop(flight);
        self.leave_flight(&key);
        result
    }

    /// Multi-get: hits come from the store, every miss is fetched in one
    /// batched inner call. Ids the inner call does not return are absent from
    /// the result.
    pub async fn get_cached_list<K, T, KeyFn, CallFn, LoadFn, Fut, TagFn>(
        &self,
        ids: &[K],
        key_for: KeyFn,
        describe: CallFn,
        load: LoadFn,
        tags: TagFn,
    ) -> HandlerResult<HashMap<K, T>>
    where
        K: Eq + Hash + Clone + Send + Sync,
        T: Serialize + DeserializeOwned + Send,
        KeyFn: Fn(&K) -> String + Send + Sync,
        CallFn: FnOnce(&[K]) -> InnerCall + Send,
        LoadFn: FnOnce(Vec<K>) -> Fut + Send,
        Fut: Future<Output = HandlerResult<HashMap<K, T>>> + Send,
        TagFn: Fn(&T) -> Vec<String> + Send + Sync,
    {
        let mut found = HashMap::with_capacity(ids.len());
        let mut misses = Vec::new();
        let mut seen = HashSet::with_capacity(ids.len());

        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            let key = key_for(id);
            match self.fetch::<T>(&key, "multi_get").await {
                Some(value) => {
                    found.insert(id.clone(), value);
                }
                None => misses.push(id.clone()),
            }
        }

        if misses.is_empty() {
            return Ok(found);
        }

        let call = describe(&misses);
        self.record_miss(call.operation, misses.len() as u64);
        let fresh = self.call_inner(call, load(misses)).await?;

        for (id, value) in fresh {
            self.write(&key_for(&id), &value, tags(&value)).await;
            found.insert(id, value);
        }
        Ok(found)
    }

    /// Logged inner call that neither reads nor invalidates the cache.
    pub async fn passthrough<T, Fut>(&self, call: InnerCall, fut: Fut) -> HandlerResult<T>
    where
        Fut: Future<Output = HandlerResult<T>> + Send,
    {
        self.call_inner(call, fut).await
    }

    /// Run a mutation, then invalidate the tags `tags` derives from its result
    /// in a single store call. Failed mutations invalidate nothing.
    pub async fn mutate<T, Fut, TagFn>(
        &self,
        call: InnerCall,
        fut: Fut,
        tags: TagFn,
    ) -> HandlerResult<T>
    where
        Fut: Future<Output = HandlerResult<T>> + Send,
        TagFn: FnOnce(&T) -> Vec<String> + Send,
    {
        let value = self.call_inner(call, fut).await?;
        self.invalidate(tags(&value)).await;
        Ok(value)
    }

    /// Deduplicate and invalidate; an empty set makes no store call.
    pub async fn invalidate<I>(&self, tags: I)
    where
        I: IntoIterator<Item = String>,
    {
        let unique: BTreeSet<String> = tags.into_iter().collect();
        if unique.is_empty() {
            return;
        }
        let tags: Vec<String> = unique.into_iter().collect();

        match self.store.invalidate_tags(&tags).await {
            Ok(()) => {
                CacheStats::bump(&self.stats.invalidations, 1);
                counter!(METRIC_INVALIDATED_TAGS_TOTAL).increment(tags.len() as u64);
                debug!(tags = ?tags, "cache tags invalidated");
            }
            Err(err) => {
                self.record_store_error("invalidate_tags");
                warn!(tags = ?tags, error = %err, "cache invalidation failed");
            }
        }
    }

    async fn call_inner<T, Fut>(&self, call: InnerCall, fut: Fut) -> HandlerResult<T>
    where
        Fut: Future<Output = HandlerResult<T>> + Send,
    {
        self.logger.log_call(call.operation, &call.arguments);
        let started_at = Instant::now();
        let result = fut.await;
        histogram!(METRIC_INNER_CALL_MS, "operation" => call.operation)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);
        if let Err(err) = &result {
            debug!(operation = call.operation, error = %err, "inner call failed");
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str, operation: &'static str) -> Option<T> {
        let item = match self.store.get(key).await {
            Ok(Some(item)) => item,
            Ok(None) => return None,
            Err(err) => {
                self.record_store_error("get");
                warn!(key, error = %err, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&item.value) {
            Ok(value) => {
                CacheStats::bump(&self.stats.hits, 1);
                counter!(METRIC_HIT_TOTAL, "operation" => operation).increment(1);
                trace!(key, "cache hit");
                Some(value)
            }
            Err(err) => {
                let err = StoreError::decode(err);
                self.record_store_error("decode");
                debug!(key, error = %err, "undecodable cache payload, treating as miss");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, tags: Vec<String>) {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                let err = StoreError::encode(err);
                self.record_store_error("encode");
                warn!(key, error = %err, "cache write skipped");
                return;
            }
        };

        let tags: Vec<String> = tags
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match self.store.set(key, payload, &tags, self.ttl).await {
            Ok(()) => {
                CacheStats::bump(&self.stats.stores, 1);
                trace!(key, tags = ?tags, "cache entry stored");
            }
            Err(err) => {
                self.record_store_error("set");
                warn!(key, error = %err, "cache write failed");
            }
        }
    }

    fn record_miss(&self, operation: &'static str, count: u64) {
        CacheStats::bump(&self.stats.misses, count);
        counter!(METRIC_MISS_TOTAL, "operation" => operation).increment(count);
    }

    fn record_store_error(&self, op: &'static str) {
        CacheStats::bump(&self.stats.store_errors, 1);
        counter!(METRIC_STORE_ERROR_TOTAL, "op" => op).increment(1);
    }

    async fn enter_flight(&self, key: &str) -> Option<OwnedMutexGuard<()>> {
        let flights = self.flights.as_ref()?;
        let lock = flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        Some(lock.lock_owned().await)
    }

    fn leave_flight(&self, key: &str) {
        if let Some(flights) = &self.flights {
            flights.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

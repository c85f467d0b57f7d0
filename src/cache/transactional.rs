//! Transaction-aware store decorator.
//!
//! Wraps the shared store with a short-lived request-local layer and defers
//! shared-store invalidation while a storage transaction is open.
//!
//! Transaction state belongs to an owner: the enclosing
//! [`TransactionOwner::scope`] if there is one, otherwise the current tokio
//! task. Code running outside both shares one detached owner. While an owner
//! has a transaction open, its writes stay in a private layer and its
//! invalidations wait for the outermost commit. Other owners keep reading
//! committed entries and invalidate the shared store directly.

use std::collections::BTreeSet;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metrics::counter;
use tracing::{debug, trace};

use super::config::CacheConfig;
use super::memory::InMemoryTagStore;
use super::store::{CacheItem, StoreError, TagAwareStore};

const METRIC_DEFERRED_TAGS_TOTAL: &str = "persistence_cache_deferred_tags_total";

tokio::task_local! {
    static OWNER: TransactionOwner;
}

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identity that cache transaction state is tracked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionOwner(u64);

impl TransactionOwner {
    pub fn new() -> Self {
        Self(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `future` with cache transaction state attributed to this owner.
    ///
    /// An owner may enter several scopes in turn; they all see the same
    /// transaction.
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        OWNER.scope(self, future).await
    }
}

impl Default for TransactionOwner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum OwnerKey {
    Scoped(TransactionOwner),
    Task(tokio::task::Id),
    Detached,
}

impl OwnerKey {
    fn current() -> Self {
        if let Ok(owner) = OWNER.try_with(|owner| *owner) {
            return Self::Scoped(owner);
        }
        tokio::task::try_id().map_or(Self::Detached, Self::Task)
    }
}

struct TransactionState {
    depth: usize,
    deferred: BTreeSet<String>,
    writes: InMemoryTagStore,
}

impl TransactionState {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            depth: 0,
            deferred: BTreeSet::new(),
            writes: InMemoryTagStore::with_layer(capacity, "transaction"),
        }
    }
}

pub struct TransactionalStore {
    shared: Arc<dyn TagAwareStore>,
    local: Option<InMemoryTagStore>,
    local_ttl: Duration,
    transaction_limit: NonZeroUsize,
    /// Only owners with an open transaction have an entry.
    transactions: DashMap<OwnerKey, TransactionState>,
}

impl TransactionalStore {
    pub fn new(shared: Arc<dyn TagAwareStore>, config: &CacheConfig) -> Self {
        let local = config
            .enable_in_memory
            .then(|| InMemoryTagStore::with_layer(config.in_memory_limit_non_zero(), "local"));

        Self {
            shared,
            local,
            local_ttl: config.in_memory_ttl(),
            transaction_limit: config.in_memory_limit_non_zero(),
            transactions: DashMap::new(),
        }
    }

    /// Nesting depth of the calling owner's transaction.
    pub fn transaction_depth(&self) -> usize {
        self.transactions
            .get(&OwnerKey::current())
            .map_or(0, |state| state.depth)
    }

    /// Tags the calling owner will invalidate on commit.
    pub fn deferred_tags(&self) -> Vec<String> {
        self.transactions
            .get(&OwnerKey::current())
            .map(|state| state.deferred.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Owners that currently hold an open transaction.
    pub fn open_transactions(&self) -> usize {
        self.transactions.len()
    }

    /// Whether `owner` has a pending invalidation covering `item`.
    fn blocked(&self, owner: &OwnerKey, item: &CacheItem) -> bool {
        self.transactions
            .get(owner)
            .is_some_and(|state| item.has_any_tag(&state.deferred))
    }

    fn local_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.map_or(self.local_ttl, |ttl| ttl.min(self.local_ttl))
    }
}

#[async_trait]
impl TagAwareStore for TransactionalStore {
    async fn get(&self, key: &str) -> Result<Option<CacheItem>, StoreError> {
        let owner = OwnerKey::current();

        if let Some(state) = self.transactions.get(&owner)
            && let Some(item) = state.writes.get_sync(key)
        {
            trace!(key, layer = "transaction", "cache layer hit");
            return Ok(Some(item));
        }

        if let Some(item) = self.local.as_ref().and_then(|local| local.get_sync(key))
            && !self.blocked(&owner, &item)
        {
            trace!(key, layer = "local", "cache layer hit");
            return Ok(Some(item));
        }

        let Some(item) = self.shared.get(key).await? else {
            return Ok(None);
        };

        if self.blocked(&owner, &item) {
            trace!(key, "shared entry pending invalidation, treated as miss");
            return Ok(None);
        }

        if let Some(local) = &self.local {
            local.set_sync(key, item.value.clone(), &item.tags, Some(self.local_ttl));
        }
        Ok(Some(item))
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        if let Some(state) = self.transactions.get(&OwnerKey::current()) {
            state.writes.set_sync(key, value, tags, ttl);
            trace!(key, "write kept in transaction layer");
            return Ok(());
        }

        if let Some(local) = &self.local {
            local.set_sync(key, value.clone(), tags, Some(self.local_ttl(ttl)));
        }
        self.shared.set(key, value, tags, ttl).await
    }

    async fn invalidate_tags(&self, tags: &[String]) -> Result<(), StoreError> {
        if let Some(local) = &self.local {
            local.invalidate_sync(tags);
        }

        if let Some(mut state) = self.transactions.get_mut(&OwnerKey::current()) {
            state.writes.invalidate_sync(tags);
            state.deferred.extend(tags.iter().cloned());
            counter!(METRIC_DEFERRED_TAGS_TOTAL).increment(tags.len() as u64);
            debug!(tags = ?tags, depth = state.depth, "cache invalidation deferred until commit");
            return Ok(());
        }

        self.shared.invalidate_tags(tags).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if let Some(local) = &self.local {
            local.clear_sync();
        }
        if let Some(state) = self.transactions.get(&OwnerKey::current()) {
            state.writes.clear_sync();
        }
        self.shared.clear().await
    }

    async fn begin_transaction(&self) {
        let owner = OwnerKey::current();
        let mut state = self
            .transactions
            .entry(owner)
            .or_insert_with(|| TransactionState::new(self.transaction_limit));
        state.depth += 1;
        trace!(owner = ?owner, depth = state.depth, "cache transaction begun");
    }

    async fn commit_transaction(&self) -> Result<(), StoreError> {
        let owner = OwnerKey::current();
        let pending: Vec<String> = match self.transactions.entry(owner) {
            Entry::Vacant(_) => return Ok(()),
            Entry::Occupied(mut entry) => {
                let state = entry.get_mut();
                state.depth = state.depth.saturating_sub(1);
                if state.depth > 0 {
                    return Ok(());
                }
                entry.remove().deferred.into_iter().collect()
            }
        };

        if pending.is_empty() {
            return Ok(());
        }
        debug!(owner = ?owner, tags = ?pending, "flushing deferred cache invalidation");
        self.shared.invalidate_tags(&pending).await
    }

    async fn rollback_transaction(&self) {
        let owner = OwnerKey::current();
        let discarded = self
            .transactions
            .remove(&owner)
            .map_or(0, |(_, state)| state.deferred.len());
        debug!(owner = ?owner, discarded, "cache transaction rolled back");
    }
}

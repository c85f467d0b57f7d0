//! Persistence cache layer.
//!
//! Decorates storage handlers with read-through caching and tag-based
//! invalidation:
//!
//! - **Reads** consult the [`TagAwareStore`] first and fall back to the inner
//!   handler, storing the result with the tags that describe it.
//! - **Writes** always reach the inner handler and, on success, invalidate
//!   every tag the change can affect.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via the `[cache]` settings section:
//!
//! ```toml
//! [cache]
//! enabled = true
//! key_prefix = "ibx-"
//! in_memory = true
//! in_memory_ttl_ms = 3000
//! # ... see crate::config for all options
//! ```

mod config;
mod core;
mod handlers;
pub mod identifier;
mod lock;
mod logger;
mod memory;
mod persistence;
mod store;
mod tag_index;
mod transactional;

pub use config::CacheConfig;
pub use self::core::{CacheCore, CacheStats, CacheStatsSnapshot, InnerCall};
pub use handlers::{
    ContentCacheHandler, ContentTypeCacheHandler, LanguageCacheHandler, LocationCacheHandler,
    ObjectStateCacheHandler, SectionCacheHandler, TransactionCacheHandler, TrashCacheHandler,
    UrlAliasCacheHandler, UrlWildcardCacheHandler, UserCacheHandler,
};
pub use identifier::{Arg, CacheIdentifierGenerator, KeyKind, PatternError, TagKind};
pub use logger::{CallLogger, LoggedCall, MemoryCallLogger, TracingCallLogger};
pub use memory::InMemoryTagStore;
pub use persistence::CachedPersistence;
pub use store::{CacheItem, StoreError, TagAwareStore};
pub use transactional::{TransactionOwner, TransactionalStore};

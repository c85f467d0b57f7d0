//! Caching persistence facade.
//!
//! Hands out one cache decorator per domain, created on first use and reused
//! afterwards. All decorators share a single [`CacheCore`].

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use super::config::CacheConfig;
use super::core::CacheCore;
use super::handlers::{
    ContentCacheHandler, ContentTypeCacheHandler, LanguageCacheHandler, LocationCacheHandler,
    ObjectStateCacheHandler, SectionCacheHandler, TransactionCacheHandler, TrashCacheHandler,
    UrlAliasCacheHandler, UrlWildcardCacheHandler, UserCacheHandler,
};
use super::identifier::PatternError;
use super::logger::{CallLogger, TracingCallLogger};
use super::memory::InMemoryTagStore;
use super::store::TagAwareStore;
use super::transactional::TransactionalStore;
use crate::application::handlers::{
    ContentHandler, ContentTypeHandler, LanguageHandler, LocationHandler, ObjectStateHandler,
    SectionHandler, TransactionHandler, TrashHandler, UrlAliasHandler, UrlWildcardHandler,
    UserHandler,
};
use crate::application::persistence::PersistenceHandler;

pub struct CachedPersistence {
    inner: Arc<dyn PersistenceHandler>,
    core: Arc<CacheCore>,
    content: OnceCell<Arc<dyn ContentHandler>>,
    content_type: OnceCell<Arc<dyn ContentTypeHandler>>,
    location: OnceCell<Arc<dyn LocationHandler>>,
    user: OnceCell<Arc<dyn UserHandler>>,
    section: OnceCell<Arc<dyn SectionHandler>>,
    object_state: OnceCell<Arc<dyn ObjectStateHandler>>,
    trash: OnceCell<Arc<dyn TrashHandler>>,
    url_alias: OnceCell<Arc<dyn UrlAliasHandler>>,
    url_wildcard: OnceCell<Arc<dyn UrlWildcardHandler>>,
    language: OnceCell<Arc<dyn LanguageHandler>>,
    transaction: OnceCell<Arc<dyn TransactionHandler>>,
}

impl CachedPersistence {
    pub fn new(inner: Arc<dyn PersistenceHandler>, core: Arc<CacheCore>) -> Self {
        Self {
            inner,
            core,
            content: OnceCell::new(),
            content_type: OnceCell::new(),
            location: OnceCell::new(),
            user: OnceCell::new(),
            section: OnceCell::new(),
            object_state: OnceCell::new(),
            trash: OnceCell::new(),
            url_alias: OnceCell::new(),
            url_wildcard: OnceCell::new(),
            language: OnceCell::new(),
            transaction: OnceCell::new(),
        }
    }

    /// Wrap `inner` according to `config`.
    ///
    /// A disabled cache returns `inner` itself. Otherwise `shared` is fronted
    /// by a [`TransactionalStore`] so invalidation inside storage transactions
    /// is deferred until commit. Transaction state is tracked per caller, see
    /// [`TransactionOwner`](super::transactional::TransactionOwner).
    pub fn decorate(
        inner: Arc<dyn PersistenceHandler>,
        config: &CacheConfig,
        shared: Arc<dyn TagAwareStore>,
        logger: Arc<dyn CallLogger>,
    ) -> Result<Arc<dyn PersistenceHandler>, PatternError> {
        if !config.is_enabled() {
            info!("persistence cache disabled, using inner handlers directly");
            return Ok(inner);
        }

        let store: Arc<dyn TagAwareStore> = Arc::new(TransactionalStore::new(shared, config));
        let core = CacheCore::from_config(store, config, logger)?;
        info!(
            key_prefix = core.identifiers().prefix(),
            in_memory = config.enable_in_memory,
            single_flight = config.single_flight,
            "persistence cache enabled"
        );
        Ok(Arc::new(Self::new(inner, Arc::new(core))))
    }

    /// [`decorate`](Self::decorate) with a process-local shared store and
    /// tracing call logger.
    pub fn in_process(
        inner: Arc<dyn PersistenceHandler>,
        config: &CacheConfig,
    ) -> Result<Arc<dyn PersistenceHandler>, PatternError> {
        let shared = Arc::new(InMemoryTagStore::new(config.shared_limit_non_zero()));
        Self::decorate(inner, config, shared, Arc::new(TracingCallLogger))
    }

    pub fn core(&self) -> &Arc<CacheCore> {
        &self.core
    }
}

impl PersistenceHandler for CachedPersistence {
    fn content_handler(&self) -> Arc<dyn ContentHandler> {
        self.content
            .get_or_init(|| {
                Arc::new(ContentCacheHandler::new(
                    self.inner.content_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn content_type_handler(&self) -> Arc<dyn ContentTypeHandler> {
        self.content_type
            .get_or_init(|| {
                Arc::new(ContentTypeCacheHandler::new(
                    self.inner.content_type_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn location_handler(&self) -> Arc<dyn LocationHandler> {
        self.location
            .get_or_init(|| {
                Arc::new(LocationCacheHandler::new(
                    self.inner.location_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn user_handler(&self) -> Arc<dyn UserHandler> {
        self.user
            .get_or_init(|| {
                Arc::new(UserCacheHandler::new(
                    self.inner.user_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn section_handler(&self) -> Arc<dyn SectionHandler> {
        self.section
            .get_or_init(|| {
                Arc::new(SectionCacheHandler::new(
                    self.inner.section_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn object_state_handler(&self) -> Arc<dyn ObjectStateHandler> {
        self.object_state
            .get_or_init(|| {
                Arc::new(ObjectStateCacheHandler::new(
                    self.inner.object_state_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn trash_handler(&self) -> Arc<dyn TrashHandler> {
        self.trash
            .get_or_init(|| {
                Arc::new(TrashCacheHandler::new(
                    self.inner.clone(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn url_alias_handler(&self) -> Arc<dyn UrlAliasHandler> {
        self.url_alias
            .get_or_init(|| {
                Arc::new(UrlAliasCacheHandler::new(
                    self.inner.clone(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn url_wildcard_handler(&self) -> Arc<dyn UrlWildcardHandler> {
        self.url_wildcard
            .get_or_init(|| {
                Arc::new(UrlWildcardCacheHandler::new(
                    self.inner.url_wildcard_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn language_handler(&self) -> Arc<dyn LanguageHandler> {
        self.language
            .get_or_init(|| {
                Arc::new(LanguageCacheHandler::new(
                    self.inner.language_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }

    fn transaction_handler(&self) -> Arc<dyn TransactionHandler> {
        self.transaction
            .get_or_init(|| {
                Arc::new(TransactionCacheHandler::new(
                    self.inner.transaction_handler(),
                    self.core.clone(),
                ))
            })
            .clone()
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{HandlerResult, UrlWildcardHandler};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::url_wildcard::UrlWildcard;

pub struct UrlWildcardCacheHandler {
    inner: Arc<dyn UrlWildcardHandler>,
    core: Arc<CacheCore>,
}

impl UrlWildcardCacheHandler {
    pub fn new(inner: Arc<dyn UrlWildcardHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn wildcard_tag(&self, id: Id) -> String {
        self.core.tag(TagKind::UrlWildcard, &[id.into()])
    }

    fn translation_tag(&self) -> String {
        self.core.tag(TagKind::UrlWildcardTranslation, &[])
    }
}

#[async_trait]
impl UrlWildcardHandler for UrlWildcardCacheHandler {
    async fn create(
        &self,
        source_url: &str,
        destination_url: &str,
        forward: bool,
    ) -> HandlerResult<UrlWildcard> {
        self.core
            .mutate(
                InnerCall::new(
                    "url_wildcard::create",
                    json!({ "source": source_url, "destination": destination_url, "forward": forward }),
                ),
                self.inner.create(source_url, destination_url, forward),
                |_| vec![self.translation_tag()],
            )
            .await
    }

    async fn update(
        &self,
        id: Id,
        source_url: &str,
        destination_url: &str,
        forward: bool,
    ) -> HandlerResult<UrlWildcard> {
        self.core
            .mutate(
                InnerCall::new(
                    "url_wildcard::update",
                    json!({
                        "wildcard": id,
                        "source": source_url,
                        "destination": destination_url,
                        "forward": forward,
                    }),
                ),
                self.inner.update(id, source_url, destination_url, forward),
                |_| vec![self.wildcard_tag(id), self.translation_tag()],
            )
            .await
    }

    async fn remove(&self, id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("url_wildcard::remove", json!({ "wildcard": id })),
                self.inner.remove(id),
                |_| vec![self.wildcard_tag(id), self.translation_tag()],
            )
            .await
    }

    async fn load(&self, id: Id) -> HandlerResult<UrlWildcard> {
        self.core
            .get_cached(
                self.core.key(KeyKind::UrlWildcard, &[id.into()]),
                InnerCall::new("url_wildcard::load", json!({ "wildcard": id })),
                self.inner.load(id),
                |wildcard| vec![self.wildcard_tag(wildcard.id)],
            )
            .await
    }

    async fn load_all(
        &self,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<UrlWildcard>> {
        self.core
            .passthrough(
                InnerCall::new(
                    "url_wildcard::load_all",
                    json!({ "offset": offset, "limit": limit }),
                ),
                self.inner.load_all(offset, limit),
            )
            .await
    }

    async fn translate(&self, source_url: &str) -> HandlerResult<UrlWildcard> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::UrlWildcardSource, &[Arg::hashed(source_url)]),
                InnerCall::new("url_wildcard::translate", json!({ "source": source_url })),
                self.inner.translate(source_url),
                |wildcard| vec![self.translation_tag(), self.wildcard_tag(wildcard.id)],
            )
            .await
    }

    async fn exact_source_url_exists(&self, source_url: &str) -> HandlerResult<bool> {
        self.core
            .passthrough(
                InnerCall::new(
                    "url_wildcard::exact_source_url_exists",
                    json!({ "source": source_url }),
                ),
                self.inner.exact_source_url_exists(source_url),
            )
            .await
    }

    async fn count_all(&self) -> HandlerResult<u64> {
        self.core
            .passthrough(
                InnerCall::new("url_wildcard::count_all", json!({})),
                self.inner.count_all(),
            )
            .await
    }
}

//! Trash reads pass through. Every trash mutation first asks the inner
//! persistence which content is affected, and which content points at it,
//! since neither can be derived from the arguments alone.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{ContentHandler, HandlerResult, LocationHandler, TrashHandler};
use crate::application::persistence::PersistenceHandler;
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::TagKind;
use crate::domain::Id;
use crate::domain::trash::{TrashItemDeleteResult, TrashItemDeleteResultList, TrashResult, Trashed};

pub struct TrashCacheHandler {
    persistence: Arc<dyn PersistenceHandler>,
    inner: Arc<dyn TrashHandler>,
    core: Arc<CacheCore>,
}

impl TrashCacheHandler {
    pub fn new(persistence: Arc<dyn PersistenceHandler>, core: Arc<CacheCore>) -> Self {
        let inner = persistence.trash_handler();
        Self {
            persistence,
            inner,
            core,
        }
    }

    fn content_tag(&self, content_id: Id) -> String {
        self.core.tag(TagKind::Content, &[content_id.into()])
    }

    fn path_tag(&self, location_id: Id) -> String {
        self.core.tag(TagKind::LocationPath, &[location_id.into()])
    }

    /// `c-<content>` plus `c-<source>` for every content relating to it.
    async fn content_and_sources_tags(&self, content_id: Id) -> HandlerResult<Vec<String>> {
        let content = self.persistence.content_handler();
        let relations = self
            .core
            .passthrough(
                InnerCall::new(
                    "content::load_reverse_relations",
                    json!({ "content": content_id, "type": null }),
                ),
                content.load_reverse_relations(content_id, None),
            )
            .await?;

        let mut tags = vec![self.content_tag(content_id)];
        tags.extend(
            relations
                .iter()
                .map(|relation| self.content_tag(relation.source_content_id)),
        );
        Ok(tags)
    }

    async fn trashed_item_tags(&self, trashed_id: Id) -> HandlerResult<Vec<String>> {
        let trashed = self.load_trash_item(trashed_id).await?;
        let mut tags = self.content_and_sources_tags(trashed.content_id()).await?;
        tags.push(self.path_tag(trashed.id()));
        Ok(tags)
    }
}

#[async_trait]
impl TrashHandler for TrashCacheHandler {
    async fn load_trash_item(&self, trash_item_id: Id) -> HandlerResult<Trashed> {
        self.core
            .passthrough(
                InnerCall::new("trash::load_trash_item", json!({ "trash_item": trash_item_id })),
                self.inner.load_trash_item(trash_item_id),
            )
            .await
    }

    async fn trash_subtree(&self, location_id: Id) -> HandlerResult<Option<Trashed>> {
        let location_handler = self.persistence.location_handler();
        let location = self
            .core
            .passthrough(
                InnerCall::new(
                    "location::load",
                    json!({ "location": location_id, "translations": null, "use_always_available": true }),
                ),
                location_handler.load(location_id, None, true),
            )
            .await?;

        let mut tags = self.content_and_sources_tags(location.content_id).await?;
        tags.push(self.path_tag(location_id));

        self.core
            .mutate(
                InnerCall::new("trash::trash_subtree", json!({ "location": location_id })),
                self.inner.trash_subtree(location_id),
                |_| tags,
            )
            .await
    }

    async fn recover(&self, trashed_id: Id, new_parent_id: Option<Id>) -> HandlerResult<Id> {
        let tags = self.trashed_item_tags(trashed_id).await?;

        self.core
            .mutate(
                InnerCall::new(
                    "trash::recover",
                    json!({ "trashed": trashed_id, "new_parent": new_parent_id }),
                ),
                self.inner.recover(trashed_id, new_parent_id),
                |_| tags,
            )
            .await
    }

    async fn find_trash_items(
        &self,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<TrashResult> {
        self.core
            .passthrough(
                InnerCall::new(
                    "trash::find_trash_items",
                    json!({ "offset": offset, "limit": limit }),
                ),
                self.inner.find_trash_items(offset, limit),
            )
            .await
    }

    async fn empty_trash(&self) -> HandlerResult<TrashItemDeleteResultList> {
        let trashed = self.find_trash_items(0, None).await?;

        let mut tags = Vec::new();
        for item in &trashed.items {
            tags.extend(self.content_and_sources_tags(item.content_id()).await?);
            tags.push(self.path_tag(item.id()));
        }

        self.core
            .mutate(
                InnerCall::new("trash::empty_trash", json!({})),
                self.inner.empty_trash(),
                |_| tags,
            )
            .await
    }

    async fn delete_trash_item(&self, trashed_id: Id) -> HandlerResult<TrashItemDeleteResult> {
        let tags = self.trashed_item_tags(trashed_id).await?;

        self.core
            .mutate(
                InnerCall::new("trash::delete_trash_item", json!({ "trashed": trashed_id })),
                self.inner.delete_trash_item(trashed_id),
                |_| tags,
            )
            .await
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{HandlerResult, LocationHandler};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::location::{Location, LocationCreateStruct, LocationUpdateStruct};

pub struct LocationCacheHandler {
    inner: Arc<dyn LocationHandler>,
    core: Arc<CacheCore>,
}

impl LocationCacheHandler {
    pub fn new(inner: Arc<dyn LocationHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn path_tag(&self, location_id: Id) -> String {
        self.core.tag(TagKind::LocationPath, &[location_id.into()])
    }

    fn content_tag(&self, content_id: Id) -> String {
        self.core.tag(TagKind::Content, &[content_id.into()])
    }

    /// `l-<id>`, one `lp-<ancestor>` per path element (self included) and the
    /// owning content.
    fn location_tags(&self, location: &Location) -> Vec<String> {
        let mut tags = vec![self.core.tag(TagKind::Location, &[location.id.into()])];
        tags.extend(location.path().into_iter().map(|id| self.path_tag(id)));
        tags.push(self.content_tag(location.content_id));
        tags
    }

    fn locations_tags(&self, content_id: Id, locations: &[Location]) -> Vec<String> {
        let mut tags = vec![self.content_tag(content_id)];
        for location in locations {
            tags.extend(self.location_tags(location));
        }
        tags
    }

    fn location_key(
        &self,
        location_id: Id,
        translations: Option<&[String]>,
        use_always_available: bool,
    ) -> String {
        self.core.key(
            KeyKind::Location,
            &[
                location_id.into(),
                Arg::list(translations),
                Arg::flag(use_always_available),
            ],
        )
    }

    async fn invalidate_path(
        &self,
        operation: &'static str,
        location_id: Id,
        fut: impl std::future::Future<Output = HandlerResult<()>> + Send,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(operation, json!({ "location": location_id })),
                fut,
                |_| vec![self.path_tag(location_id)],
            )
            .await
    }
}

#[async_trait]
impl LocationHandler for LocationCacheHandler {
    async fn load(
        &self,
        location_id: Id,
        translations: Option<&[String]>,
        use_always_available: bool,
    ) -> HandlerResult<Location> {
        self.core
            .get_cached(
                self.location_key(location_id, translations, use_always_available),
                InnerCall::new(
                    "location::load",
                    json!({
                        "location": location_id,
                        "translations": translations,
                        "use_always_available": use_always_available,
                    }),
                ),
                self.inner
                    .load(location_id, translations, use_always_available),
                |location| self.location_tags(location),
            )
            .await
    }

    async fn load_list(
        &self,
        location_ids: &[Id],
        translations: Option<&[String]>,
        use_always_available: bool,
    ) -> HandlerResult<HashMap<Id, Location>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                location_ids,
                |id| self.location_key(*id, translations, use_always_available),
                |misses| {
                    InnerCall::new(
                        "location::load_list",
                        json!({
                            "locations": misses,
                            "translations": translations,
                            "use_always_available": use_always_available,
                        }),
                    )
                },
                |misses: Vec<Id>| async move {
                    inner
                        .load_list(&misses, translations, use_always_available)
                        .await
                },
                |location| self.location_tags(location),
            )
            .await
    }

    async fn load_sub_tree_ids(&self, location_id: Id) -> HandlerResult<Vec<Id>> {
        self.core
            .get_cached(
                self.core.key(KeyKind::LocationSubtree, &[location_id.into()]),
                InnerCall::new("location::load_sub_tree_ids", json!({ "location": location_id })),
                self.inner.load_sub_tree_ids(location_id),
                |_| vec![self.path_tag(location_id)],
            )
            .await
    }

    async fn load_locations_by_content(
        &self,
        content_id: Id,
        root_location_id: Option<Id>,
    ) -> HandlerResult<Vec<Location>> {
        self.core
            .get_cached(
                self.core.key(
                    KeyKind::ContentLocations,
                    &[content_id.into(), root_location_id.into()],
                ),
                InnerCall::new(
                    "location::load_locations_by_content",
                    json!({ "content": content_id, "root_location": root_location_id }),
                ),
                self.inner
                    .load_locations_by_content(content_id, root_location_id),
                |locations| self.locations_tags(content_id, locations),
            )
            .await
    }

    async fn load_parent_locations_for_draft_content(
        &self,
        content_id: Id,
    ) -> HandlerResult<Vec<Location>> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentLocationsForDraft, &[content_id.into()]),
                InnerCall::new(
                    "location::load_parent_locations_for_draft_content",
                    json!({ "content": content_id }),
                ),
                self.inner
                    .load_parent_locations_for_draft_content(content_id),
                |locations| self.locations_tags(content_id, locations),
            )
            .await
    }

    async fn load_by_remote_id(
        &self,
        remote_id: &str,
        translations: Option<&[String]>,
        use_always_available: bool,
    ) -> HandlerResult<Location> {
        let key = self.core.key(
            KeyKind::LocationByRemoteId,
            &[
                Arg::text(remote_id),
                Arg::list(translations),
                Arg::flag(use_always_available),
            ],
        );
        self.core
            .get_cached(
                key,
                InnerCall::new(
                    "location::load_by_remote_id",
                    json!({
                        "remote_id": remote_id,
                        "translations": translations,
                        "use_always_available": use_always_available,
                    }),
                ),
                self.inner
                    .load_by_remote_id(remote_id, translations, use_always_available),
                |location| self.location_tags(location),
            )
            .await
    }

    async fn copy_subtree(
        &self,
        source_id: Id,
        destination_parent_id: Id,
        new_owner_id: Option<Id>,
    ) -> HandlerResult<Location> {
        self.core
            .passthrough(
                InnerCall::new(
                    "location::copy_subtree",
                    json!({
                        "source": source_id,
                        "destination_parent": destination_parent_id,
                        "new_owner": new_owner_id,
                    }),
                ),
                self.inner
                    .copy_subtree(source_id, destination_parent_id, new_owner_id),
            )
            .await
    }

    async fn move_subtree(&self, source_id: Id, destination_parent_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "location::move_subtree",
                    json!({ "source": source_id, "destination_parent": destination_parent_id }),
                ),
                self.inner.move_subtree(source_id, destination_parent_id),
                |_| vec![self.path_tag(source_id)],
            )
            .await
    }

    async fn hide(&self, location_id: Id) -> HandlerResult<()> {
        self.invalidate_path("location::hide", location_id, self.inner.hide(location_id))
            .await
    }

    async fn unhide(&self, location_id: Id) -> HandlerResult<()> {
        self.invalidate_path("location::unhide", location_id, self.inner.unhide(location_id))
            .await
    }

    async fn set_invisible(&self, location_id: Id) -> HandlerResult<()> {
        self.invalidate_path(
            "location::set_invisible",
            location_id,
            self.inner.set_invisible(location_id),
        )
        .await
    }

    async fn set_visible(&self, location_id: Id) -> HandlerResult<()> {
        self.invalidate_path(
            "location::set_visible",
            location_id,
            self.inner.set_visible(location_id),
        )
        .await
    }

    async fn swap(&self, location_id_a: Id, location_id_b: Id) -> HandlerResult<()> {
        let a = self.load(location_id_a, None, true).await?;
        let b = self.load(location_id_b, None, true).await?;

        self.core
            .mutate(
                InnerCall::new(
                    "location::swap",
                    json!({ "location_a": location_id_a, "location_b": location_id_b }),
                ),
                self.inner.swap(location_id_a, location_id_b),
                |_| {
                    vec![
                        self.path_tag(location_id_a),
                        self.path_tag(location_id_b),
                        self.content_tag(a.content_id),
                        self.content_tag(b.content_id),
                    ]
                },
            )
            .await
    }

    async fn update(&self, input: LocationUpdateStruct, location_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "location::update",
                    json!({ "location": location_id, "struct": input }),
                ),
                self.inner.update(input, location_id),
                |_| vec![self.core.tag(TagKind::Location, &[location_id.into()])],
            )
            .await
    }

    async fn create(&self, input: LocationCreateStruct) -> HandlerResult<Location> {
        let content_id = input.content_id;
        self.core
            .mutate(
                InnerCall::new("location::create", json!({ "struct": input })),
                self.inner.create(input),
                |_| vec![self.content_tag(content_id)],
            )
            .await
    }

    async fn remove_subtree(&self, location_id: Id) -> HandlerResult<()> {
        self.invalidate_path(
            "location::remove_subtree",
            location_id,
            self.inner.remove_subtree(location_id),
        )
        .await
    }

    async fn change_main_location(&self, content_id: Id, location_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "location::change_main_location",
                    json!({ "content": content_id, "location": location_id }),
                ),
                self.inner.change_main_location(content_id, location_id),
                |_| vec![self.content_tag(content_id)],
            )
            .await
    }

    async fn count_all_locations(&self) -> HandlerResult<u64> {
        self.core
            .passthrough(
                InnerCall::new("location::count_all_locations", json!({})),
                self.inner.count_all_locations(),
            )
            .await
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{HandlerResult, LocationHandler, UrlAliasHandler};
use crate::application::persistence::PersistenceHandler;
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::url_alias::UrlAlias;

pub struct UrlAliasCacheHandler {
    persistence: Arc<dyn PersistenceHandler>,
    inner: Arc<dyn UrlAliasHandler>,
    core: Arc<CacheCore>,
}

impl UrlAliasCacheHandler {
    pub fn new(persistence: Arc<dyn PersistenceHandler>, core: Arc<CacheCore>) -> Self {
        let inner = persistence.url_alias_handler();
        Self {
            persistence,
            inner,
            core,
        }
    }

    fn location_tag(&self, location_id: Id) -> String {
        self.core
            .tag(TagKind::UrlAliasLocation, &[location_id.into()])
    }

    fn custom_tag(&self, location_id: Id) -> String {
        self.core.tag(TagKind::UrlAliasCustom, &[location_id.into()])
    }

    fn alias_tag(&self, id: &str) -> String {
        self.core.tag(TagKind::UrlAlias, &[Arg::text(id)])
    }

    /// `urla-<id>` plus the location-scoped tags when the alias points at a
    /// location.
    fn alias_tags(&self, alias: &UrlAlias) -> Vec<String> {
        let mut tags = vec![self.alias_tag(&alias.id)];
        if let Some(location_id) = alias.location_id {
            tags.push(self.location_tag(location_id));
            if alias.is_custom {
                tags.push(self.custom_tag(location_id));
            }
        }
        tags
    }
}

#[async_trait]
impl UrlAliasHandler for UrlAliasCacheHandler {
    async fn publish_url_alias_for_location(
        &self,
        location_id: Id,
        parent_location_id: Id,
        name: &str,
        language_code: &str,
        always_available: bool,
        update_path_identification_string: bool,
    ) -> HandlerResult<()> {
        let call = InnerCall::new(
            "url_alias::publish_url_alias_for_location",
            json!({
                "location": location_id,
                "parent_location": parent_location_id,
                "name": name,
                "language_code": language_code,
                "always_available": always_available,
                "update_path_identification_string": update_path_identification_string,
            }),
        );
        self.core
            .mutate(
                call,
                self.inner.publish_url_alias_for_location(
                    location_id,
                    parent_location_id,
                    name,
                    language_code,
                    always_available,
                    update_path_identification_string,
                ),
                |_| vec![self.location_tag(location_id)],
            )
            .await
    }

    async fn create_custom_url_alias(
        &self,
        location_id: Id,
        path: &str,
        forwarding: bool,
        language_code: Option<&str>,
        always_available: bool,
    ) -> HandlerResult<UrlAlias> {
        let call = InnerCall::new(
            "url_alias::create_custom_url_alias",
            json!({
                "location": location_id,
                "path": path,
                "forwarding": forwarding,
                "language_code": language_code,
                "always_available": always_available,
            }),
        );
        self.core
            .mutate(
                call,
                self.inner.create_custom_url_alias(
                    location_id,
                    path,
                    forwarding,
                    language_code,
                    always_available,
                ),
                |_| vec![self.location_tag(location_id), self.custom_tag(location_id)],
            )
            .await
    }

    async fn create_global_url_alias(
        &self,
        resource: &str,
        path: &str,
        forwarding: bool,
        language_code: Option<&str>,
        always_available: bool,
    ) -> HandlerResult<UrlAlias> {
        let call = InnerCall::new(
            "url_alias::create_global_url_alias",
            json!({
                "resource": resource,
                "path": path,
                "forwarding": forwarding,
                "language_code": language_code,
                "always_available": always_available,
            }),
        );
        self.core
            .passthrough(
                call,
                self.inner.create_global_url_alias(
                    resource,
                    path,
                    forwarding,
                    language_code,
                    always_available,
                ),
            )
            .await
    }

    async fn list_global_url_aliases(
        &self,
        language_code: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<UrlAlias>> {
        self.core
            .passthrough(
                InnerCall::new(
                    "url_alias::list_global_url_aliases",
                    json!({ "language_code": language_code, "offset": offset, "limit": limit }),
                ),
                self.inner
                    .list_global_url_aliases(language_code, offset, limit),
            )
            .await
    }

    async fn list_url_aliases_for_location(
        &self,
        location_id: Id,
        custom: bool,
    ) -> HandlerResult<Vec<UrlAlias>> {
        self.core
            .get_cached(
                self.core.key(
                    KeyKind::UrlAliasLocationList,
                    &[location_id.into(), Arg::flag(custom)],
                ),
                InnerCall::new(
                    "url_alias::list_url_aliases_for_location",
                    json!({ "location": location_id, "custom": custom }),
                ),
                self.inner.list_url_aliases_for_location(location_id, custom),
                |aliases| {
                    let mut tags = vec![self.location_tag(location_id)];
                    if custom {
                        tags.push(self.custom_tag(location_id));
                    }
                    tags.extend(aliases.iter().map(|alias| self.alias_tag(&alias.id)));
                    tags
                },
            )
            .await
    }

    async fn remove_url_aliases(&self, url_aliases: &[UrlAlias]) -> HandlerResult<bool> {
        let ids: Vec<&str> = url_aliases.iter().map(|alias| alias.id.as_str()).collect();
        self.core
            .mutate(
                InnerCall::new("url_alias::remove_url_aliases", json!({ "url_aliases": ids })),
                self.inner.remove_url_aliases(url_aliases),
                |_| {
                    url_aliases
                        .iter()
                        .flat_map(|alias| self.alias_tags(alias))
                        .collect()
                },
            )
            .await
    }

    async fn lookup(&self, url: &str) -> HandlerResult<UrlAlias> {
        let url_tag = self.core.tag(TagKind::UrlAliasUrl, &[Arg::hashed(url)]);
        self.core
            .get_cached(
                self.core.key(KeyKind::UrlAliasUrl, &[Arg::hashed(url)]),
                InnerCall::new("url_alias::lookup", json!({ "url": url })),
                self.inner.lookup(url),
                |alias| {
                    let mut tags = self.alias_tags(alias);
                    tags.push(url_tag);
                    tags
                },
            )
            .await
    }

    async fn load_url_alias(&self, id: &str) -> HandlerResult<UrlAlias> {
        self.core
            .get_cached(
                self.core.key(KeyKind::UrlAlias, &[Arg::text(id)]),
                InnerCall::new("url_alias::load_url_alias", json!({ "id": id })),
                self.inner.load_url_alias(id),
                |alias| self.alias_tags(alias),
            )
            .await
    }

    async fn location_moved(
        &self,
        location_id: Id,
        old_parent_id: Id,
        new_parent_id: Id,
    ) -> HandlerResult<()> {
        let locations = self.persistence.location_handler();
        let subtree = self
            .core
            .passthrough(
                InnerCall::new(
                    "location::load_sub_tree_ids",
                    json!({ "location": location_id }),
                ),
                locations.load_sub_tree_ids(location_id),
            )
            .await?;

        self.core
            .mutate(
                InnerCall::new(
                    "url_alias::location_moved",
                    json!({
                        "location": location_id,
                        "old_parent": old_parent_id,
                        "new_parent": new_parent_id,
                    }),
                ),
                self.inner
                    .location_moved(location_id, old_parent_id, new_parent_id),
                |_| {
                    let mut tags = vec![self.location_tag(location_id)];
                    tags.extend(subtree.iter().map(|id| self.location_tag(*id)));
                    tags
                },
            )
            .await
    }

    async fn location_copied(
        &self,
        location_id: Id,
        new_location_id: Id,
        new_parent_id: Id,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "url_alias::location_copied",
                    json!({
                        "location": location_id,
                        "new_location": new_location_id,
                        "new_parent": new_parent_id,
                    }),
                ),
                self.inner
                    .location_copied(location_id, new_location_id, new_parent_id),
                |_| {
                    vec![
                        self.location_tag(location_id),
                        self.location_tag(new_location_id),
                    ]
                },
            )
            .await
    }

    async fn location_deleted(&self, location_id: Id) -> HandlerResult<Vec<UrlAlias>> {
        self.core
            .mutate(
                InnerCall::new("url_alias::location_deleted", json!({ "location": location_id })),
                self.inner.location_deleted(location_id),
                |removed| {
                    let mut tags = vec![self.location_tag(location_id)];
                    tags.extend(removed.iter().map(|alias| self.alias_tag(&alias.id)));
                    tags
                },
            )
            .await
    }

    async fn location_swapped(
        &self,
        location_id_a: Id,
        parent_location_id_a: Id,
        location_id_b: Id,
        parent_location_id_b: Id,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "url_alias::location_swapped",
                    json!({
                        "location_a": location_id_a,
                        "parent_location_a": parent_location_id_a,
                        "location_b": location_id_b,
                        "parent_location_b": parent_location_id_b,
                    }),
                ),
                self.inner.location_swapped(
                    location_id_a,
                    parent_location_id_a,
                    location_id_b,
                    parent_location_id_b,
                ),
                |_| {
                    vec![
                        self.location_tag(location_id_a),
                        self.location_tag(location_id_b),
                    ]
                },
            )
            .await
    }

    async fn translation_removed(
        &self,
        location_ids: &[Id],
        language_code: &str,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "url_alias::translation_removed",
                    json!({ "locations": location_ids, "language_code": language_code }),
                ),
                self.inner.translation_removed(location_ids, language_code),
                |_| {
                    location_ids
                        .iter()
                        .map(|id| self.location_tag(*id))
                        .collect()
                },
            )
            .await
    }

    async fn archive_url_aliases_for_deleted_translations(
        &self,
        location_id: Id,
        parent_location_id: Id,
        language_codes: &[String],
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "url_alias::archive_url_aliases_for_deleted_translations",
                    json!({
                        "location": location_id,
                        "parent_location": parent_location_id,
                        "language_codes": language_codes,
                    }),
                ),
                self.inner.archive_url_aliases_for_deleted_translations(
                    location_id,
                    parent_location_id,
                    language_codes,
                ),
                |_| vec![self.location_tag(location_id)],
            )
            .await
    }
}

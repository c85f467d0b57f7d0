use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{ContentHandler, HandlerResult};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::content::{
    Content, ContentInfo, CreateStruct, MetadataUpdateStruct, Relation, RelationCreateStruct,
    RelationType, UpdateStruct, VersionInfo, VersionStatus,
};
use crate::domain::{Id, VersionNo};

pub struct ContentCacheHandler {
    inner: Arc<dyn ContentHandler>,
    core: Arc<CacheCore>,
}

impl ContentCacheHandler {
    pub fn new(inner: Arc<dyn ContentHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn content_tag(&self, content_id: Id) -> String {
        self.core.tag(TagKind::Content, &[content_id.into()])
    }

    fn version_tag(&self, content_id: Id, version: VersionNo) -> String {
        self.core
            .tag(TagKind::ContentVersion, &[content_id.into(), version.into()])
    }

    fn content_tags(&self, content: &Content) -> Vec<String> {
        vec![
            self.core
                .tag(TagKind::ContentFieldsType, &[content.content_type_id().into()]),
            self.version_tag(content.id(), content.version_no()),
            self.content_tag(content.id()),
        ]
    }

    fn version_info_tags(&self, info: &VersionInfo) -> Vec<String> {
        vec![
            self.version_tag(info.content_info.id, info.version_no),
            self.content_tag(info.content_info.id),
        ]
    }

    fn content_key(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        translations: Option<&[String]>,
    ) -> String {
        self.core.key(
            KeyKind::Content,
            &[content_id.into(), version.into(), Arg::list(translations)],
        )
    }

    fn content_info_key(&self, content_id: Id) -> String {
        self.core.key(KeyKind::ContentInfo, &[content_id.into()])
    }

    fn version_info_key(&self, content_id: Id, version: Option<VersionNo>) -> String {
        self.core
            .key(KeyKind::ContentVersionInfo, &[content_id.into(), version.into()])
    }
}

#[async_trait]
impl ContentHandler for ContentCacheHandler {
    async fn create(&self, input: CreateStruct) -> HandlerResult<Content> {
        // New ids have nothing cached yet.
        self.core
            .passthrough(
                InnerCall::new(
                    "content::create",
                    json!({ "content_type_id": input.content_type_id, "remote_id": input.remote_id }),
                ),
                self.inner.create(input),
            )
            .await
    }

    async fn create_draft_from_version(
        &self,
        content_id: Id,
        src_version: VersionNo,
        user_id: Id,
        language_code: Option<String>,
    ) -> HandlerResult<Content> {
        let call = InnerCall::new(
            "content::create_draft_from_version",
            json!({
                "content": content_id,
                "version": src_version,
                "user": user_id,
                "language_code": language_code,
            }),
        );
        self.core
            .mutate(
                call,
                self.inner
                    .create_draft_from_version(content_id, src_version, user_id, language_code),
                |_| {
                    vec![
                        self.core
                            .tag(TagKind::ContentVersionList, &[content_id.into()]),
                    ]
                },
            )
            .await
    }

    async fn load(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        translations: Option<&[String]>,
    ) -> HandlerResult<Content> {
        let call = InnerCall::new(
            "content::load",
            json!({ "content": content_id, "version": version, "translations": translations }),
        );
        self.core
            .get_cached(
                self.content_key(content_id, version, translations),
                call,
                self.inner.load(content_id, version, translations),
                |content| self.content_tags(content),
            )
            .await
    }

    async fn load_content_list(
        &self,
        content_ids: &[Id],
        translations: Option<&[String]>,
    ) -> HandlerResult<HashMap<Id, Content>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                content_ids,
                |id| self.content_key(*id, None, translations),
                |misses| {
                    InnerCall::new(
                        "content::load_content_list",
                        json!({ "content": misses, "translations": translations }),
                    )
                },
                |misses: Vec<Id>| async move { inner.load_content_list(&misses, translations).await },
                |content| self.content_tags(content),
            )
            .await
    }

    async fn load_content_info(&self, content_id: Id) -> HandlerResult<ContentInfo> {
        self.core
            .get_cached(
                self.content_info_key(content_id),
                InnerCall::new("content::load_content_info", json!({ "content": content_id })),
                self.inner.load_content_info(content_id),
                |info| vec![self.content_tag(info.id)],
            )
            .await
    }

    async fn load_content_info_list(
        &self,
        content_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, ContentInfo>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                content_ids,
                |id| self.content_info_key(*id),
                |misses| InnerCall::new("content::load_content_info_list", json!({ "content": misses })),
                |misses: Vec<Id>| async move { inner.load_content_info_list(&misses).await },
                |info| vec![self.content_tag(info.id)],
            )
            .await
    }

    async fn load_content_info_by_remote_id(&self, remote_id: &str) -> HandlerResult<ContentInfo> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentInfoByRemoteId, &[Arg::text(remote_id)]),
                InnerCall::new(
                    "content::load_content_info_by_remote_id",
                    json!({ "remote_id": remote_id }),
                ),
                self.inner.load_content_info_by_remote_id(remote_id),
                |info| vec![self.content_tag(info.id)],
            )
            .await
    }

    async fn load_version_info(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
    ) -> HandlerResult<VersionInfo> {
        self.core
            .get_cached(
                self.version_info_key(content_id, version),
                InnerCall::new(
                    "content::load_version_info",
                    json!({ "content": content_id, "version": version }),
                ),
                self.inner.load_version_info(content_id, version),
                |info| self.version_info_tags(info),
            )
            .await
    }

    async fn load_version_info_list(
        &self,
        content_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, VersionInfo>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                content_ids,
                |id| self.version_info_key(*id, None),
                |misses| InnerCall::new("content::load_version_info_list", json!({ "content": misses })),
                |misses: Vec<Id>| async move { inner.load_version_info_list(&misses).await },
                |info| self.version_info_tags(info),
            )
            .await
    }

    async fn list_versions(
        &self,
        content_id: Id,
        status: Option<VersionStatus>,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<VersionInfo>> {
        let call = InnerCall::new(
            "content::list_versions",
            json!({ "content": content_id, "status": status, "limit": limit }),
        );
        let load = self.inner.list_versions(content_id, status, limit);

        // Filtered listings have no key of their own.
        if status.is_some() || limit.is_some() {
            return self.core.passthrough(call, load).await;
        }

        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentVersionList, &[content_id.into()]),
                call,
                load,
                |versions| {
                    let mut tags = vec![
                        self.content_tag(content_id),
                        self.core
                            .tag(TagKind::ContentVersionList, &[content_id.into()]),
                    ];
                    tags.extend(
                        versions
                            .iter()
                            .map(|info| self.version_tag(content_id, info.version_no)),
                    );
                    tags
                },
            )
            .await
    }

    async fn set_status(
        &self,
        content_id: Id,
        status: VersionStatus,
        version: VersionNo,
    ) -> HandlerResult<bool> {
        let call = InnerCall::new(
            "content::set_status",
            json!({ "content": content_id, "status": status, "version": version }),
        );
        self.core
            .mutate(call, self.inner.set_status(content_id, status, version), |_| {
                // Publishing changes what the unversioned reads resolve to.
                if status == VersionStatus::Published {
                    vec![self.content_tag(content_id)]
                } else {
                    vec![self.version_tag(content_id, version)]
                }
            })
            .await
    }

    async fn update_metadata(
        &self,
        content_id: Id,
        input: MetadataUpdateStruct,
    ) -> HandlerResult<ContentInfo> {
        let call = InnerCall::new(
            "content::update_metadata",
            json!({ "content": content_id, "struct": input }),
        );
        self.core
            .mutate(call, self.inner.update_metadata(content_id, input), |_| {
                vec![self.content_tag(content_id)]
            })
            .await
    }

    async fn update_content(
        &self,
        content_id: Id,
        version: VersionNo,
        input: UpdateStruct,
    ) -> HandlerResult<Content> {
        let call = InnerCall::new(
            "content::update_content",
            json!({ "content": content_id, "version": version }),
        );
        self.core
            .mutate(
                call,
                self.inner.update_content(content_id, version, input),
                |_| vec![self.version_tag(content_id, version)],
            )
            .await
    }

    async fn delete_content(&self, content_id: Id) -> HandlerResult<()> {
        let relation_type = RelationType::FIELD | RelationType::ASSET;
        let reverse = self
            .core
            .passthrough(
                InnerCall::new(
                    "content::load_reverse_relations",
                    json!({ "content": content_id, "type": relation_type }),
                ),
                self.inner
                    .load_reverse_relations(content_id, Some(relation_type)),
            )
            .await?;

        self.core
            .mutate(
                InnerCall::new("content::delete_content", json!({ "content": content_id })),
                self.inner.delete_content(content_id),
                |_| {
                    let mut tags: Vec<String> = reverse
                        .iter()
                        .map(|relation| self.content_tag(relation.source_content_id))
                        .collect();
                    tags.push(self.content_tag(content_id));
                    tags
                },
            )
            .await
    }

    async fn delete_version(&self, content_id: Id, version: VersionNo) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "content::delete_version",
                    json!({ "content": content_id, "version": version }),
                ),
                self.inner.delete_version(content_id, version),
                |_| vec![self.version_tag(content_id, version)],
            )
            .await
    }

    async fn publish(
        &self,
        content_id: Id,
        version: VersionNo,
        input: MetadataUpdateStruct,
    ) -> HandlerResult<Content> {
        let call = InnerCall::new(
            "content::publish",
            json!({ "content": content_id, "version": version, "struct": input }),
        );
        self.core
            .mutate(call, self.inner.publish(content_id, version, input), |_| {
                vec![self.content_tag(content_id)]
            })
            .await
    }

    async fn copy(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        new_owner_id: Option<Id>,
    ) -> HandlerResult<Content> {
        self.core
            .passthrough(
                InnerCall::new(
                    "content::copy",
                    json!({ "content": content_id, "version": version, "new_owner": new_owner_id }),
                ),
                self.inner.copy(content_id, version, new_owner_id),
            )
            .await
    }

    async fn load_relation(&self, relation_id: Id) -> HandlerResult<Relation> {
        self.core
            .get_cached(
                self.core.key(KeyKind::ContentRelation, &[relation_id.into()]),
                InnerCall::new("content::load_relation", json!({ "relation": relation_id })),
                self.inner.load_relation(relation_id),
                |_| vec![self.core.tag(TagKind::Relation, &[relation_id.into()])],
            )
            .await
    }

    async fn count_relations(
        &self,
        source_content_id: Id,
        version: Option<VersionNo>,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<u64> {
        let key = self.core.key(
            KeyKind::ContentRelationsCount,
            &[source_content_id.into(), version.into(), relation_type.into()],
        );
        self.core
            .get_cached(
                key,
                InnerCall::new(
                    "content::count_relations",
                    json!({ "content": source_content_id, "version": version, "type": relation_type }),
                ),
                self.inner
                    .count_relations(source_content_id, version, relation_type),
                |_| vec![self.content_tag(source_content_id)],
            )
            .await
    }

    async fn load_relation_list(
        &self,
        source_content_id: Id,
        limit: Option<usize>,
        offset: Option<usize>,
        version: Option<VersionNo>,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<Vec<Relation>> {
        let key = self.core.key(
            KeyKind::ContentRelationsList,
            &[
                source_content_id.into(),
                limit.into(),
                offset.into(),
                version.into(),
                relation_type.into(),
            ],
        );
        let call = InnerCall::new(
            "content::load_relation_list",
            json!({
                "content": source_content_id,
                "limit": limit,
                "offset": offset,
                "version": version,
                "type": relation_type,
            }),
        );
        self.core
            .get_cached(
                key,
                call,
                self.inner.load_relation_list(
                    source_content_id,
                    limit,
                    offset,
                    version,
                    relation_type,
                ),
                |relations| {
                    let mut tags = vec![self.content_tag(source_content_id)];
                    tags.extend(
                        relations
                            .iter()
                            .map(|relation| self.core.tag(TagKind::Relation, &[relation.id.into()])),
                    );
                    tags
                },
            )
            .await
    }

    async fn count_reverse_relations(
        &self,
        destination_content_id: Id,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<u64> {
        let key = self.core.key(
            KeyKind::ContentReverseRelationsCount,
            &[destination_content_id.into(), relation_type.into()],
        );
        self.core
            .get_cached(
                key,
                InnerCall::new(
                    "content::count_reverse_relations",
                    json!({ "content": destination_content_id, "type": relation_type }),
                ),
                self.inner
                    .count_reverse_relations(destination_content_id, relation_type),
                |_| vec![self.content_tag(destination_content_id)],
            )
            .await
    }

    async fn load_reverse_relations(
        &self,
        destination_content_id: Id,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<Vec<Relation>> {
        self.core
            .passthrough(
                InnerCall::new(
                    "content::load_reverse_relations",
                    json!({ "content": destination_content_id, "type": relation_type }),
                ),
                self.inner
                    .load_reverse_relations(destination_content_id, relation_type),
            )
            .await
    }

    async fn add_relation(&self, input: RelationCreateStruct) -> HandlerResult<Relation> {
        let source = input.source_content_id;
        let destination = input.destination_content_id;
        self.core
            .mutate(
                InnerCall::new("content::add_relation", json!({ "struct": input })),
                self.inner.add_relation(input),
                |_| vec![self.content_tag(source), self.content_tag(destination)],
            )
            .await
    }

    async fn remove_relation(
        &self,
        relation_id: Id,
        relation_type: RelationType,
        destination_content_id: Option<Id>,
    ) -> HandlerResult<()> {
        let relation = self.load_relation(relation_id).await?;
        let destination = destination_content_id.unwrap_or(relation.destination_content_id);

        self.core
            .mutate(
                InnerCall::new(
                    "content::remove_relation",
                    json!({
                        "relation": relation_id,
                        "type": relation_type,
                        "destination": destination_content_id,
                    }),
                ),
                self.inner
                    .remove_relation(relation_id, relation_type, destination_content_id),
                |_| {
                    vec![
                        self.core.tag(TagKind::Relation, &[relation_id.into()]),
                        self.content_tag(relation.source_content_id),
                        self.content_tag(destination),
                    ]
                },
            )
            .await
    }

    async fn remove_translation_from_content(
        &self,
        content_id: Id,
        language_code: &str,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "content::remove_translation_from_content",
                    json!({ "content": content_id, "language_code": language_code }),
                ),
                self.inner
                    .remove_translation_from_content(content_id, language_code),
                |_| vec![self.content_tag(content_id)],
            )
            .await
    }

    async fn delete_translation_from_draft(
        &self,
        content_id: Id,
        version: VersionNo,
        language_code: &str,
    ) -> HandlerResult<Content> {
        self.core
            .mutate(
                InnerCall::new(
                    "content::delete_translation_from_draft",
                    json!({ "content": content_id, "version": version, "language_code": language_code }),
                ),
                self.inner
                    .delete_translation_from_draft(content_id, version, language_code),
                |_| vec![self.version_tag(content_id, version)],
            )
            .await
    }
}

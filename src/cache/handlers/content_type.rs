use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{ContentTypeHandler, HandlerResult};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::content_type::{
    ContentType, ContentTypeCreateStruct, ContentTypeGroup, ContentTypeStatus,
    ContentTypeUpdateStruct, FieldDefinition, GroupCreateStruct, GroupUpdateStruct,
    SearchableFieldMap,
};

pub struct ContentTypeCacheHandler {
    inner: Arc<dyn ContentTypeHandler>,
    core: Arc<CacheCore>,
}

impl ContentTypeCacheHandler {
    pub fn new(inner: Arc<dyn ContentTypeHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn group_tag(&self, group_id: Id) -> String {
        self.core.tag(TagKind::TypeGroup, &[group_id.into()])
    }

    fn group_list_tag(&self) -> String {
        self.core.tag(TagKind::TypeGroupList, &[])
    }

    fn type_map_tag(&self) -> String {
        self.core.tag(TagKind::TypeMap, &[])
    }

    fn type_key(&self, content_type_id: Id, status: ContentTypeStatus) -> String {
        self.core
            .key(KeyKind::ContentType, &[content_type_id.into(), status.into()])
    }

    fn group_key(&self, group_id: Id) -> String {
        self.core.key(KeyKind::ContentTypeGroup, &[group_id.into()])
    }

    /// Tag a cached type is stored under.
    fn type_tag(&self, content_type_id: Id, status: ContentTypeStatus) -> String {
        match status {
            ContentTypeStatus::Defined => self.core.tag(TagKind::Type, &[content_type_id.into()]),
            other => self.core.tag(
                TagKind::TypeWithStatus,
                &[content_type_id.into(), other.into()],
            ),
        }
    }

    fn type_tags(&self, content_type: &ContentType) -> Vec<String> {
        vec![self.type_tag(content_type.id, content_type.status)]
    }

    /// Tags a mutation of the given type scope invalidates.
    ///
    /// Defined types also back content field reads and the field map; drafts
    /// are only reachable through their status-scoped tag.
    fn scope_tags(&self, content_type_id: Id, status: ContentTypeStatus) -> Vec<String> {
        let mut tags = vec![self.type_tag(content_type_id, status)];
        if status == ContentTypeStatus::Defined {
            tags.push(
                self.core
                    .tag(TagKind::ContentFieldsType, &[content_type_id.into()]),
            );
            tags.push(self.type_map_tag());
        }
        tags
    }
}

#[async_trait]
impl ContentTypeHandler for ContentTypeCacheHandler {
    async fn create_group(&self, input: GroupCreateStruct) -> HandlerResult<ContentTypeGroup> {
        self.core
            .mutate(
                InnerCall::new("content_type::create_group", json!({ "struct": input })),
                self.inner.create_group(input),
                |_| vec![self.group_list_tag()],
            )
            .await
    }

    async fn update_group(&self, input: GroupUpdateStruct) -> HandlerResult<ContentTypeGroup> {
        let group_id = input.id;
        self.core
            .mutate(
                InnerCall::new("content_type::update_group", json!({ "struct": input })),
                self.inner.update_group(input),
                |_| vec![self.group_list_tag(), self.group_tag(group_id)],
            )
            .await
    }

    async fn delete_group(&self, group_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("content_type::delete_group", json!({ "group": group_id })),
                self.inner.delete_group(group_id),
                |_| vec![self.group_list_tag(), self.group_tag(group_id)],
            )
            .await
    }

    async fn load_group(&self, group_id: Id) -> HandlerResult<ContentTypeGroup> {
        self.core
            .get_cached(
                self.group_key(group_id),
                InnerCall::new("content_type::load_group", json!({ "group": group_id })),
                self.inner.load_group(group_id),
                |group| vec![self.group_tag(group.id)],
            )
            .await
    }

    async fn load_groups(&self, group_ids: &[Id]) -> HandlerResult<HashMap<Id, ContentTypeGroup>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                group_ids,
                |id| self.group_key(*id),
                |misses| InnerCall::new("content_type::load_groups", json!({ "groups": misses })),
                |misses: Vec<Id>| async move { inner.load_groups(&misses).await },
                |group| vec![self.group_tag(group.id)],
            )
            .await
    }

    async fn load_group_by_identifier(&self, identifier: &str) -> HandlerResult<ContentTypeGroup> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentTypeGroupByIdentifier, &[Arg::text(identifier)]),
                InnerCall::new(
                    "content_type::load_group_by_identifier",
                    json!({ "identifier": identifier }),
                ),
                self.inner.load_group_by_identifier(identifier),
                |group| vec![self.group_tag(group.id)],
            )
            .await
    }

    async fn load_all_groups(&self) -> HandlerResult<Vec<ContentTypeGroup>> {
        self.core
            .get_cached(
                self.core.key(KeyKind::ContentTypeGroupList, &[]),
                InnerCall::new("content_type::load_all_groups", json!({})),
                self.inner.load_all_groups(),
                |groups| {
                    let mut tags = vec![self.group_list_tag()];
                    tags.extend(groups.iter().map(|group| self.group_tag(group.id)));
                    tags
                },
            )
            .await
    }

    async fn load_content_types(
        &self,
        group_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<Vec<ContentType>> {
        let call = InnerCall::new(
            "content_type::load_content_types",
            json!({ "group": group_id, "status": status }),
        );
        let load = self.inner.load_content_types(group_id, status);

        if status != ContentTypeStatus::Defined {
            return self.core.passthrough(call, load).await;
        }

        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentTypeListByGroup, &[group_id.into()]),
                call,
                load,
                |types| {
                    let mut tags = vec![self.group_tag(group_id), self.type_map_tag()];
                    tags.extend(types.iter().flat_map(|content_type| self.type_tags(content_type)));
                    tags
                },
            )
            .await
    }

    async fn load_content_type_list(
        &self,
        content_type_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, ContentType>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                content_type_ids,
                |id| self.type_key(*id, ContentTypeStatus::Defined),
                |misses| {
                    InnerCall::new(
                        "content_type::load_content_type_list",
                        json!({ "content_types": misses }),
                    )
                },
                |misses: Vec<Id>| async move { inner.load_content_type_list(&misses).await },
                |content_type| self.type_tags(content_type),
            )
            .await
    }

    async fn load(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<ContentType> {
        self.core
            .get_cached(
                self.type_key(content_type_id, status),
                InnerCall::new(
                    "content_type::load",
                    json!({ "content_type": content_type_id, "status": status }),
                ),
                self.inner.load(content_type_id, status),
                |content_type| self.type_tags(content_type),
            )
            .await
    }

    async fn load_by_identifier(&self, identifier: &str) -> HandlerResult<ContentType> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentTypeByIdentifier, &[Arg::text(identifier)]),
                InnerCall::new(
                    "content_type::load_by_identifier",
                    json!({ "identifier": identifier }),
                ),
                self.inner.load_by_identifier(identifier),
                |content_type| self.type_tags(content_type),
            )
            .await
    }

    async fn load_by_remote_id(&self, remote_id: &str) -> HandlerResult<ContentType> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentTypeByRemoteId, &[Arg::text(remote_id)]),
                InnerCall::new(
                    "content_type::load_by_remote_id",
                    json!({ "remote_id": remote_id }),
                ),
                self.inner.load_by_remote_id(remote_id),
                |content_type| self.type_tags(content_type),
            )
            .await
    }

    async fn create(&self, input: ContentTypeCreateStruct) -> HandlerResult<ContentType> {
        let status = input.status;
        let group_ids = input.group_ids.clone();
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::create",
                    json!({ "identifier": input.identifier, "status": status }),
                ),
                self.inner.create(input),
                |_| {
                    if status != ContentTypeStatus::Defined {
                        return Vec::new();
                    }
                    let mut tags = vec![self.type_map_tag()];
                    tags.extend(group_ids.iter().map(|group_id| self.group_tag(*group_id)));
                    tags
                },
            )
            .await
    }

    async fn update(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        input: ContentTypeUpdateStruct,
    ) -> HandlerResult<ContentType> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::update",
                    json!({ "content_type": content_type_id, "status": status, "struct": input }),
                ),
                self.inner.update(content_type_id, status, input),
                |_| self.scope_tags(content_type_id, status),
            )
            .await
    }

    async fn delete(&self, content_type_id: Id, status: ContentTypeStatus) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::delete",
                    json!({ "content_type": content_type_id, "status": status }),
                ),
                self.inner.delete(content_type_id, status),
                |_| self.scope_tags(content_type_id, status),
            )
            .await
    }

    async fn create_draft(
        &self,
        modifier_id: Id,
        content_type_id: Id,
    ) -> HandlerResult<ContentType> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::create_draft",
                    json!({ "modifier": modifier_id, "content_type": content_type_id }),
                ),
                self.inner.create_draft(modifier_id, content_type_id),
                |_| self.scope_tags(content_type_id, ContentTypeStatus::Draft),
            )
            .await
    }

    async fn copy(
        &self,
        user_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<ContentType> {
        self.core
            .passthrough(
                InnerCall::new(
                    "content_type::copy",
                    json!({ "user": user_id, "content_type": content_type_id, "status": status }),
                ),
                self.inner.copy(user_id, content_type_id, status),
            )
            .await
    }

    async fn link(
        &self,
        group_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::link",
                    json!({ "group": group_id, "content_type": content_type_id, "status": status }),
                ),
                self.inner.link(group_id, content_type_id, status),
                |_| {
                    let mut tags = vec![self.group_tag(group_id)];
                    tags.extend(self.scope_tags(content_type_id, status));
                    tags
                },
            )
            .await
    }

    async fn unlink(
        &self,
        group_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::unlink",
                    json!({ "group": group_id, "content_type": content_type_id, "status": status }),
                ),
                self.inner.unlink(group_id, content_type_id, status),
                |_| {
                    let mut tags = vec![self.group_tag(group_id)];
                    tags.extend(self.scope_tags(content_type_id, status));
                    tags
                },
            )
            .await
    }

    async fn get_field_definition(
        &self,
        field_definition_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<FieldDefinition> {
        self.core
            .passthrough(
                InnerCall::new(
                    "content_type::get_field_definition",
                    json!({ "field_definition": field_definition_id, "status": status }),
                ),
                self.inner.get_field_definition(field_definition_id, status),
            )
            .await
    }

    async fn get_content_count(&self, content_type_id: Id) -> HandlerResult<u64> {
        self.core
            .passthrough(
                InnerCall::new(
                    "content_type::get_content_count",
                    json!({ "content_type": content_type_id }),
                ),
                self.inner.get_content_count(content_type_id),
            )
            .await
    }

    async fn add_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition: FieldDefinition,
    ) -> HandlerResult<FieldDefinition> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::add_field_definition",
                    json!({
                        "content_type": content_type_id,
                        "status": status,
                        "field_definition": field_definition.identifier,
                    }),
                ),
                self.inner
                    .add_field_definition(content_type_id, status, field_definition),
                |_| self.scope_tags(content_type_id, status),
            )
            .await
    }

    async fn remove_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition_id: Id,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::remove_field_definition",
                    json!({
                        "content_type": content_type_id,
                        "status": status,
                        "field_definition": field_definition_id,
                    }),
                ),
                self.inner
                    .remove_field_definition(content_type_id, status, field_definition_id),
                |_| self.scope_tags(content_type_id, status),
            )
            .await
    }

    async fn update_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition: FieldDefinition,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "content_type::update_field_definition",
                    json!({
                        "content_type": content_type_id,
                        "status": status,
                        "field_definition": field_definition.id,
                    }),
                ),
                self.inner
                    .update_field_definition(content_type_id, status, field_definition),
                |_| self.scope_tags(content_type_id, status),
            )
            .await
    }

    async fn publish(&self, content_type_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("content_type::publish", json!({ "content_type": content_type_id })),
                self.inner.publish(content_type_id),
                |_| {
                    let mut tags = self.scope_tags(content_type_id, ContentTypeStatus::Defined);
                    tags.extend(self.scope_tags(content_type_id, ContentTypeStatus::Draft));
                    tags
                },
            )
            .await
    }

    async fn get_searchable_field_map(&self) -> HandlerResult<SearchableFieldMap> {
        self.core
            .get_cached(
                self.core.key(KeyKind::ContentTypeFieldMap, &[]),
                InnerCall::new("content_type::get_searchable_field_map", json!({})),
                self.inner.get_searchable_field_map(),
                |_| vec![self.type_map_tag()],
            )
            .await
    }
}

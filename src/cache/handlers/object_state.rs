use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{HandlerResult, ObjectStateHandler};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::object_state::{InputStruct, ObjectState, ObjectStateGroup};

pub struct ObjectStateCacheHandler {
    inner: Arc<dyn ObjectStateHandler>,
    core: Arc<CacheCore>,
}

impl ObjectStateCacheHandler {
    pub fn new(inner: Arc<dyn ObjectStateHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn group_tag(&self, group_id: Id) -> String {
        self.core.tag(TagKind::StateGroup, &[group_id.into()])
    }

    fn all_groups_tag(&self) -> String {
        self.core.tag(TagKind::StateGroupAll, &[])
    }

    fn state_tags(&self, state: &ObjectState) -> Vec<String> {
        vec![
            self.core.tag(TagKind::State, &[state.id.into()]),
            self.group_tag(state.group_id),
        ]
    }
}

#[async_trait]
impl ObjectStateHandler for ObjectStateCacheHandler {
    async fn create_group(&self, input: InputStruct) -> HandlerResult<ObjectStateGroup> {
        self.core
            .mutate(
                InnerCall::new("object_state::create_group", json!({ "struct": input })),
                self.inner.create_group(input),
                |_| vec![self.all_groups_tag()],
            )
            .await
    }

    async fn load_group(&self, group_id: Id) -> HandlerResult<ObjectStateGroup> {
        self.core
            .get_cached(
                self.core.key(KeyKind::StateGroup, &[group_id.into()]),
                InnerCall::new("object_state::load_group", json!({ "group": group_id })),
                self.inner.load_group(group_id),
                |group| vec![self.group_tag(group.id)],
            )
            .await
    }

    async fn load_group_by_identifier(&self, identifier: &str) -> HandlerResult<ObjectStateGroup> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::StateGroupByIdentifier, &[Arg::text(identifier)]),
                InnerCall::new(
                    "object_state::load_group_by_identifier",
                    json!({ "identifier": identifier }),
                ),
                self.inner.load_group_by_identifier(identifier),
                |group| vec![self.group_tag(group.id)],
            )
            .await
    }

    async fn load_all_groups(
        &self,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<ObjectStateGroup>> {
        let call = InnerCall::new(
            "object_state::load_all_groups",
            json!({ "offset": offset, "limit": limit }),
        );
        let load = self.inner.load_all_groups(offset, limit);

        // Only the complete listing has a key.
        if offset != 0 || limit.is_some() {
            return self.core.passthrough(call, load).await;
        }

        self.core
            .get_cached(
                self.core.key(KeyKind::StateGroupAll, &[]),
                call,
                load,
                |groups| {
                    let mut tags = vec![self.all_groups_tag()];
                    tags.extend(groups.iter().map(|group| self.group_tag(group.id)));
                    tags
                },
            )
            .await
    }

    async fn load_object_states(&self, group_id: Id) -> HandlerResult<Vec<ObjectState>> {
        self.core
            .get_cached(
                self.core.key(KeyKind::StateListByGroup, &[group_id.into()]),
                InnerCall::new(
                    "object_state::load_object_states",
                    json!({ "group": group_id }),
                ),
                self.inner.load_object_states(group_id),
                |states| {
                    let mut tags = vec![self.group_tag(group_id)];
                    for state in states {
                        tags.extend(self.state_tags(state));
                    }
                    tags
                },
            )
            .await
    }

    async fn update_group(
        &self,
        group_id: Id,
        input: InputStruct,
    ) -> HandlerResult<ObjectStateGroup> {
        self.core
            .mutate(
                InnerCall::new(
                    "object_state::update_group",
                    json!({ "group": group_id, "struct": input }),
                ),
                self.inner.update_group(group_id, input),
                |_| vec![self.group_tag(group_id)],
            )
            .await
    }

    async fn delete_group(&self, group_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("object_state::delete_group", json!({ "group": group_id })),
                self.inner.delete_group(group_id),
                |_| vec![self.all_groups_tag(), self.group_tag(group_id)],
            )
            .await
    }

    async fn create(&self, group_id: Id, input: InputStruct) -> HandlerResult<ObjectState> {
        self.core
            .mutate(
                InnerCall::new(
                    "object_state::create",
                    json!({ "group": group_id, "struct": input }),
                ),
                self.inner.create(group_id, input),
                |_| vec![self.group_tag(group_id)],
            )
            .await
    }

    async fn load(&self, state_id: Id) -> HandlerResult<ObjectState> {
        self.core
            .get_cached(
                self.core.key(KeyKind::State, &[state_id.into()]),
                InnerCall::new("object_state::load", json!({ "state": state_id })),
                self.inner.load(state_id),
                |state| self.state_tags(state),
            )
            .await
    }

    async fn load_by_identifier(
        &self,
        identifier: &str,
        group_id: Id,
    ) -> HandlerResult<ObjectState> {
        self.core
            .get_cached(
                self.core.key(
                    KeyKind::StateByIdentifier,
                    &[Arg::text(identifier), group_id.into()],
                ),
                InnerCall::new(
                    "object_state::load_by_identifier",
                    json!({ "identifier": identifier, "group": group_id }),
                ),
                self.inner.load_by_identifier(identifier, group_id),
                |state| self.state_tags(state),
            )
            .await
    }

    async fn update(&self, state_id: Id, input: InputStruct) -> HandlerResult<ObjectState> {
        self.core
            .mutate(
                InnerCall::new(
                    "object_state::update",
                    json!({ "state": state_id, "struct": input }),
                ),
                self.inner.update(state_id, input),
                |_| vec![self.core.tag(TagKind::State, &[state_id.into()])],
            )
            .await
    }

    async fn set_priority(&self, state_id: Id, priority: i32) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "object_state::set_priority",
                    json!({ "state": state_id, "priority": priority }),
                ),
                self.inner.set_priority(state_id, priority),
                |_| vec![self.core.tag(TagKind::State, &[state_id.into()])],
            )
            .await
    }

    async fn delete(&self, state_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("object_state::delete", json!({ "state": state_id })),
                self.inner.delete(state_id),
                |_| vec![self.core.tag(TagKind::State, &[state_id.into()])],
            )
            .await
    }

    async fn set_content_state(
        &self,
        content_id: Id,
        group_id: Id,
        state_id: Id,
    ) -> HandlerResult<bool> {
        self.core
            .mutate(
                InnerCall::new(
                    "object_state::set_content_state",
                    json!({ "content": content_id, "group": group_id, "state": state_id }),
                ),
                self.inner.set_content_state(content_id, group_id, state_id),
                |_| {
                    vec![
                        self.core
                            .tag(TagKind::ContentState, &[content_id.into(), group_id.into()]),
                    ]
                },
            )
            .await
    }

    async fn get_content_state(&self, content_id: Id, group_id: Id) -> HandlerResult<ObjectState> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::ContentState, &[content_id.into(), group_id.into()]),
                InnerCall::new(
                    "object_state::get_content_state",
                    json!({ "content": content_id, "group": group_id }),
                ),
                self.inner.get_content_state(content_id, group_id),
                |state| {
                    let mut tags = self.state_tags(state);
                    tags.push(
                        self.core
                            .tag(TagKind::ContentState, &[content_id.into(), group_id.into()]),
                    );
                    tags
                },
            )
            .await
    }

    async fn get_content_count(&self, state_id: Id) -> HandlerResult<u64> {
        self.core
            .passthrough(
                InnerCall::new("object_state::get_content_count", json!({ "state": state_id })),
                self.inner.get_content_count(state_id),
            )
            .await
    }
}

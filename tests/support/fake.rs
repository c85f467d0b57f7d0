//! In-memory storage engine standing in for the real persistence handlers.
//!
//! One `FakeStorage` implements every handler trait over a single guarded
//! state, so a write through one trait is visible to reads through another.
//! Every method records itself in a journal before touching the state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use persistence_cache::application::handlers::{
    ContentHandler, ContentTypeHandler, HandlerResult, LanguageHandler, LocationHandler,
    ObjectStateHandler, SectionHandler, TransactionHandler, TrashHandler, UrlAliasHandler,
    UrlWildcardHandler, UserHandler,
};
use persistence_cache::domain::content::{
    Content, ContentInfo, ContentStatus, CreateStruct, MetadataUpdateStruct, Relation,
    RelationCreateStruct, RelationType, UpdateStruct, VersionInfo, VersionStatus,
};
use persistence_cache::domain::content_type::{
    ContentType, ContentTypeCreateStruct, ContentTypeGroup, ContentTypeStatus,
    ContentTypeUpdateStruct, FieldDefinition, GroupCreateStruct, GroupUpdateStruct,
    SearchableField, SearchableFieldMap,
};
use persistence_cache::domain::error::PersistenceError;
use persistence_cache::domain::language::{Language, LanguageCreateStruct};
use persistence_cache::domain::location::{Location, LocationCreateStruct, LocationUpdateStruct};
use persistence_cache::domain::object_state::{InputStruct, ObjectState, ObjectStateGroup};
use persistence_cache::domain::section::Section;
use persistence_cache::domain::trash::{
    TrashItemDeleteResult, TrashItemDeleteResultList, TrashResult, Trashed,
};
use persistence_cache::domain::url_alias::{UrlAlias, UrlAliasType};
use persistence_cache::domain::url_wildcard::UrlWildcard;
use persistence_cache::domain::user::{
    Policy, Role, RoleAssignment, RoleCreateStruct, RoleUpdateStruct, User, UserTokenUpdateStruct,
};
use persistence_cache::domain::{Id, VersionNo};
use time::OffsetDateTime;

use super::fixtures;

#[derive(Debug, Default)]
pub struct State {
    pub next_id: Id,
    pub infos: BTreeMap<Id, ContentInfo>,
    pub versions: BTreeMap<(Id, VersionNo), Content>,
    pub relations: BTreeMap<Id, Relation>,
    pub locations: BTreeMap<Id, Location>,
    pub types: HashMap<(Id, ContentTypeStatus), ContentType>,
    pub groups: BTreeMap<Id, ContentTypeGroup>,
    pub users: BTreeMap<Id, User>,
    pub tokens: BTreeMap<String, Id>,
    pub roles: BTreeMap<Id, Role>,
    pub assignments: BTreeMap<Id, RoleAssignment>,
    /// User group memberships, used for inherited role assignments.
    pub memberships: BTreeMap<Id, Vec<Id>>,
    pub sections: BTreeMap<Id, Section>,
    pub state_groups: BTreeMap<Id, ObjectStateGroup>,
    pub states: BTreeMap<Id, ObjectState>,
    pub content_states: BTreeMap<(Id, Id), Id>,
    pub trash: BTreeMap<Id, Trashed>,
    pub aliases: Vec<UrlAlias>,
    pub wildcards: BTreeMap<Id, UrlWildcard>,
    pub languages: BTreeMap<Id, Language>,
    pub transaction_depth: usize,
}

impl State {
    fn allocate_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn content(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        translations: Option<&[String]>,
    ) -> HandlerResult<Content> {
        let info = self
            .infos
            .get(&content_id)
            .ok_or_else(|| PersistenceError::not_found("content", content_id))?;
        let version = version.unwrap_or(info.current_version_no);
        let mut content = self
            .versions
            .get(&(content_id, version))
            .cloned()
            .ok_or_else(|| {
                PersistenceError::not_found("content version", format!("{content_id}/{version}"))
            })?;
        content.version_info.content_info = info.clone();
        if let Some(languages) = translations {
            content
                .fields
                .retain(|field| languages.contains(&field.language_code));
        }
        Ok(content)
    }

    fn version_info(&self, content_id: Id, version: Option<VersionNo>) -> HandlerResult<VersionInfo> {
        Ok(self.content(content_id, version, None)?.version_info)
    }

    fn location(&self, location_id: Id) -> HandlerResult<Location> {
        self.locations
            .get(&location_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("location", location_id))
    }

    fn subtree(&self, location_id: Id) -> Vec<Id> {
        self.locations
            .values()
            .filter(|location| location.path().contains(&location_id))
            .map(|location| location.id)
            .collect()
    }

    fn content_type(&self, content_type_id: Id, status: ContentTypeStatus) -> HandlerResult<ContentType> {
        self.types
            .get(&(content_type_id, status))
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))
    }

    fn group(&self, group_id: Id) -> HandlerResult<ContentTypeGroup> {
        self.groups
            .get(&group_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("content type group", group_id))
    }

    fn user(&self, user_id: Id) -> HandlerResult<User> {
        self.users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("user", user_id))
    }

    fn role(&self, role_id: Id) -> HandlerResult<Role> {
        self.roles
            .get(&role_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("role", role_id))
    }

    fn state_group(&self, group_id: Id) -> HandlerResult<ObjectStateGroup> {
        self.state_groups
            .get(&group_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("object state group", group_id))
    }

    fn object_state(&self, state_id: Id) -> HandlerResult<ObjectState> {
        self.states
            .get(&state_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("object state", state_id))
    }

    fn language(&self, language_id: Id) -> HandlerResult<Language> {
        self.languages
            .get(&language_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("language", language_id))
    }

    fn language_by_code(&self, language_code: &str) -> HandlerResult<Language> {
        self.languages
            .values()
            .find(|language| language.language_code == language_code)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("language", language_code))
    }

    fn move_location(&mut self, location_id: Id, new_parent_id: Id) -> HandlerResult<()> {
        let moved = self.location(location_id)?;
        let parent = self.location(new_parent_id)?;
        let new_path = format!("{}{}/", parent.path_string, location_id);
        let depth_delta = parent.depth + 1 - moved.depth;
        for location in self.locations.values_mut() {
            if location.path_string.starts_with(&moved.path_string) {
                location.path_string =
                    location.path_string.replacen(&moved.path_string, &new_path, 1);
                location.depth += depth_delta;
            }
        }
        if let Some(location) = self.locations.get_mut(&location_id) {
            location.parent_id = new_parent_id;
        }
        Ok(())
    }

    fn set_subtree_flag(&mut self, location_id: Id, apply: impl Fn(&mut Location, bool)) -> HandlerResult<()> {
        self.location(location_id)?;
        for id in self.subtree(location_id) {
            if let Some(location) = self.locations.get_mut(&id) {
                apply(location, id == location_id);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeStorage {
    state: Mutex<State>,
    journal: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, PersistenceError>>,
}

impl FakeStorage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        let storage = Self::default();
        fixtures::seed(&mut storage.state());
        storage
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake storage state lock")
    }

    /// Operations the storage served, in order.
    pub fn journal(&self) -> Vec<&'static str> {
        self.journal.lock().expect("journal lock").clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.journal
            .lock()
            .expect("journal lock")
            .iter()
            .filter(|entry| **entry == operation)
            .count()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().expect("journal lock").clear();
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: PersistenceError) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(operation, error);
    }

    fn enter(&self, operation: &'static str) -> HandlerResult<()> {
        self.journal.lock().expect("journal lock").push(operation);
        match self.failures.lock().expect("failures lock").remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn apply_metadata(info: &mut ContentInfo, input: &MetadataUpdateStruct) {
    if let Some(owner_id) = input.owner_id {
        info.owner_id = owner_id;
    }
    if let Some(name) = &input.name {
        info.name = name.clone();
    }
    if let Some(remote_id) = &input.remote_id {
        info.remote_id = remote_id.clone();
    }
    if let Some(code) = &input.main_language_code {
        info.main_language_code = code.clone();
    }
    if let Some(always_available) = input.always_available {
        info.always_available = always_available;
    }
    if let Some(date) = input.publication_date {
        info.publication_date = date;
    }
    if let Some(date) = input.modification_date {
        info.modification_date = date;
    }
}

fn relation_matches(relation: &Relation, relation_type: Option<RelationType>) -> bool {
    relation_type.is_none_or(|mask| relation.relation_type.intersects(mask))
}

fn page<T: Clone>(items: &[T], offset: usize, limit: Option<usize>) -> Vec<T> {
    items
        .iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

#[async_trait]
impl ContentHandler for FakeStorage {
    async fn create(&self, input: CreateStruct) -> HandlerResult<Content> {
        self.enter("content.create")?;
        let mut state = self.state();
        let id = state.allocate_id();
        let info = ContentInfo {
            id,
            content_type_id: input.content_type_id,
            section_id: input.section_id,
            owner_id: input.owner_id,
            name: input
                .names
                .get(&input.initial_language_code)
                .cloned()
                .unwrap_or_default(),
            remote_id: input.remote_id,
            current_version_no: 1,
            status: ContentStatus::Draft,
            main_language_code: input.initial_language_code.clone(),
            main_location_id: None,
            always_available: input.always_available,
            is_hidden: false,
            modification_date: OffsetDateTime::UNIX_EPOCH,
            publication_date: OffsetDateTime::UNIX_EPOCH,
        };
        let content = Content {
            version_info: VersionInfo {
                content_info: info.clone(),
                version_no: 1,
                status: VersionStatus::Draft,
                creator_id: input.owner_id,
                initial_language_code: input.initial_language_code.clone(),
                language_codes: vec![input.initial_language_code],
                names: input.names,
                creation_date: OffsetDateTime::UNIX_EPOCH,
                modification_date: OffsetDateTime::UNIX_EPOCH,
            },
            fields: input.fields,
        };
        state.infos.insert(id, info);
        state.versions.insert((id, 1), content.clone());
        Ok(content)
    }

    async fn create_draft_from_version(
        &self,
        content_id: Id,
        src_version: VersionNo,
        user_id: Id,
        language_code: Option<String>,
    ) -> HandlerResult<Content> {
        self.enter("content.create_draft_from_version")?;
        let mut state = self.state();
        let mut draft = state.content(content_id, Some(src_version), None)?;
        let next = state
            .versions
            .keys()
            .filter(|(id, _)| *id == content_id)
            .map(|(_, version)| *version)
            .max()
            .unwrap_or(0)
            + 1;
        draft.version_info.version_no = next;
        draft.version_info.status = VersionStatus::Draft;
        draft.version_info.creator_id = user_id;
        if let Some(code) = language_code {
            draft.version_info.initial_language_code = code;
        }
        for field in &mut draft.fields {
            field.version_no = next;
        }
        state.versions.insert((content_id, next), draft.clone());
        Ok(draft)
    }

    async fn load(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        translations: Option<&[String]>,
    ) -> HandlerResult<Content> {
        self.enter("content.load")?;
        self.state().content(content_id, version, translations)
    }

    async fn load_content_list(
        &self,
        content_ids: &[Id],
        translations: Option<&[String]>,
    ) -> HandlerResult<HashMap<Id, Content>> {
        self.enter("content.load_content_list")?;
        let state = self.state();
        Ok(content_ids
            .iter()
            .filter_map(|id| {
                state
                    .content(*id, None, translations)
                    .ok()
                    .map(|content| (*id, content))
            })
            .collect())
    }

    async fn load_content_info(&self, content_id: Id) -> HandlerResult<ContentInfo> {
        self.enter("content.load_content_info")?;
        self.state()
            .infos
            .get(&content_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("content", content_id))
    }

    async fn load_content_info_list(
        &self,
        content_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, ContentInfo>> {
        self.enter("content.load_content_info_list")?;
        let state = self.state();
        Ok(content_ids
            .iter()
            .filter_map(|id| state.infos.get(id).map(|info| (*id, info.clone())))
            .collect())
    }

    async fn load_content_info_by_remote_id(&self, remote_id: &str) -> HandlerResult<ContentInfo> {
        self.enter("content.load_content_info_by_remote_id")?;
        self.state()
            .infos
            .values()
            .find(|info| info.remote_id == remote_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("content", remote_id))
    }

    async fn load_version_info(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
    ) -> HandlerResult<VersionInfo> {
        self.enter("content.load_version_info")?;
        self.state().version_info(content_id, version)
    }

    async fn load_version_info_list(
        &self,
        content_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, VersionInfo>> {
        self.enter("content.load_version_info_list")?;
        let state = self.state();
        Ok(content_ids
            .iter()
            .filter_map(|id| state.version_info(*id, None).ok().map(|info| (*id, info)))
            .collect())
    }

    async fn list_versions(
        &self,
        content_id: Id,
        status: Option<VersionStatus>,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<VersionInfo>> {
        self.enter("content.list_versions")?;
        let state = self.state();
        let versions: Vec<VersionInfo> = state
            .versions
            .iter()
            .filter(|((id, _), _)| *id == content_id)
            .filter_map(|((id, version), _)| state.version_info(*id, Some(*version)).ok())
            .filter(|info| status.is_none_or(|status| info.status == status))
            .collect();
        Ok(page(&versions, 0, limit))
    }

    async fn set_status(
        &self,
        content_id: Id,
        status: VersionStatus,
        version: VersionNo,
    ) -> HandlerResult<bool> {
        self.enter("content.set_status")?;
        let mut state = self.state();
        let content = state
            .versions
            .get_mut(&(content_id, version))
            .ok_or_else(|| PersistenceError::not_found("content version", content_id))?;
        content.version_info.status = status;
        if status == VersionStatus::Published
            && let Some(info) = state.infos.get_mut(&content_id)
        {
            info.current_version_no = version;
            info.status = ContentStatus::Published;
        }
        Ok(true)
    }

    async fn update_metadata(
        &self,
        content_id: Id,
        input: MetadataUpdateStruct,
    ) -> HandlerResult<ContentInfo> {
        self.enter("content.update_metadata")?;
        let mut state = self.state();
        let info = state
            .infos
            .get_mut(&content_id)
            .ok_or_else(|| PersistenceError::not_found("content", content_id))?;
        apply_metadata(info, &input);
        Ok(info.clone())
    }

    async fn update_content(
        &self,
        content_id: Id,
        version: VersionNo,
        input: UpdateStruct,
    ) -> HandlerResult<Content> {
        self.enter("content.update_content")?;
        let mut state = self.state();
        let content = state
            .versions
            .get_mut(&(content_id, version))
            .ok_or_else(|| PersistenceError::not_found("content version", content_id))?;
        content.version_info.names = input.names;
        content.version_info.creator_id = input.creator_id;
        content.version_info.initial_language_code = input.initial_language_code;
        content.fields = input.fields;
        drop(state);
        self.state().content(content_id, Some(version), None)
    }

    async fn delete_content(&self, content_id: Id) -> HandlerResult<()> {
        self.enter("content.delete_content")?;
        let mut state = self.state();
        if state.infos.remove(&content_id).is_none() {
            return Err(PersistenceError::not_found("content", content_id));
        }
        state.versions.retain(|(id, _), _| *id != content_id);
        state.relations.retain(|_, relation| {
            relation.source_content_id != content_id
                && relation.destination_content_id != content_id
        });
        Ok(())
    }

    async fn delete_version(&self, content_id: Id, version: VersionNo) -> HandlerResult<()> {
        self.enter("content.delete_version")?;
        self.state()
            .versions
            .remove(&(content_id, version))
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("content version", content_id))
    }

    async fn publish(
        &self,
        content_id: Id,
        version: VersionNo,
        input: MetadataUpdateStruct,
    ) -> HandlerResult<Content> {
        self.enter("content.publish")?;
        let mut state = self.state();
        let content = state
            .versions
            .get_mut(&(content_id, version))
            .ok_or_else(|| PersistenceError::not_found("content version", content_id))?;
        content.version_info.status = VersionStatus::Published;
        let info = state
            .infos
            .get_mut(&content_id)
            .ok_or_else(|| PersistenceError::not_found("content", content_id))?;
        apply_metadata(info, &input);
        info.current_version_no = version;
        info.status = ContentStatus::Published;
        state.content(content_id, Some(version), None)
    }

    async fn copy(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        new_owner_id: Option<Id>,
    ) -> HandlerResult<Content> {
        self.enter("content.copy")?;
        let mut state = self.state();
        let mut copy = state.content(content_id, version, None)?;
        let id = state.allocate_id();
        let info = &mut copy.version_info.content_info;
        info.id = id;
        info.remote_id = format!("copy-of-{}", info.remote_id);
        info.current_version_no = copy.version_info.version_no;
        if let Some(owner) = new_owner_id {
            info.owner_id = owner;
        }
        state.infos.insert(id, copy.version_info.content_info.clone());
        state
            .versions
            .insert((id, copy.version_info.version_no), copy.clone());
        Ok(copy)
    }

    async fn load_relation(&self, relation_id: Id) -> HandlerResult<Relation> {
        self.enter("content.load_relation")?;
        self.state()
            .relations
            .get(&relation_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("relation", relation_id))
    }

    async fn count_relations(
        &self,
        source_content_id: Id,
        version: Option<VersionNo>,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<u64> {
        self.enter("content.count_relations")?;
        let state = self.state();
        Ok(state
            .relations
            .values()
            .filter(|relation| relation.source_content_id == source_content_id)
            .filter(|relation| version.is_none_or(|v| relation.source_content_version_no == v))
            .filter(|relation| relation_matches(relation, relation_type))
            .count() as u64)
    }

    async fn load_relation_list(
        &self,
        source_content_id: Id,
        limit: Option<usize>,
        offset: Option<usize>,
        version: Option<VersionNo>,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<Vec<Relation>> {
        self.enter("content.load_relation_list")?;
        let state = self.state();
        let relations: Vec<Relation> = state
            .relations
            .values()
            .filter(|relation| relation.source_content_id == source_content_id)
            .filter(|relation| version.is_none_or(|v| relation.source_content_version_no == v))
            .filter(|relation| relation_matches(relation, relation_type))
            .cloned()
            .collect();
        Ok(page(&relations, offset.unwrap_or(0), limit))
    }

    async fn count_reverse_relations(
        &self,
        destination_content_id: Id,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<u64> {
        self.enter("content.count_reverse_relations")?;
        let state = self.state();
        Ok(state
            .relations
            .values()
            .filter(|relation| relation.destination_content_id == destination_content_id)
            .filter(|relation| relation_matches(relation, relation_type))
            .count() as u64)
    }

    async fn load_reverse_relations(
        &self,
        destination_content_id: Id,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<Vec<Relation>> {
        self.enter("content.load_reverse_relations")?;
        let state = self.state();
        Ok(state
            .relations
            .values()
            .filter(|relation| relation.destination_content_id == destination_content_id)
            .filter(|relation| relation_matches(relation, relation_type))
            .cloned()
            .collect())
    }

    async fn add_relation(&self, input: RelationCreateStruct) -> HandlerResult<Relation> {
        self.enter("content.add_relation")?;
        let mut state = self.state();
        let relation = Relation {
            id: state.allocate_id(),
            source_content_id: input.source_content_id,
            source_content_version_no: input.source_content_version_no,
            source_field_definition_id: input.source_field_definition_id,
            destination_content_id: input.destination_content_id,
            relation_type: input.relation_type,
        };
        state.relations.insert(relation.id, relation.clone());
        Ok(relation)
    }

    async fn remove_relation(
        &self,
        relation_id: Id,
        _relation_type: RelationType,
        _destination_content_id: Option<Id>,
    ) -> HandlerResult<()> {
        self.enter("content.remove_relation")?;
        self.state()
            .relations
            .remove(&relation_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("relation", relation_id))
    }

    async fn remove_translation_from_content(
        &self,
        content_id: Id,
        language_code: &str,
    ) -> HandlerResult<()> {
        self.enter("content.remove_translation_from_content")?;
        let mut state = self.state();
        for ((id, _), content) in state.versions.iter_mut() {
            if *id == content_id {
                content
                    .fields
                    .retain(|field| field.language_code != language_code);
                content.version_info.names.remove(language_code);
                content
                    .version_info
                    .language_codes
                    .retain(|code| code != language_code);
            }
        }
        Ok(())
    }

    async fn delete_translation_from_draft(
        &self,
        content_id: Id,
        version: VersionNo,
        language_code: &str,
    ) -> HandlerResult<Content> {
        self.enter("content.delete_translation_from_draft")?;
        let mut state = self.state();
        let content = state
            .versions
            .get_mut(&(content_id, version))
            .ok_or_else(|| PersistenceError::not_found("content version", content_id))?;
        content
            .fields
            .retain(|field| field.language_code != language_code);
        content.version_info.names.remove(language_code);
        state.content(content_id, Some(version), None)
    }
}

#[async_trait]
impl ContentTypeHandler for FakeStorage {
    async fn create_group(&self, input: GroupCreateStruct) -> HandlerResult<ContentTypeGroup> {
        self.enter("content_type.create_group")?;
        let mut state = self.state();
        let group = ContentTypeGroup {
            id: state.allocate_id(),
            identifier: input.identifier,
            creator_id: input.creator_id,
            modifier_id: input.creator_id,
            created: OffsetDateTime::UNIX_EPOCH,
            modified: OffsetDateTime::UNIX_EPOCH,
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, input: GroupUpdateStruct) -> HandlerResult<ContentTypeGroup> {
        self.enter("content_type.update_group")?;
        let mut state = self.state();
        let group = state
            .groups
            .get_mut(&input.id)
            .ok_or_else(|| PersistenceError::not_found("content type group", input.id))?;
        group.identifier = input.identifier;
        group.modifier_id = input.modifier_id;
        Ok(group.clone())
    }

    async fn delete_group(&self, group_id: Id) -> HandlerResult<()> {
        self.enter("content_type.delete_group")?;
        let mut state = self.state();
        if state
            .types
            .values()
            .any(|content_type| content_type.group_ids.contains(&group_id))
        {
            return Err(PersistenceError::bad_state("group still has content types"));
        }
        state
            .groups
            .remove(&group_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("content type group", group_id))
    }

    async fn load_group(&self, group_id: Id) -> HandlerResult<ContentTypeGroup> {
        self.enter("content_type.load_group")?;
        self.state().group(group_id)
    }

    async fn load_groups(&self, group_ids: &[Id]) -> HandlerResult<HashMap<Id, ContentTypeGroup>> {
        self.enter("content_type.load_groups")?;
        let state = self.state();
        Ok(group_ids
            .iter()
            .filter_map(|id| state.groups.get(id).map(|group| (*id, group.clone())))
            .collect())
    }

    async fn load_group_by_identifier(&self, identifier: &str) -> HandlerResult<ContentTypeGroup> {
        self.enter("content_type.load_group_by_identifier")?;
        self.state()
            .groups
            .values()
            .find(|group| group.identifier == identifier)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("content type group", identifier))
    }

    async fn load_all_groups(&self) -> HandlerResult<Vec<ContentTypeGroup>> {
        self.enter("content_type.load_all_groups")?;
        Ok(self.state().groups.values().cloned().collect())
    }

    async fn load_content_types(
        &self,
        group_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<Vec<ContentType>> {
        self.enter("content_type.load_content_types")?;
        let state = self.state();
        let mut types: Vec<ContentType> = state
            .types
            .values()
            .filter(|content_type| {
                content_type.status == status && content_type.group_ids.contains(&group_id)
            })
            .cloned()
            .collect();
        types.sort_by_key(|content_type| content_type.id);
        Ok(types)
    }

    async fn load_content_type_list(
        &self,
        content_type_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, ContentType>> {
        self.enter("content_type.load_content_type_list")?;
        let state = self.state();
        Ok(content_type_ids
            .iter()
            .filter_map(|id| {
                state
                    .content_type(*id, ContentTypeStatus::Defined)
                    .ok()
                    .map(|content_type| (*id, content_type))
            })
            .collect())
    }

    async fn load(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<ContentType> {
        self.enter("content_type.load")?;
        self.state().content_type(content_type_id, status)
    }

    async fn load_by_identifier(&self, identifier: &str) -> HandlerResult<ContentType> {
        self.enter("content_type.load_by_identifier")?;
        self.state()
            .types
            .values()
            .find(|content_type| {
                content_type.status == ContentTypeStatus::Defined
                    && content_type.identifier == identifier
            })
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("content type", identifier))
    }

    async fn load_by_remote_id(&self, remote_id: &str) -> HandlerResult<ContentType> {
        self.enter("content_type.load_by_remote_id")?;
        self.state()
            .types
            .values()
            .find(|content_type| {
                content_type.status == ContentTypeStatus::Defined
                    && content_type.remote_id == remote_id
            })
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("content type", remote_id))
    }

    async fn create(&self, input: ContentTypeCreateStruct) -> HandlerResult<ContentType> {
        self.enter("content_type.create")?;
        let mut state = self.state();
        let content_type = ContentType {
            id: state.allocate_id(),
            status: input.status,
            identifier: input.identifier,
            remote_id: input.remote_id,
            group_ids: input.group_ids,
            names: input.names,
            field_definitions: input.field_definitions,
            is_container: input.is_container,
            default_always_available: false,
            modifier_id: input.creator_id,
            modified: OffsetDateTime::UNIX_EPOCH,
        };
        state
            .types
            .insert((content_type.id, content_type.status), content_type.clone());
        Ok(content_type)
    }

    async fn update(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        input: ContentTypeUpdateStruct,
    ) -> HandlerResult<ContentType> {
        self.enter("content_type.update")?;
        let mut state = self.state();
        let content_type = state
            .types
            .get_mut(&(content_type_id, status))
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))?;
        content_type.identifier = input.identifier;
        content_type.remote_id = input.remote_id;
        content_type.names = input.names;
        content_type.is_container = input.is_container;
        content_type.modifier_id = input.modifier_id;
        Ok(content_type.clone())
    }

    async fn delete(&self, content_type_id: Id, status: ContentTypeStatus) -> HandlerResult<()> {
        self.enter("content_type.delete")?;
        self.state()
            .types
            .remove(&(content_type_id, status))
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))
    }

    async fn create_draft(
        &self,
        modifier_id: Id,
        content_type_id: Id,
    ) -> HandlerResult<ContentType> {
        self.enter("content_type.create_draft")?;
        let mut state = self.state();
        let mut draft = state.content_type(content_type_id, ContentTypeStatus::Defined)?;
        draft.status = ContentTypeStatus::Draft;
        draft.modifier_id = modifier_id;
        state
            .types
            .insert((content_type_id, ContentTypeStatus::Draft), draft.clone());
        Ok(draft)
    }

    async fn copy(
        &self,
        user_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<ContentType> {
        self.enter("content_type.copy")?;
        let mut state = self.state();
        let mut copy = state.content_type(content_type_id, status)?;
        copy.id = state.allocate_id();
        copy.identifier = format!("copy_of_{}", copy.identifier);
        copy.remote_id = format!("copy-of-{}", copy.remote_id);
        copy.modifier_id = user_id;
        state.types.insert((copy.id, copy.status), copy.clone());
        Ok(copy)
    }

    async fn link(
        &self,
        group_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<()> {
        self.enter("content_type.link")?;
        let mut state = self.state();
        let content_type = state
            .types
            .get_mut(&(content_type_id, status))
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))?;
        if !content_type.group_ids.contains(&group_id) {
            content_type.group_ids.push(group_id);
        }
        Ok(())
    }

    async fn unlink(
        &self,
        group_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<()> {
        self.enter("content_type.unlink")?;
        let mut state = self.state();
        let content_type = state
            .types
            .get_mut(&(content_type_id, status))
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))?;
        content_type.group_ids.retain(|id| *id != group_id);
        Ok(())
    }

    async fn get_field_definition(
        &self,
        field_definition_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<FieldDefinition> {
        self.enter("content_type.get_field_definition")?;
        self.state()
            .types
            .values()
            .filter(|content_type| content_type.status == status)
            .flat_map(|content_type| content_type.field_definitions.iter())
            .find(|definition| definition.id == field_definition_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("field definition", field_definition_id))
    }

    async fn get_content_count(&self, content_type_id: Id) -> HandlerResult<u64> {
        self.enter("content_type.get_content_count")?;
        Ok(self
            .state()
            .infos
            .values()
            .filter(|info| info.content_type_id == content_type_id)
            .count() as u64)
    }

    async fn add_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition: FieldDefinition,
    ) -> HandlerResult<FieldDefinition> {
        self.enter("content_type.add_field_definition")?;
        let mut state = self.state();
        let id = state.allocate_id();
        let content_type = state
            .types
            .get_mut(&(content_type_id, status))
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))?;
        let definition = FieldDefinition {
            id,
            ..field_definition
        };
        content_type.field_definitions.push(definition.clone());
        Ok(definition)
    }

    async fn remove_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition_id: Id,
    ) -> HandlerResult<()> {
        self.enter("content_type.remove_field_definition")?;
        let mut state = self.state();
        let content_type = state
            .types
            .get_mut(&(content_type_id, status))
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))?;
        content_type
            .field_definitions
            .retain(|definition| definition.id != field_definition_id);
        Ok(())
    }

    async fn update_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition: FieldDefinition,
    ) -> HandlerResult<()> {
        self.enter("content_type.update_field_definition")?;
        let mut state = self.state();
        let content_type = state
            .types
            .get_mut(&(content_type_id, status))
            .ok_or_else(|| PersistenceError::not_found("content type", content_type_id))?;
        for definition in &mut content_type.field_definitions {
            if definition.id == field_definition.id {
                *definition = field_definition.clone();
            }
        }
        Ok(())
    }

    async fn publish(&self, content_type_id: Id) -> HandlerResult<()> {
        self.enter("content_type.publish")?;
        let mut state = self.state();
        let mut draft = state
            .types
            .remove(&(content_type_id, ContentTypeStatus::Draft))
            .ok_or_else(|| PersistenceError::not_found("content type draft", content_type_id))?;
        draft.status = ContentTypeStatus::Defined;
        state
            .types
            .insert((content_type_id, ContentTypeStatus::Defined), draft);
        Ok(())
    }

    async fn get_searchable_field_map(&self) -> HandlerResult<SearchableFieldMap> {
        self.enter("content_type.get_searchable_field_map")?;
        let state = self.state();
        let mut map = SearchableFieldMap::new();
        for content_type in state
            .types
            .values()
            .filter(|content_type| content_type.status == ContentTypeStatus::Defined)
        {
            let fields: BTreeMap<String, SearchableField> = content_type
                .field_definitions
                .iter()
                .filter(|definition| definition.is_searchable)
                .map(|definition| {
                    (
                        definition.identifier.clone(),
                        SearchableField {
                            field_definition_id: definition.id,
                            field_type: definition.field_type.clone(),
                        },
                    )
                })
                .collect();
            map.insert(content_type.identifier.clone(), fields);
        }
        Ok(map)
    }
}

#[async_trait]
impl LocationHandler for FakeStorage {
    async fn load(
        &self,
        location_id: Id,
        _translations: Option<&[String]>,
        _use_always_available: bool,
    ) -> HandlerResult<Location> {
        self.enter("location.load")?;
        self.state().location(location_id)
    }

    async fn load_list(
        &self,
        location_ids: &[Id],
        _translations: Option<&[String]>,
        _use_always_available: bool,
    ) -> HandlerResult<HashMap<Id, Location>> {
        self.enter("location.load_list")?;
        let state = self.state();
        Ok(location_ids
            .iter()
            .filter_map(|id| state.locations.get(id).map(|location| (*id, location.clone())))
            .collect())
    }

    async fn load_sub_tree_ids(&self, location_id: Id) -> HandlerResult<Vec<Id>> {
        self.enter("location.load_sub_tree_ids")?;
        Ok(self.state().subtree(location_id))
    }

    async fn load_locations_by_content(
        &self,
        content_id: Id,
        root_location_id: Option<Id>,
    ) -> HandlerResult<Vec<Location>> {
        self.enter("location.load_locations_by_content")?;
        Ok(self
            .state()
            .locations
            .values()
            .filter(|location| location.content_id == content_id)
            .filter(|location| root_location_id.is_none_or(|root| location.path().contains(&root)))
            .cloned()
            .collect())
    }

    async fn load_parent_locations_for_draft_content(
        &self,
        content_id: Id,
    ) -> HandlerResult<Vec<Location>> {
        self.enter("location.load_parent_locations_for_draft_content")?;
        let state = self.state();
        let parents: Vec<Id> = state
            .locations
            .values()
            .filter(|location| location.content_id == content_id)
            .map(|location| location.parent_id)
            .collect();
        Ok(parents
            .iter()
            .filter_map(|id| state.locations.get(id).cloned())
            .collect())
    }

    async fn load_by_remote_id(
        &self,
        remote_id: &str,
        _translations: Option<&[String]>,
        _use_always_available: bool,
    ) -> HandlerResult<Location> {
        self.enter("location.load_by_remote_id")?;
        self.state()
            .locations
            .values()
            .find(|location| location.remote_id == remote_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("location", remote_id))
    }

    async fn copy_subtree(
        &self,
        source_id: Id,
        destination_parent_id: Id,
        _new_owner_id: Option<Id>,
    ) -> HandlerResult<Location> {
        self.enter("location.copy_subtree")?;
        let mut state = self.state();
        let source = state.location(source_id)?;
        let parent = state.location(destination_parent_id)?;
        let id = state.allocate_id();
        let copy = Location {
            id,
            parent_id: destination_parent_id,
            remote_id: format!("copy-of-{}", source.remote_id),
            path_string: format!("{}{}/", parent.path_string, id),
            depth: parent.depth + 1,
            ..source
        };
        state.locations.insert(id, copy.clone());
        Ok(copy)
    }

    async fn move_subtree(&self, source_id: Id, destination_parent_id: Id) -> HandlerResult<()> {
        self.enter("location.move_subtree")?;
        self.state().move_location(source_id, destination_parent_id)
    }

    async fn hide(&self, location_id: Id) -> HandlerResult<()> {
        self.enter("location.hide")?;
        self.state()
            .set_subtree_flag(location_id, |location, is_root| {
                if is_root {
                    location.hidden = true;
                }
                location.invisible = true;
            })
    }

    async fn unhide(&self, location_id: Id) -> HandlerResult<()> {
        self.enter("location.unhide")?;
        self.state()
            .set_subtree_flag(location_id, |location, is_root| {
                if is_root {
                    location.hidden = false;
                }
                location.invisible = location.hidden;
            })
    }

    async fn set_invisible(&self, location_id: Id) -> HandlerResult<()> {
        self.enter("location.set_invisible")?;
        self.state()
            .set_subtree_flag(location_id, |location, _| location.invisible = true)
    }

    async fn set_visible(&self, location_id: Id) -> HandlerResult<()> {
        self.enter("location.set_visible")?;
        self.state()
            .set_subtree_flag(location_id, |location, _| location.invisible = location.hidden)
    }

    async fn swap(&self, location_id_a: Id, location_id_b: Id) -> HandlerResult<()> {
        self.enter("location.swap")?;
        let mut state = self.state();
        let a = state.location(location_id_a)?;
        let b = state.location(location_id_b)?;
        if let Some(location) = state.locations.get_mut(&location_id_a) {
            location.content_id = b.content_id;
        }
        if let Some(location) = state.locations.get_mut(&location_id_b) {
            location.content_id = a.content_id;
        }
        Ok(())
    }

    async fn update(&self, input: LocationUpdateStruct, location_id: Id) -> HandlerResult<()> {
        self.enter("location.update")?;
        let mut state = self.state();
        let location = state
            .locations
            .get_mut(&location_id)
            .ok_or_else(|| PersistenceError::not_found("location", location_id))?;
        location.priority = input.priority;
        location.remote_id = input.remote_id;
        location.sort_field = input.sort_field;
        location.sort_order = input.sort_order;
        Ok(())
    }

    async fn create(&self, input: LocationCreateStruct) -> HandlerResult<Location> {
        self.enter("location.create")?;
        let mut state = self.state();
        let parent = state.location(input.parent_id)?;
        let id = state.allocate_id();
        let location = Location {
            id,
            content_id: input.content_id,
            parent_id: input.parent_id,
            remote_id: input.remote_id,
            path_string: format!("{}{}/", parent.path_string, id),
            depth: parent.depth + 1,
            priority: input.priority,
            hidden: input.hidden,
            invisible: input.invisible || parent.invisible,
            sort_field: input.sort_field,
            sort_order: input.sort_order,
        };
        state.locations.insert(id, location.clone());
        if input.is_main_location
            && let Some(info) = state.infos.get_mut(&input.content_id)
        {
            info.main_location_id = Some(id);
        }
        Ok(location)
    }

    async fn remove_subtree(&self, location_id: Id) -> HandlerResult<()> {
        self.enter("location.remove_subtree")?;
        let mut state = self.state();
        state.location(location_id)?;
        for id in state.subtree(location_id) {
            state.locations.remove(&id);
        }
        Ok(())
    }

    async fn change_main_location(&self, content_id: Id, location_id: Id) -> HandlerResult<()> {
        self.enter("location.change_main_location")?;
        let mut state = self.state();
        let info = state
            .infos
            .get_mut(&content_id)
            .ok_or_else(|| PersistenceError::not_found("content", content_id))?;
        info.main_location_id = Some(location_id);
        Ok(())
    }

    async fn count_all_locations(&self) -> HandlerResult<u64> {
        self.enter("location.count_all_locations")?;
        Ok(self.state().locations.len() as u64)
    }
}

#[async_trait]
impl UserHandler for FakeStorage {
    async fn create(&self, user: User) -> HandlerResult<User> {
        self.enter("user.create")?;
        self.state().users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn load(&self, user_id: Id) -> HandlerResult<User> {
        self.enter("user.load")?;
        self.state().user(user_id)
    }

    async fn load_by_login(&self, login: &str) -> HandlerResult<User> {
        self.enter("user.load_by_login")?;
        self.state()
            .users
            .values()
            .find(|user| user.login == login)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("user", login))
    }

    async fn load_users_by_email(&self, email: &str) -> HandlerResult<Vec<User>> {
        self.enter("user.load_users_by_email")?;
        Ok(self
            .state()
            .users
            .values()
            .filter(|user| user.email == email)
            .cloned()
            .collect())
    }

    async fn load_user_by_token(&self, hash: &str) -> HandlerResult<User> {
        self.enter("user.load_user_by_token")?;
        let state = self.state();
        let user_id = state
            .tokens
            .get(hash)
            .copied()
            .ok_or_else(|| PersistenceError::not_found("user token", hash))?;
        state.user(user_id)
    }

    async fn update(&self, user: User) -> HandlerResult<User> {
        self.enter("user.update")?;
        let mut state = self.state();
        if !state.users.contains_key(&user.id) {
            return Err(PersistenceError::not_found("user", user.id));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_token(&self, input: UserTokenUpdateStruct) -> HandlerResult<()> {
        self.enter("user.update_user_token")?;
        let mut state = self.state();
        state.tokens.retain(|_, user_id| *user_id != input.user_id);
        state.tokens.insert(input.hash_key, input.user_id);
        Ok(())
    }

    async fn expire_user_token(&self, hash: &str) -> HandlerResult<()> {
        self.enter("user.expire_user_token")?;
        self.state().tokens.remove(hash);
        Ok(())
    }

    async fn delete(&self, user_id: Id) -> HandlerResult<()> {
        self.enter("user.delete")?;
        let mut state = self.state();
        state
            .users
            .remove(&user_id)
            .ok_or_else(|| PersistenceError::not_found("user", user_id))?;
        state.tokens.retain(|_, id| *id != user_id);
        Ok(())
    }

    async fn create_role(&self, input: RoleCreateStruct) -> HandlerResult<Role> {
        self.enter("user.create_role")?;
        let mut state = self.state();
        let role = Role {
            id: state.allocate_id(),
            identifier: input.identifier,
            policies: input.policies,
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn load_role(&self, role_id: Id) -> HandlerResult<Role> {
        self.enter("user.load_role")?;
        self.state().role(role_id)
    }

    async fn load_role_by_identifier(&self, identifier: &str) -> HandlerResult<Role> {
        self.enter("user.load_role_by_identifier")?;
        self.state()
            .roles
            .values()
            .find(|role| role.identifier == identifier)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("role", identifier))
    }

    async fn load_roles(&self) -> HandlerResult<Vec<Role>> {
        self.enter("user.load_roles")?;
        Ok(self.state().roles.values().cloned().collect())
    }

    async fn update_role(&self, input: RoleUpdateStruct) -> HandlerResult<()> {
        self.enter("user.update_role")?;
        let mut state = self.state();
        let role = state
            .roles
            .get_mut(&input.id)
            .ok_or_else(|| PersistenceError::not_found("role", input.id))?;
        role.identifier = input.identifier;
        Ok(())
    }

    async fn delete_role(&self, role_id: Id) -> HandlerResult<()> {
        self.enter("user.delete_role")?;
        let mut state = self.state();
        state
            .roles
            .remove(&role_id)
            .ok_or_else(|| PersistenceError::not_found("role", role_id))?;
        state
            .assignments
            .retain(|_, assignment| assignment.role_id != role_id);
        Ok(())
    }

    async fn add_policy(&self, role_id: Id, policy: Policy) -> HandlerResult<Policy> {
        self.enter("user.add_policy")?;
        let mut state = self.state();
        let id = state.allocate_id();
        let role = state
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| PersistenceError::not_found("role", role_id))?;
        let policy = Policy {
            id,
            role_id,
            ..policy
        };
        role.policies.push(policy.clone());
        Ok(policy)
    }

    async fn update_policy(&self, policy: Policy) -> HandlerResult<Policy> {
        self.enter("user.update_policy")?;
        let mut state = self.state();
        let role = state
            .roles
            .get_mut(&policy.role_id)
            .ok_or_else(|| PersistenceError::not_found("role", policy.role_id))?;
        let existing = role
            .policies
            .iter_mut()
            .find(|existing| existing.id == policy.id)
            .ok_or_else(|| PersistenceError::not_found("policy", policy.id))?;
        *existing = policy.clone();
        Ok(policy)
    }

    async fn delete_policy(&self, policy_id: Id, role_id: Id) -> HandlerResult<()> {
        self.enter("user.delete_policy")?;
        let mut state = self.state();
        let role = state
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| PersistenceError::not_found("role", role_id))?;
        role.policies.retain(|policy| policy.id != policy_id);
        Ok(())
    }

    async fn load_role_assignment(&self, role_assignment_id: Id) -> HandlerResult<RoleAssignment> {
        self.enter("user.load_role_assignment")?;
        self.state()
            .assignments
            .get(&role_assignment_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("role assignment", role_assignment_id))
    }

    async fn load_role_assignments_by_group_id(
        &self,
        group_id: Id,
        inherit: bool,
    ) -> HandlerResult<Vec<RoleAssignment>> {
        self.enter("user.load_role_assignments_by_group_id")?;
        let state = self.state();
        let mut holders = vec![group_id];
        if inherit {
            holders.extend(state.memberships.get(&group_id).into_iter().flatten().copied());
        }
        Ok(state
            .assignments
            .values()
            .filter(|assignment| holders.contains(&assignment.content_id))
            .cloned()
            .collect())
    }

    async fn load_role_assignments_by_role_id(
        &self,
        role_id: Id,
    ) -> HandlerResult<Vec<RoleAssignment>> {
        self.enter("user.load_role_assignments_by_role_id")?;
        Ok(self
            .state()
            .assignments
            .values()
            .filter(|assignment| assignment.role_id == role_id)
            .cloned()
            .collect())
    }

    async fn assign_role(
        &self,
        content_id: Id,
        role_id: Id,
        limitation: Option<BTreeMap<String, Vec<String>>>,
    ) -> HandlerResult<()> {
        self.enter("user.assign_role")?;
        let mut state = self.state();
        let limitations: Vec<(Option<String>, Vec<String>)> = match limitation {
            Some(limitation) => limitation
                .into_iter()
                .map(|(identifier, values)| (Some(identifier), values))
                .collect(),
            None => vec![(None, Vec::new())],
        };
        for (limitation_identifier, values) in limitations {
            let id = state.allocate_id();
            state.assignments.insert(
                id,
                RoleAssignment {
                    id,
                    role_id,
                    content_id,
                    limitation_identifier,
                    values,
                },
            );
        }
        Ok(())
    }

    async fn remove_role_assignment(&self, role_assignment_id: Id) -> HandlerResult<()> {
        self.enter("user.remove_role_assignment")?;
        self.state()
            .assignments
            .remove(&role_assignment_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("role assignment", role_assignment_id))
    }
}

#[async_trait]
impl SectionHandler for FakeStorage {
    async fn create(&self, name: &str, identifier: &str) -> HandlerResult<Section> {
        self.enter("section.create")?;
        let mut state = self.state();
        let section = Section {
            id: state.allocate_id(),
            identifier: identifier.to_string(),
            name: name.to_string(),
        };
        state.sections.insert(section.id, section.clone());
        Ok(section)
    }

    async fn update(
        &self,
        section_id: Id,
        name: &str,
        identifier: &str,
    ) -> HandlerResult<Section> {
        self.enter("section.update")?;
        let mut state = self.state();
        let section = state
            .sections
            .get_mut(&section_id)
            .ok_or_else(|| PersistenceError::not_found("section", section_id))?;
        section.name = name.to_string();
        section.identifier = identifier.to_string();
        Ok(section.clone())
    }

    async fn load(&self, section_id: Id) -> HandlerResult<Section> {
        self.enter("section.load")?;
        self.state()
            .sections
            .get(&section_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("section", section_id))
    }

    async fn load_all(&self) -> HandlerResult<Vec<Section>> {
        self.enter("section.load_all")?;
        Ok(self.state().sections.values().cloned().collect())
    }

    async fn load_by_identifier(&self, identifier: &str) -> HandlerResult<Section> {
        self.enter("section.load_by_identifier")?;
        self.state()
            .sections
            .values()
            .find(|section| section.identifier == identifier)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("section", identifier))
    }

    async fn delete(&self, section_id: Id) -> HandlerResult<()> {
        self.enter("section.delete")?;
        let mut state = self.state();
        if state.infos.values().any(|info| info.section_id == section_id) {
            return Err(PersistenceError::bad_state("section still has content assigned"));
        }
        state
            .sections
            .remove(&section_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("section", section_id))
    }

    async fn assign(&self, section_id: Id, content_id: Id) -> HandlerResult<()> {
        self.enter("section.assign")?;
        let mut state = self.state();
        let info = state
            .infos
            .get_mut(&content_id)
            .ok_or_else(|| PersistenceError::not_found("content", content_id))?;
        info.section_id = section_id;
        Ok(())
    }

    async fn assignments_count(&self, section_id: Id) -> HandlerResult<u64> {
        self.enter("section.assignments_count")?;
        Ok(self
            .state()
            .infos
            .values()
            .filter(|info| info.section_id == section_id)
            .count() as u64)
    }

    async fn policies_count(&self, _section_id: Id) -> HandlerResult<u64> {
        self.enter("section.policies_count")?;
        Ok(0)
    }

    async fn count_role_assignments_using_section(&self, _section_id: Id) -> HandlerResult<u64> {
        self.enter("section.count_role_assignments_using_section")?;
        Ok(0)
    }
}

#[async_trait]
impl ObjectStateHandler for FakeStorage {
    async fn create_group(&self, input: InputStruct) -> HandlerResult<ObjectStateGroup> {
        self.enter("object_state.create_group")?;
        let mut state = self.state();
        let group = ObjectStateGroup {
            id: state.allocate_id(),
            identifier: input.identifier,
            default_language_code: input.default_language_code.clone(),
            language_codes: vec![input.default_language_code],
            names: input.names,
        };
        state.state_groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn load_group(&self, group_id: Id) -> HandlerResult<ObjectStateGroup> {
        self.enter("object_state.load_group")?;
        self.state().state_group(group_id)
    }

    async fn load_group_by_identifier(&self, identifier: &str) -> HandlerResult<ObjectStateGroup> {
        self.enter("object_state.load_group_by_identifier")?;
        self.state()
            .state_groups
            .values()
            .find(|group| group.identifier == identifier)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("object state group", identifier))
    }

    async fn load_all_groups(
        &self,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<ObjectStateGroup>> {
        self.enter("object_state.load_all_groups")?;
        let groups: Vec<ObjectStateGroup> = self.state().state_groups.values().cloned().collect();
        Ok(page(&groups, offset, limit))
    }

    async fn load_object_states(&self, group_id: Id) -> HandlerResult<Vec<ObjectState>> {
        self.enter("object_state.load_object_states")?;
        let mut states: Vec<ObjectState> = self
            .state()
            .states
            .values()
            .filter(|state| state.group_id == group_id)
            .cloned()
            .collect();
        states.sort_by_key(|state| state.priority);
        Ok(states)
    }

    async fn update_group(
        &self,
        group_id: Id,
        input: InputStruct,
    ) -> HandlerResult<ObjectStateGroup> {
        self.enter("object_state.update_group")?;
        let mut state = self.state();
        let group = state
            .state_groups
            .get_mut(&group_id)
            .ok_or_else(|| PersistenceError::not_found("object state group", group_id))?;
        group.identifier = input.identifier;
        group.default_language_code = input.default_language_code;
        group.names = input.names;
        Ok(group.clone())
    }

    async fn delete_group(&self, group_id: Id) -> HandlerResult<()> {
        self.enter("object_state.delete_group")?;
        let mut state = self.state();
        state
            .state_groups
            .remove(&group_id)
            .ok_or_else(|| PersistenceError::not_found("object state group", group_id))?;
        state.states.retain(|_, object_state| object_state.group_id != group_id);
        state.content_states.retain(|(_, group), _| *group != group_id);
        Ok(())
    }

    async fn create(&self, group_id: Id, input: InputStruct) -> HandlerResult<ObjectState> {
        self.enter("object_state.create")?;
        let mut state = self.state();
        state.state_group(group_id)?;
        let priority = state
            .states
            .values()
            .filter(|object_state| object_state.group_id == group_id)
            .count() as i32;
        let object_state = ObjectState {
            id: state.allocate_id(),
            group_id,
            identifier: input.identifier,
            priority,
            default_language_code: input.default_language_code,
            names: input.names,
        };
        state.states.insert(object_state.id, object_state.clone());
        Ok(object_state)
    }

    async fn load(&self, state_id: Id) -> HandlerResult<ObjectState> {
        self.enter("object_state.load")?;
        self.state().object_state(state_id)
    }

    async fn load_by_identifier(
        &self,
        identifier: &str,
        group_id: Id,
    ) -> HandlerResult<ObjectState> {
        self.enter("object_state.load_by_identifier")?;
        self.state()
            .states
            .values()
            .find(|state| state.group_id == group_id && state.identifier == identifier)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("object state", identifier))
    }

    async fn update(&self, state_id: Id, input: InputStruct) -> HandlerResult<ObjectState> {
        self.enter("object_state.update")?;
        let mut state = self.state();
        let object_state = state
            .states
            .get_mut(&state_id)
            .ok_or_else(|| PersistenceError::not_found("object state", state_id))?;
        object_state.identifier = input.identifier;
        object_state.default_language_code = input.default_language_code;
        object_state.names = input.names;
        Ok(object_state.clone())
    }

    async fn set_priority(&self, state_id: Id, priority: i32) -> HandlerResult<()> {
        self.enter("object_state.set_priority")?;
        let mut state = self.state();
        let object_state = state
            .states
            .get_mut(&state_id)
            .ok_or_else(|| PersistenceError::not_found("object state", state_id))?;
        object_state.priority = priority;
        Ok(())
    }

    async fn delete(&self, state_id: Id) -> HandlerResult<()> {
        self.enter("object_state.delete")?;
        let mut state = self.state();
        state
            .states
            .remove(&state_id)
            .ok_or_else(|| PersistenceError::not_found("object state", state_id))?;
        state.content_states.retain(|_, assigned| *assigned != state_id);
        Ok(())
    }

    async fn set_content_state(
        &self,
        content_id: Id,
        group_id: Id,
        state_id: Id,
    ) -> HandlerResult<bool> {
        self.enter("object_state.set_content_state")?;
        self.state()
            .content_states
            .insert((content_id, group_id), state_id);
        Ok(true)
    }

    async fn get_content_state(&self, content_id: Id, group_id: Id) -> HandlerResult<ObjectState> {
        self.enter("object_state.get_content_state")?;
        let state = self.state();
        let state_id = state
            .content_states
            .get(&(content_id, group_id))
            .copied()
            .ok_or_else(|| PersistenceError::not_found("content state", content_id))?;
        state.object_state(state_id)
    }

    async fn get_content_count(&self, state_id: Id) -> HandlerResult<u64> {
        self.enter("object_state.get_content_count")?;
        Ok(self
            .state()
            .content_states
            .values()
            .filter(|assigned| **assigned == state_id)
            .count() as u64)
    }
}

#[async_trait]
impl TrashHandler for FakeStorage {
    async fn load_trash_item(&self, trash_item_id: Id) -> HandlerResult<Trashed> {
        self.enter("trash.load_trash_item")?;
        self.state()
            .trash
            .get(&trash_item_id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("trash item", trash_item_id))
    }

    async fn trash_subtree(&self, location_id: Id) -> HandlerResult<Option<Trashed>> {
        self.enter("trash.trash_subtree")?;
        let mut state = self.state();
        state.location(location_id)?;
        let mut trashed_root = None;
        for id in state.subtree(location_id) {
            if let Some(location) = state.locations.remove(&id) {
                let trashed = Trashed {
                    location,
                    trashed: OffsetDateTime::UNIX_EPOCH,
                };
                if id == location_id {
                    trashed_root = Some(trashed.clone());
                }
                state.trash.insert(id, trashed);
            }
        }
        Ok(trashed_root)
    }

    async fn recover(&self, trashed_id: Id, new_parent_id: Option<Id>) -> HandlerResult<Id> {
        self.enter("trash.recover")?;
        let mut state = self.state();
        let trashed = state
            .trash
            .remove(&trashed_id)
            .ok_or_else(|| PersistenceError::not_found("trash item", trashed_id))?;
        let parent_id = new_parent_id.unwrap_or(trashed.location.parent_id);
        let parent = state.location(parent_id)?;
        let id = state.allocate_id();
        let location = Location {
            id,
            parent_id,
            path_string: format!("{}{}/", parent.path_string, id),
            depth: parent.depth + 1,
            ..trashed.location
        };
        state.locations.insert(id, location);
        Ok(id)
    }

    async fn find_trash_items(
        &self,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<TrashResult> {
        self.enter("trash.find_trash_items")?;
        let items: Vec<Trashed> = self.state().trash.values().cloned().collect();
        Ok(TrashResult {
            total_count: items.len(),
            items: page(&items, offset, limit),
        })
    }

    async fn empty_trash(&self) -> HandlerResult<TrashItemDeleteResultList> {
        self.enter("trash.empty_trash")?;
        let mut state = self.state();
        let items = std::mem::take(&mut state.trash)
            .into_values()
            .map(|trashed| TrashItemDeleteResult {
                trash_item_id: trashed.id(),
                content_id: trashed.content_id(),
                content_removed: state.infos.remove(&trashed.content_id()).is_some(),
            })
            .collect();
        Ok(TrashItemDeleteResultList { items })
    }

    async fn delete_trash_item(&self, trashed_id: Id) -> HandlerResult<TrashItemDeleteResult> {
        self.enter("trash.delete_trash_item")?;
        let mut state = self.state();
        let trashed = state
            .trash
            .remove(&trashed_id)
            .ok_or_else(|| PersistenceError::not_found("trash item", trashed_id))?;
        let content_removed = state.infos.remove(&trashed.content_id()).is_some();
        Ok(TrashItemDeleteResult {
            trash_item_id: trashed_id,
            content_id: trashed.content_id(),
            content_removed,
        })
    }
}

#[async_trait]
impl UrlAliasHandler for FakeStorage {
    async fn publish_url_alias_for_location(
        &self,
        location_id: Id,
        _parent_location_id: Id,
        name: &str,
        language_code: &str,
        always_available: bool,
        _update_path_identification_string: bool,
    ) -> HandlerResult<()> {
        self.enter("url_alias.publish_url_alias_for_location")?;
        let mut state = self.state();
        let path = format!("/{}", name.to_lowercase().replace(' ', "-"));
        for alias in state
            .aliases
            .iter_mut()
            .filter(|alias| alias.location_id == Some(location_id) && !alias.is_custom)
        {
            alias.is_history = true;
        }
        state.aliases.push(UrlAlias {
            id: format!("0-{}", fixtures::alias_hash(&path)),
            alias_type: UrlAliasType::Location,
            location_id: Some(location_id),
            resource: None,
            path,
            language_codes: vec![language_code.to_string()],
            always_available,
            is_history: false,
            is_custom: false,
            forward: false,
        });
        Ok(())
    }

    async fn create_custom_url_alias(
        &self,
        location_id: Id,
        path: &str,
        forwarding: bool,
        language_code: Option<&str>,
        always_available: bool,
    ) -> HandlerResult<UrlAlias> {
        self.enter("url_alias.create_custom_url_alias")?;
        let alias = UrlAlias {
            id: format!("2-{}", fixtures::alias_hash(path)),
            alias_type: UrlAliasType::Location,
            location_id: Some(location_id),
            resource: None,
            path: path.to_string(),
            language_codes: language_code.map(str::to_string).into_iter().collect(),
            always_available,
            is_history: false,
            is_custom: true,
            forward: forwarding,
        };
        self.state().aliases.push(alias.clone());
        Ok(alias)
    }

    async fn create_global_url_alias(
        &self,
        resource: &str,
        path: &str,
        forwarding: bool,
        language_code: Option<&str>,
        always_available: bool,
    ) -> HandlerResult<UrlAlias> {
        self.enter("url_alias.create_global_url_alias")?;
        let alias = UrlAlias {
            id: format!("0-{}", fixtures::alias_hash(path)),
            alias_type: UrlAliasType::Resource,
            location_id: None,
            resource: Some(resource.to_string()),
            path: path.to_string(),
            language_codes: language_code.map(str::to_string).into_iter().collect(),
            always_available,
            is_history: false,
            is_custom: true,
            forward: forwarding,
        };
        self.state().aliases.push(alias.clone());
        Ok(alias)
    }

    async fn list_global_url_aliases(
        &self,
        language_code: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<UrlAlias>> {
        self.enter("url_alias.list_global_url_aliases")?;
        let aliases: Vec<UrlAlias> = self
            .state()
            .aliases
            .iter()
            .filter(|alias| alias.alias_type != UrlAliasType::Location)
            .filter(|alias| {
                language_code.is_none_or(|code| alias.language_codes.iter().any(|c| c == code))
            })
            .cloned()
            .collect();
        Ok(page(&aliases, offset, limit))
    }

    async fn list_url_aliases_for_location(
        &self,
        location_id: Id,
        custom: bool,
    ) -> HandlerResult<Vec<UrlAlias>> {
        self.enter("url_alias.list_url_aliases_for_location")?;
        Ok(self
            .state()
            .aliases
            .iter()
            .filter(|alias| alias.location_id == Some(location_id) && alias.is_custom == custom)
            .cloned()
            .collect())
    }

    async fn remove_url_aliases(&self, url_aliases: &[UrlAlias]) -> HandlerResult<bool> {
        self.enter("url_alias.remove_url_aliases")?;
        let mut state = self.state();
        let before = state.aliases.len();
        state
            .aliases
            .retain(|alias| !url_aliases.iter().any(|removed| removed.id == alias.id));
        Ok(state.aliases.len() != before)
    }

    async fn lookup(&self, url: &str) -> HandlerResult<UrlAlias> {
        self.enter("url_alias.lookup")?;
        self.state()
            .aliases
            .iter()
            .find(|alias| alias.path == url)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("url alias", url))
    }

    async fn load_url_alias(&self, id: &str) -> HandlerResult<UrlAlias> {
        self.enter("url_alias.load_url_alias")?;
        self.state()
            .aliases
            .iter()
            .find(|alias| alias.id == id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("url alias", id))
    }

    async fn location_moved(
        &self,
        _location_id: Id,
        _old_parent_id: Id,
        _new_parent_id: Id,
    ) -> HandlerResult<()> {
        self.enter("url_alias.location_moved")?;
        Ok(())
    }

    async fn location_copied(
        &self,
        location_id: Id,
        new_location_id: Id,
        _new_parent_id: Id,
    ) -> HandlerResult<()> {
        self.enter("url_alias.location_copied")?;
        let mut state = self.state();
        let copies: Vec<UrlAlias> = state
            .aliases
            .iter()
            .filter(|alias| alias.location_id == Some(location_id) && !alias.is_history)
            .map(|alias| UrlAlias {
                id: format!("{}-copy-{new_location_id}", alias.id),
                location_id: Some(new_location_id),
                path: format!("{}-{new_location_id}", alias.path),
                ..alias.clone()
            })
            .collect();
        state.aliases.extend(copies);
        Ok(())
    }

    async fn location_deleted(&self, location_id: Id) -> HandlerResult<Vec<UrlAlias>> {
        self.enter("url_alias.location_deleted")?;
        let mut state = self.state();
        let (removed, kept): (Vec<UrlAlias>, Vec<UrlAlias>) = std::mem::take(&mut state.aliases)
            .into_iter()
            .partition(|alias| alias.location_id == Some(location_id));
        state.aliases = kept;
        Ok(removed)
    }

    async fn location_swapped(
        &self,
        location_id_a: Id,
        _parent_location_id_a: Id,
        location_id_b: Id,
        _parent_location_id_b: Id,
    ) -> HandlerResult<()> {
        self.enter("url_alias.location_swapped")?;
        for alias in self.state().aliases.iter_mut() {
            if alias.location_id == Some(location_id_a) {
                alias.location_id = Some(location_id_b);
            } else if alias.location_id == Some(location_id_b) {
                alias.location_id = Some(location_id_a);
            }
        }
        Ok(())
    }

    async fn translation_removed(
        &self,
        location_ids: &[Id],
        language_code: &str,
    ) -> HandlerResult<()> {
        self.enter("url_alias.translation_removed")?;
        for alias in self.state().aliases.iter_mut() {
            if alias
                .location_id
                .is_some_and(|id| location_ids.contains(&id))
            {
                alias.language_codes.retain(|code| code != language_code);
            }
        }
        Ok(())
    }

    async fn archive_url_aliases_for_deleted_translations(
        &self,
        location_id: Id,
        _parent_location_id: Id,
        language_codes: &[String],
    ) -> HandlerResult<()> {
        self.enter("url_alias.archive_url_aliases_for_deleted_translations")?;
        for alias in self.state().aliases.iter_mut() {
            if alias.location_id == Some(location_id)
                && !alias
                    .language_codes
                    .iter()
                    .any(|code| language_codes.contains(code))
            {
                alias.is_history = true;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UrlWildcardHandler for FakeStorage {
    async fn create(
        &self,
        source_url: &str,
        destination_url: &str,
        forward: bool,
    ) -> HandlerResult<UrlWildcard> {
        self.enter("url_wildcard.create")?;
        let mut state = self.state();
        let wildcard = UrlWildcard {
            id: state.allocate_id(),
            source_url: source_url.to_string(),
            destination_url: destination_url.to_string(),
            forward,
        };
        state.wildcards.insert(wildcard.id, wildcard.clone());
        Ok(wildcard)
    }

    async fn update(
        &self,
        id: Id,
        source_url: &str,
        destination_url: &str,
        forward: bool,
    ) -> HandlerResult<UrlWildcard> {
        self.enter("url_wildcard.update")?;
        let mut state = self.state();
        let wildcard = state
            .wildcards
            .get_mut(&id)
            .ok_or_else(|| PersistenceError::not_found("url wildcard", id))?;
        wildcard.source_url = source_url.to_string();
        wildcard.destination_url = destination_url.to_string();
        wildcard.forward = forward;
        Ok(wildcard.clone())
    }

    async fn remove(&self, id: Id) -> HandlerResult<()> {
        self.enter("url_wildcard.remove")?;
        self.state()
            .wildcards
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("url wildcard", id))
    }

    async fn load(&self, id: Id) -> HandlerResult<UrlWildcard> {
        self.enter("url_wildcard.load")?;
        self.state()
            .wildcards
            .get(&id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("url wildcard", id))
    }

    async fn load_all(&self, offset: usize, limit: Option<usize>) -> HandlerResult<Vec<UrlWildcard>> {
        self.enter("url_wildcard.load_all")?;
        let wildcards: Vec<UrlWildcard> = self.state().wildcards.values().cloned().collect();
        Ok(page(&wildcards, offset, limit))
    }

    async fn translate(&self, source_url: &str) -> HandlerResult<UrlWildcard> {
        self.enter("url_wildcard.translate")?;
        self.state()
            .wildcards
            .values()
            .find(|wildcard| match wildcard.source_url.strip_suffix('*') {
                Some(prefix) => source_url.starts_with(prefix),
                None => wildcard.source_url == source_url,
            })
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("url wildcard", source_url))
    }

    async fn exact_source_url_exists(&self, source_url: &str) -> HandlerResult<bool> {
        self.enter("url_wildcard.exact_source_url_exists")?;
        Ok(self
            .state()
            .wildcards
            .values()
            .any(|wildcard| wildcard.source_url == source_url))
    }

    async fn count_all(&self) -> HandlerResult<u64> {
        self.enter("url_wildcard.count_all")?;
        Ok(self.state().wildcards.len() as u64)
    }
}

#[async_trait]
impl LanguageHandler for FakeStorage {
    async fn create(&self, input: LanguageCreateStruct) -> HandlerResult<Language> {
        self.enter("language.create")?;
        let mut state = self.state();
        if state.language_by_code(&input.language_code).is_ok() {
            return Err(PersistenceError::conflict(format!(
                "language `{}` already exists",
                input.language_code
            )));
        }
        let language = Language {
            id: state.allocate_id(),
            language_code: input.language_code,
            name: input.name,
            is_enabled: input.is_enabled,
        };
        state.languages.insert(language.id, language.clone());
        Ok(language)
    }

    async fn update(&self, language: Language) -> HandlerResult<()> {
        self.enter("language.update")?;
        let mut state = self.state();
        state.language(language.id)?;
        state.languages.insert(language.id, language);
        Ok(())
    }

    async fn load(&self, language_id: Id) -> HandlerResult<Language> {
        self.enter("language.load")?;
        self.state().language(language_id)
    }

    async fn load_list(&self, language_ids: &[Id]) -> HandlerResult<HashMap<Id, Language>> {
        self.enter("language.load_list")?;
        let state = self.state();
        Ok(language_ids
            .iter()
            .filter_map(|id| state.languages.get(id).map(|language| (*id, language.clone())))
            .collect())
    }

    async fn load_by_language_code(&self, language_code: &str) -> HandlerResult<Language> {
        self.enter("language.load_by_language_code")?;
        self.state().language_by_code(language_code)
    }

    async fn load_list_by_language_codes(
        &self,
        language_codes: &[String],
    ) -> HandlerResult<HashMap<String, Language>> {
        self.enter("language.load_list_by_language_codes")?;
        let state = self.state();
        Ok(language_codes
            .iter()
            .filter_map(|code| {
                state
                    .language_by_code(code)
                    .ok()
                    .map(|language| (code.clone(), language))
            })
            .collect())
    }

    async fn load_all(&self) -> HandlerResult<Vec<Language>> {
        self.enter("language.load_all")?;
        Ok(self.state().languages.values().cloned().collect())
    }

    async fn delete(&self, language_id: Id) -> HandlerResult<()> {
        self.enter("language.delete")?;
        self.state()
            .languages
            .remove(&language_id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("language", language_id))
    }
}

#[async_trait]
impl TransactionHandler for FakeStorage {
    async fn begin_transaction(&self) -> HandlerResult<()> {
        self.enter("transaction.begin_transaction")?;
        self.state().transaction_depth += 1;
        Ok(())
    }

    async fn commit(&self) -> HandlerResult<()> {
        self.enter("transaction.commit")?;
        let mut state = self.state();
        if state.transaction_depth == 0 {
            return Err(PersistenceError::bad_state("no transaction to commit"));
        }
        state.transaction_depth -= 1;
        Ok(())
    }

    async fn rollback(&self) -> HandlerResult<()> {
        self.enter("transaction.rollback")?;
        let mut state = self.state();
        if state.transaction_depth == 0 {
            return Err(PersistenceError::bad_state("no transaction to roll back"));
        }
        state.transaction_depth = 0;
        Ok(())
    }
}

//! Persistence handler traits.
//!
//! One trait per domain. Storage-backed implementations live outside this
//! crate; the cache layer implements the same traits by decoration.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::domain::content::{
    Content, ContentInfo, CreateStruct, MetadataUpdateStruct, Relation, RelationCreateStruct,
    RelationType, UpdateStruct, VersionInfo, VersionStatus,
};
use crate::domain::content_type::{
    ContentType, ContentTypeCreateStruct, ContentTypeGroup, ContentTypeStatus,
    ContentTypeUpdateStruct, FieldDefinition, GroupCreateStruct, GroupUpdateStruct,
    SearchableFieldMap,
};
use crate::domain::error::PersistenceError;
use crate::domain::language::{Language, LanguageCreateStruct};
use crate::domain::location::{Location, LocationCreateStruct, LocationUpdateStruct};
use crate::domain::object_state::{InputStruct, ObjectState, ObjectStateGroup};
use crate::domain::section::Section;
use crate::domain::trash::{TrashItemDeleteResult, TrashItemDeleteResultList, TrashResult, Trashed};
use crate::domain::url_alias::UrlAlias;
use crate::domain::url_wildcard::UrlWildcard;
use crate::domain::user::{
    Policy, Role, RoleAssignment, RoleCreateStruct, RoleUpdateStruct, User, UserTokenUpdateStruct,
};
use crate::domain::{Id, VersionNo};

pub type HandlerResult<T> = Result<T, PersistenceError>;

#[async_trait]
pub trait ContentHandler: Send + Sync {
    async fn create(&self, input: CreateStruct) -> HandlerResult<Content>;

    async fn create_draft_from_version(
        &self,
        content_id: Id,
        src_version: VersionNo,
        user_id: Id,
        language_code: Option<String>,
    ) -> HandlerResult<Content>;

    /// `version: None` loads the current version; `translations: None` loads all.
    async fn load(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        translations: Option<&[String]>,
    ) -> HandlerResult<Content>;

    /// Ids that cannot be loaded are left out of the map.
    async fn load_content_list(
        &self,
        content_ids: &[Id],
        translations: Option<&[String]>,
    ) -> HandlerResult<HashMap<Id, Content>>;

    async fn load_content_info(&self, content_id: Id) -> HandlerResult<ContentInfo>;

    async fn load_content_info_list(
        &self,
        content_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, ContentInfo>>;

    async fn load_content_info_by_remote_id(&self, remote_id: &str) -> HandlerResult<ContentInfo>;

    async fn load_version_info(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
    ) -> HandlerResult<VersionInfo>;

    async fn load_version_info_list(
        &self,
        content_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, VersionInfo>>;

    async fn list_versions(
        &self,
        content_id: Id,
        status: Option<VersionStatus>,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<VersionInfo>>;

    async fn set_status(
        &self,
        content_id: Id,
        status: VersionStatus,
        version: VersionNo,
    ) -> HandlerResult<bool>;

    async fn update_metadata(
        &self,
        content_id: Id,
        input: MetadataUpdateStruct,
    ) -> HandlerResult<ContentInfo>;

    async fn update_content(
        &self,
        content_id: Id,
        version: VersionNo,
        input: UpdateStruct,
    ) -> HandlerResult<Content>;

    async fn delete_content(&self, content_id: Id) -> HandlerResult<()>;

    async fn delete_version(&self, content_id: Id, version: VersionNo) -> HandlerResult<()>;

    async fn publish(
        &self,
        content_id: Id,
        version: VersionNo,
        input: MetadataUpdateStruct,
    ) -> HandlerResult<Content>;

    async fn copy(
        &self,
        content_id: Id,
        version: Option<VersionNo>,
        new_owner_id: Option<Id>,
    ) -> HandlerResult<Content>;

    async fn load_relation(&self, relation_id: Id) -> HandlerResult<Relation>;

    async fn count_relations(
        &self,
        source_content_id: Id,
        version: Option<VersionNo>,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<u64>;

    async fn load_relation_list(
        &self,
        source_content_id: Id,
        limit: Option<usize>,
        offset: Option<usize>,
        version: Option<VersionNo>,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<Vec<Relation>>;

    async fn count_reverse_relations(
        &self,
        destination_content_id: Id,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<u64>;

    async fn load_reverse_relations(
        &self,
        destination_content_id: Id,
        relation_type: Option<RelationType>,
    ) -> HandlerResult<Vec<Relation>>;

    async fn add_relation(&self, input: RelationCreateStruct) -> HandlerResult<Relation>;

    async fn remove_relation(
        &self,
        relation_id: Id,
        relation_type: RelationType,
        destination_content_id: Option<Id>,
    ) -> HandlerResult<()>;

    async fn remove_translation_from_content(
        &self,
        content_id: Id,
        language_code: &str,
    ) -> HandlerResult<()>;

    async fn delete_translation_from_draft(
        &self,
        content_id: Id,
        version: VersionNo,
        language_code: &str,
    ) -> HandlerResult<Content>;
}

#[async_trait]
pub trait ContentTypeHandler: Send + Sync {
    async fn create_group(&self, input: GroupCreateStruct) -> HandlerResult<ContentTypeGroup>;

    async fn update_group(&self, input: GroupUpdateStruct) -> HandlerResult<ContentTypeGroup>;

    async fn delete_group(&self, group_id: Id) -> HandlerResult<()>;

    async fn load_group(&self, group_id: Id) -> HandlerResult<ContentTypeGroup>;

    async fn load_groups(&self, group_ids: &[Id]) -> HandlerResult<HashMap<Id, ContentTypeGroup>>;

    async fn load_group_by_identifier(&self, identifier: &str) -> HandlerResult<ContentTypeGroup>;

    async fn load_all_groups(&self) -> HandlerResult<Vec<ContentTypeGroup>>;

    async fn load_content_types(
        &self,
        group_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<Vec<ContentType>>;

    async fn load_content_type_list(
        &self,
        content_type_ids: &[Id],
    ) -> HandlerResult<HashMap<Id, ContentType>>;

    async fn load(&self, content_type_id: Id, status: ContentTypeStatus)
    -> HandlerResult<ContentType>;

    async fn load_by_identifier(&self, identifier: &str) -> HandlerResult<ContentType>;

    async fn load_by_remote_id(&self, remote_id: &str) -> HandlerResult<ContentType>;

    async fn create(&self, input: ContentTypeCreateStruct) -> HandlerResult<ContentType>;

    async fn update(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        input: ContentTypeUpdateStruct,
    ) -> HandlerResult<ContentType>;

    async fn delete(&self, content_type_id: Id, status: ContentTypeStatus) -> HandlerResult<()>;

    async fn create_draft(&self, modifier_id: Id, content_type_id: Id)
    -> HandlerResult<ContentType>;

    async fn copy(
        &self,
        user_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<ContentType>;

    async fn link(
        &self,
        group_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<()>;

    async fn unlink(
        &self,
        group_id: Id,
        content_type_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<()>;

    async fn get_field_definition(
        &self,
        field_definition_id: Id,
        status: ContentTypeStatus,
    ) -> HandlerResult<FieldDefinition>;

    async fn get_content_count(&self, content_type_id: Id) -> HandlerResult<u64>;

    async fn add_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition: FieldDefinition,
    ) -> HandlerResult<FieldDefinition>;

    async fn remove_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition_id: Id,
    ) -> HandlerResult<()>;

    async fn update_field_definition(
        &self,
        content_type_id: Id,
        status: ContentTypeStatus,
        field_definition: FieldDefinition,
    ) -> HandlerResult<()>;

    /// Promotes the draft of `content_type_id` to defined.
    async fn publish(&self, content_type_id: Id) -> HandlerResult<()>;

    async fn get_searchable_field_map(&self) -> HandlerResult<SearchableFieldMap>;
}

#[async_trait]
pub trait LocationHandler: Send + Sync {
    async fn load(
        &self,
        location_id: Id,
        translations: Option<&[String]>,
        use_always_available: bool,
    ) -> HandlerResult<Location>;

    async fn load_list(
        &self,
        location_ids: &[Id],
        translations: Option<&[String]>,
        use_always_available: bool,
    ) -> HandlerResult<HashMap<Id, Location>>;

    /// Ids of `location_id` and every location below it.
    async fn load_sub_tree_ids(&self, location_id: Id) -> HandlerResult<Vec<Id>>;

    async fn load_locations_by_content(
        &self,
        content_id: Id,
        root_location_id: Option<Id>,
    ) -> HandlerResult<Vec<Location>>;

    async fn load_parent_locations_for_draft_content(
        &self,
        content_id: Id,
    ) -> HandlerResult<Vec<Location>>;

    async fn load_by_remote_id(
        &self,
        remote_id: &str,
        translations: Option<&[String]>,
        use_always_available: bool,
    ) -> HandlerResult<Location>;

    async fn copy_subtree(
        &self,
        source_id: Id,
        destination_parent_id: Id,
        new_owner_id: Option<Id>,
    ) -> HandlerResult<Location>;

    async fn move_subtree(&self, source_id: Id, destination_parent_id: Id) -> HandlerResult<()>;

    async fn hide(&self, location_id: Id) -> HandlerResult<()>;

    async fn unhide(&self, location_id: Id) -> HandlerResult<()>;

    async fn set_invisible(&self, location_id: Id) -> HandlerResult<()>;

    async fn set_visible(&self, location_id: Id) -> HandlerResult<()>;

    async fn swap(&self, location_id_a: Id, location_id_b: Id) -> HandlerResult<()>;

    async fn update(&self, input: LocationUpdateStruct, location_id: Id) -> HandlerResult<()>;

    async fn create(&self, input: LocationCreateStruct) -> HandlerResult<Location>;

    async fn remove_subtree(&self, location_id: Id) -> HandlerResult<()>;

    async fn change_main_location(&self, content_id: Id, location_id: Id) -> HandlerResult<()>;

    async fn count_all_locations(&self) -> HandlerResult<u64>;
}

#[async_trait]
pub trait UserHandler: Send + Sync {
    async fn create(&self, user: User) -> HandlerResult<User>;

    async fn load(&self, user_id: Id) -> HandlerResult<User>;

    async fn load_by_login(&self, login: &str) -> HandlerResult<User>;

    async fn load_users_by_email(&self, email: &str) -> HandlerResult<Vec<User>>;

    async fn load_user_by_token(&self, hash: &str) -> HandlerResult<User>;

    async fn update(&self, user: User) -> HandlerResult<User>;

    async fn update_user_token(&self, input: UserTokenUpdateStruct) -> HandlerResult<()>;

    async fn expire_user_token(&self, hash: &str) -> HandlerResult<()>;

    async fn delete(&self, user_id: Id) -> HandlerResult<()>;

    async fn create_role(&self, input: RoleCreateStruct) -> HandlerResult<Role>;

    async fn load_role(&self, role_id: Id) -> HandlerResult<Role>;

    async fn load_role_by_identifier(&self, identifier: &str) -> HandlerResult<Role>;

    async fn load_roles(&self) -> HandlerResult<Vec<Role>>;

    async fn update_role(&self, input: RoleUpdateStruct) -> HandlerResult<()>;

    async fn delete_role(&self, role_id: Id) -> HandlerResult<()>;

    async fn add_policy(&self, role_id: Id, policy: Policy) -> HandlerResult<Policy>;

    async fn update_policy(&self, policy: Policy) -> HandlerResult<Policy>;

    async fn delete_policy(&self, policy_id: Id, role_id: Id) -> HandlerResult<()>;

    async fn load_role_assignment(&self, role_assignment_id: Id) -> HandlerResult<RoleAssignment>;

    /// With `inherit`, assignments of the groups `group_id` belongs to are included.
    async fn load_role_assignments_by_group_id(
        &self,
        group_id: Id,
        inherit: bool,
    ) -> HandlerResult<Vec<RoleAssignment>>;

    async fn load_role_assignments_by_role_id(
        &self,
        role_id: Id,
    ) -> HandlerResult<Vec<RoleAssignment>>;

    async fn assign_role(
        &self,
        content_id: Id,
        role_id: Id,
        limitation: Option<BTreeMap<String, Vec<String>>>,
    ) -> HandlerResult<()>;

    async fn remove_role_assignment(&self, role_assignment_id: Id) -> HandlerResult<()>;
}

#[async_trait]
pub trait SectionHandler: Send + Sync {
    async fn create(&self, name: &str, identifier: &str) -> HandlerResult<Section>;

    async fn update(&self, section_id: Id, name: &str, identifier: &str)
    -> HandlerResult<Section>;

    async fn load(&self, section_id: Id) -> HandlerResult<Section>;

    async fn load_all(&self) -> HandlerResult<Vec<Section>>;

    async fn load_by_identifier(&self, identifier: &str) -> HandlerResult<Section>;

    async fn delete(&self, section_id: Id) -> HandlerResult<()>;

    async fn assign(&self, section_id: Id, content_id: Id) -> HandlerResult<()>;

    async fn assignments_count(&self, section_id: Id) -> HandlerResult<u64>;

    async fn policies_count(&self, section_id: Id) -> HandlerResult<u64>;

    async fn count_role_assignments_using_section(&self, section_id: Id) -> HandlerResult<u64>;
}

#[async_trait]
pub trait ObjectStateHandler: Send + Sync {
    async fn create_group(&self, input: InputStruct) -> HandlerResult<ObjectStateGroup>;

    async fn load_group(&self, group_id: Id) -> HandlerResult<ObjectStateGroup>;

    async fn load_group_by_identifier(&self, identifier: &str) -> HandlerResult<ObjectStateGroup>;

    async fn load_all_groups(
        &self,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<ObjectStateGroup>>;

    async fn load_object_states(&self, group_id: Id) -> HandlerResult<Vec<ObjectState>>;

    async fn update_group(&self, group_id: Id, input: InputStruct)
    -> HandlerResult<ObjectStateGroup>;

    async fn delete_group(&self, group_id: Id) -> HandlerResult<()>;

    async fn create(&self, group_id: Id, input: InputStruct) -> HandlerResult<ObjectState>;

    async fn load(&self, state_id: Id) -> HandlerResult<ObjectState>;

    async fn load_by_identifier(&self, identifier: &str, group_id: Id)
    -> HandlerResult<ObjectState>;

    async fn update(&self, state_id: Id, input: InputStruct) -> HandlerResult<ObjectState>;

    async fn set_priority(&self, state_id: Id, priority: i32) -> HandlerResult<()>;

    async fn delete(&self, state_id: Id) -> HandlerResult<()>;

    async fn set_content_state(
        &self,
        content_id: Id,
        group_id: Id,
        state_id: Id,
    ) -> HandlerResult<bool>;

    async fn get_content_state(&self, content_id: Id, group_id: Id) -> HandlerResult<ObjectState>;

    async fn get_content_count(&self, state_id: Id) -> HandlerResult<u64>;
}

#[async_trait]
pub trait TrashHandler: Send + Sync {
    async fn load_trash_item(&self, trash_item_id: Id) -> HandlerResult<Trashed>;

    /// `None` when the subtree was deleted outright instead of trashed.
    async fn trash_subtree(&self, location_id: Id) -> HandlerResult<Option<Trashed>>;

    async fn recover(&self, trashed_id: Id, new_parent_id: Option<Id>) -> HandlerResult<Id>;

    async fn find_trash_items(
        &self,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<TrashResult>;

    async fn empty_trash(&self) -> HandlerResult<TrashItemDeleteResultList>;

    async fn delete_trash_item(&self, trashed_id: Id) -> HandlerResult<TrashItemDeleteResult>;
}

#[async_trait]
pub trait UrlAliasHandler: Send + Sync {
    async fn publish_url_alias_for_location(
        &self,
        location_id: Id,
        parent_location_id: Id,
        name: &str,
        language_code: &str,
        always_available: bool,
        update_path_identification_string: bool,
    ) -> HandlerResult<()>;

    async fn create_custom_url_alias(
        &self,
        location_id: Id,
        path: &str,
        forwarding: bool,
        language_code: Option<&str>,
        always_available: bool,
    ) -> HandlerResult<UrlAlias>;

    async fn create_global_url_alias(
        &self,
        resource: &str,
        path: &str,
        forwarding: bool,
        language_code: Option<&str>,
        always_available: bool,
    ) -> HandlerResult<UrlAlias>;

    async fn list_global_url_aliases(
        &self,
        language_code: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> HandlerResult<Vec<UrlAlias>>;

    async fn list_url_aliases_for_location(
        &self,
        location_id: Id,
        custom: bool,
    ) -> HandlerResult<Vec<UrlAlias>>;

    async fn remove_url_aliases(&self, url_aliases: &[UrlAlias]) -> HandlerResult<bool>;

    async fn lookup(&self, url: &str) -> HandlerResult<UrlAlias>;

    async fn load_url_alias(&self, id: &str) -> HandlerResult<UrlAlias>;

    async fn location_moved(
        &self,
        location_id: Id,
        old_parent_id: Id,
        new_parent_id: Id,
    ) -> HandlerResult<()>;

    async fn location_copied(
        &self,
        location_id: Id,
        new_location_id: Id,
        new_parent_id: Id,
    ) -> HandlerResult<()>;

    /// Returns the aliases removed along with the location.
    async fn location_deleted(&self, location_id: Id) -> HandlerResult<Vec<UrlAlias>>;

    async fn location_swapped(
        &self,
        location_id_a: Id,
        parent_location_id_a: Id,
        location_id_b: Id,
        parent_location_id_b: Id,
    ) -> HandlerResult<()>;

    async fn translation_removed(
        &self,
        location_ids: &[Id],
        language_code: &str,
    ) -> HandlerResult<()>;

    async fn archive_url_aliases_for_deleted_translations(
        &self,
        location_id: Id,
        parent_location_id: Id,
        language_codes: &[String],
    ) -> HandlerResult<()>;
}

#[async_trait]
pub trait UrlWildcardHandler: Send + Sync {
    async fn create(
        &self,
        source_url: &str,
        destination_url: &str,
        forward: bool,
    ) -> HandlerResult<UrlWildcard>;

    async fn update(
        &self,
        id: Id,
        source_url: &str,
        destination_url: &str,
        forward: bool,
    ) -> HandlerResult<UrlWildcard>;

    async fn remove(&self, id: Id) -> HandlerResult<()>;

    async fn load(&self, id: Id) -> HandlerResult<UrlWildcard>;

    async fn load_all(&self, offset: usize, limit: Option<usize>)
    -> HandlerResult<Vec<UrlWildcard>>;

    async fn translate(&self, source_url: &str) -> HandlerResult<UrlWildcard>;

    async fn exact_source_url_exists(&self, source_url: &str) -> HandlerResult<bool>;

    async fn count_all(&self) -> HandlerResult<u64>;
}

#[async_trait]
pub trait LanguageHandler: Send + Sync {
    async fn create(&self, input: LanguageCreateStruct) -> HandlerResult<Language>;

    async fn update(&self, language: Language) -> HandlerResult<()>;

    async fn load(&self, language_id: Id) -> HandlerResult<Language>;

    async fn load_list(&self, language_ids: &[Id]) -> HandlerResult<HashMap<Id, Language>>;

    async fn load_by_language_code(&self, language_code: &str) -> HandlerResult<Language>;

    async fn load_list_by_language_codes(
        &self,
        language_codes: &[String],
    ) -> HandlerResult<HashMap<String, Language>>;

    async fn load_all(&self) -> HandlerResult<Vec<Language>>;

    async fn delete(&self, language_id: Id) -> HandlerResult<()>;
}

#[async_trait]
pub trait TransactionHandler: Send + Sync {
    async fn begin_transaction(&self) -> HandlerResult<()>;

    async fn commit(&self) -> HandlerResult<()>;

    async fn rollback(&self) -> HandlerResult<()>;
}

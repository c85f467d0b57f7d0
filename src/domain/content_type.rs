use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentTypeStatus {
    Defined,
    Draft,
    Modified,
}

impl ContentTypeStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Defined => 0,
            Self::Draft => 1,
            Self::Modified => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: Id,
    pub identifier: String,
    pub field_type: String,
    pub position: i32,
    pub is_translatable: bool,
    pub is_required: bool,
    pub is_searchable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    pub id: Id,
    pub status: ContentTypeStatus,
    pub identifier: String,
    pub remote_id: String,
    pub group_ids: Vec<Id>,
    pub names: BTreeMap<String, String>,
    pub field_definitions: Vec<FieldDefinition>,
    pub is_container: bool,
    pub default_always_available: bool,
    pub modifier_id: Id,
    pub modified: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeGroup {
    pub id: Id,
    pub identifier: String,
    pub creator_id: Id,
    pub modifier_id: Id,
    pub created: OffsetDateTime,
    pub modified: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCreateStruct {
    pub identifier: String,
    pub creator_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupUpdateStruct {
    pub id: Id,
    pub identifier: String,
    pub modifier_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeCreateStruct {
    pub identifier: String,
    pub remote_id: String,
    pub status: ContentTypeStatus,
    pub group_ids: Vec<Id>,
    pub names: BTreeMap<String, String>,
    pub field_definitions: Vec<FieldDefinition>,
    pub is_container: bool,
    pub creator_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeUpdateStruct {
    pub identifier: String,
    pub remote_id: String,
    pub names: BTreeMap<String, String>,
    pub is_container: bool,
    pub modifier_id: Id,
}

/// Per searchable field definition, keyed by type identifier then field identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchableField {
    pub field_definition_id: Id,
    pub field_type: String,
}

pub type SearchableFieldMap = BTreeMap<String, BTreeMap<String, SearchableField>>;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Id, VersionNo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionStatus {
    Draft,
    Published,
    Archived,
}

impl VersionStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Draft => 0,
            Self::Published => 1,
            Self::Archived => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentStatus {
    Draft,
    Published,
    Trashed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentInfo {
    pub id: Id,
    pub content_type_id: Id,
    pub section_id: Id,
    pub owner_id: Id,
    pub name: String,
    pub remote_id: String,
    pub current_version_no: VersionNo,
    pub status: ContentStatus,
    pub main_language_code: String,
    pub main_location_id: Option<Id>,
    pub always_available: bool,
    pub is_hidden: bool,
    pub modification_date: OffsetDateTime,
    pub publication_date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub content_info: ContentInfo,
    pub version_no: VersionNo,
    pub status: VersionStatus,
    pub creator_id: Id,
    pub initial_language_code: String,
    pub language_codes: Vec<String>,
    pub names: BTreeMap<String, String>,
    pub creation_date: OffsetDateTime,
    pub modification_date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: Id,
    pub field_definition_id: Id,
    pub type_identifier: String,
    pub language_code: String,
    pub version_no: VersionNo,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub version_info: VersionInfo,
    pub fields: Vec<Field>,
}

impl Content {
    pub fn id(&self) -> Id {
        self.version_info.content_info.id
    }

    pub fn content_type_id(&self) -> Id {
        self.version_info.content_info.content_type_id
    }

    pub fn version_no(&self) -> VersionNo {
        self.version_info.version_no
    }
}

/// Relation kind bitmask; several kinds may be combined into one filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationType(u32);

impl RelationType {
    pub const COMMON: Self = Self(1);
    pub const EMBED: Self = Self(2);
    pub const LINK: Self = Self(4);
    pub const FIELD: Self = Self(8);
    pub const ASSET: Self = Self(16);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// True when any kind in `other` is also set in `self`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for RelationType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: Id,
    pub source_content_id: Id,
    pub source_content_version_no: VersionNo,
    pub source_field_definition_id: Option<Id>,
    pub destination_content_id: Id,
    pub relation_type: RelationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCreateStruct {
    pub source_content_id: Id,
    pub source_content_version_no: VersionNo,
    pub source_field_definition_id: Option<Id>,
    pub destination_content_id: Id,
    pub relation_type: RelationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStruct {
    pub content_type_id: Id,
    pub section_id: Id,
    pub owner_id: Id,
    pub names: BTreeMap<String, String>,
    pub remote_id: String,
    pub initial_language_code: String,
    pub always_available: bool,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStruct {
    pub creator_id: Id,
    pub names: BTreeMap<String, String>,
    pub initial_language_code: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataUpdateStruct {
    pub owner_id: Option<Id>,
    pub name: Option<String>,
    pub remote_id: Option<String>,
    pub main_language_code: Option<String>,
    pub always_available: Option<bool>,
    pub publication_date: Option<OffsetDateTime>,
    pub modification_date: Option<OffsetDateTime>,
}

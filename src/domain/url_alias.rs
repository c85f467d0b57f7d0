use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlAliasType {
    Location,
    Resource,
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlAlias {
    /// Storage-assigned alias id, e.g. `0-d41d8cd98f00b204e9800998ecf8427e`.
    pub id: String,
    pub alias_type: UrlAliasType,
    /// Target location for [`UrlAliasType::Location`] aliases.
    pub location_id: Option<Id>,
    /// Target resource for [`UrlAliasType::Resource`] aliases.
    pub resource: Option<String>,
    pub path: String,
    pub language_codes: Vec<String>,
    pub always_available: bool,
    pub is_history: bool,
    pub is_custom: bool,
    pub forward: bool,
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStateGroup {
    pub id: Id,
    pub identifier: String,
    pub default_language_code: String,
    pub language_codes: Vec<String>,
    pub names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectState {
    pub id: Id,
    pub group_id: Id,
    pub identifier: String,
    pub priority: i32,
    pub default_language_code: String,
    pub names: BTreeMap<String, String>,
}

/// Shared input for creating or updating both states and state groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStruct {
    pub identifier: String,
    pub default_language_code: String,
    pub names: BTreeMap<String, String>,
}

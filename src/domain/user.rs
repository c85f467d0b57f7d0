use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Id;

/// A user shares its id with the content item holding its profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub enabled: bool,
    pub max_login: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTokenUpdateStruct {
    pub user_id: Id,
    pub hash_key: String,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: Id,
    pub role_id: Id,
    pub module: String,
    pub function: String,
    pub limitations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Id,
    pub identifier: String,
    pub policies: Vec<Policy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCreateStruct {
    pub identifier: String,
    pub policies: Vec<Policy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUpdateStruct {
    pub id: Id,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: Id,
    pub role_id: Id,
    /// User or user group the role is assigned to.
    pub content_id: Id,
    pub limitation_identifier: Option<String>,
    pub values: Vec<String>,
}

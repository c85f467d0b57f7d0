use serde::{Deserialize, Serialize};

use super::{Id, VersionNo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: Id,
    pub content_id: Id,
    pub parent_id: Id,
    pub remote_id: String,
    /// Materialized path such as `/1/2/42/`, root first, self last.
    pub path_string: String,
    pub depth: i32,
    pub priority: i32,
    pub hidden: bool,
    pub invisible: bool,
    pub sort_field: i32,
    pub sort_order: i32,
}

impl Location {
    /// Ancestor ids from the root down to (and including) this location.
    ///
    /// Path elements that do not parse as ids are skipped.
    pub fn path(&self) -> Vec<Id> {
        self.path_string
            .split('/')
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| segment.parse().ok())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCreateStruct {
    pub content_id: Id,
    pub content_version: VersionNo,
    pub parent_id: Id,
    pub remote_id: String,
    pub priority: i32,
    pub hidden: bool,
    pub invisible: bool,
    pub is_main_location: bool,
    pub sort_field: i32,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationUpdateStruct {
    pub priority: i32,
    pub remote_id: String,
    pub sort_field: i32,
    pub sort_order: i32,
}

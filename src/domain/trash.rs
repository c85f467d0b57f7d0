use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Id;
use super::location::Location;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trashed {
    pub location: Location,
    pub trashed: OffsetDateTime,
}

impl Trashed {
    pub fn id(&self) -> Id {
        self.location.id
    }

    pub fn content_id(&self) -> Id {
        self.location.content_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashResult {
    pub items: Vec<Trashed>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashItemDeleteResult {
    pub trash_item_id: Id,
    pub content_id: Id,
    pub content_removed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashItemDeleteResultList {
    pub items: Vec<TrashItemDeleteResult>,
}

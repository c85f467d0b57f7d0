use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlWildcard {
    pub id: Id,
    pub source_url: String,
    pub destination_url: String,
    pub forward: bool,
}

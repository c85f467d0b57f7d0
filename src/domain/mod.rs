//! Value objects handed out by the storage engine.
//!
//! Everything the cache layer stores derives `Serialize`/`Deserialize`: the
//! shared store keeps encoded payloads, not live objects.

pub mod content;
pub mod content_type;
pub mod error;
pub mod language;
pub mod location;
pub mod object_state;
pub mod section;
pub mod trash;
pub mod url_alias;
pub mod url_wildcard;
pub mod user;

/// Identifier of a content item, location, type, etc. as assigned by storage.
pub type Id = i64;

/// Version number within one content item.
pub type VersionNo = i32;

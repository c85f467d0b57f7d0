//! Cache decorators, one per domain handler trait.
//!
//! Each handler maps its operations onto the read-through, multi-get and
//! mutate-then-invalidate helpers of [`CacheCore`](super::core::CacheCore).

mod content;
mod content_type;
mod language;
mod location;
mod object_state;
mod section;
mod transaction;
mod trash;
mod url_alias;
mod url_wildcard;
mod user;

pub use content::ContentCacheHandler;
pub use content_type::ContentTypeCacheHandler;
pub use language::LanguageCacheHandler;
pub use location::LocationCacheHandler;
pub use object_state::ObjectStateCacheHandler;
pub use section::SectionCacheHandler;
pub use transaction::TransactionCacheHandler;
pub use trash::TrashCacheHandler;
pub use url_alias::UrlAliasCacheHandler;
pub use url_wildcard::UrlWildcardCacheHandler;
pub use user::UserCacheHandler;

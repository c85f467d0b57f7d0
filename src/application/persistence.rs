//! Aggregate access to every domain handler.

use std::sync::Arc;

use super::handlers::{
    ContentHandler, ContentTypeHandler, LanguageHandler, LocationHandler, ObjectStateHandler,
    SectionHandler, TransactionHandler, TrashHandler, UrlAliasHandler, UrlWildcardHandler,
    UserHandler,
};

/// Entry point the rest of the system uses to reach persistence.
///
/// Accessors are cheap and may be called repeatedly; implementations hand out
/// shared handles.
pub trait PersistenceHandler: Send + Sync {
    fn content_handler(&self) -> Arc<dyn ContentHandler>;
    fn content_type_handler(&self) -> Arc<dyn ContentTypeHandler>;
    fn location_handler(&self) -> Arc<dyn LocationHandler>;
    fn user_handler(&self) -> Arc<dyn UserHandler>;
    fn section_handler(&self) -> Arc<dyn SectionHandler>;
    fn object_state_handler(&self) -> Arc<dyn ObjectStateHandler>;
    fn trash_handler(&self) -> Arc<dyn TrashHandler>;
    fn url_alias_handler(&self) -> Arc<dyn UrlAliasHandler>;
    fn url_wildcard_handler(&self) -> Arc<dyn UrlWildcardHandler>;
    fn language_handler(&self) -> Arc<dyn LanguageHandler>;
    fn transaction_handler(&self) -> Arc<dyn TransactionHandler>;
}

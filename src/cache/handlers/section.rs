use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{HandlerResult, SectionHandler};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::section::Section;

pub struct SectionCacheHandler {
    inner: Arc<dyn SectionHandler>,
    core: Arc<CacheCore>,
}

impl SectionCacheHandler {
    pub fn new(inner: Arc<dyn SectionHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn section_tag(&self, section_id: Id) -> String {
        self.core.tag(TagKind::Section, &[section_id.into()])
    }
}

#[async_trait]
impl SectionHandler for SectionCacheHandler {
    async fn create(&self, name: &str, identifier: &str) -> HandlerResult<Section> {
        self.core
            .passthrough(
                InnerCall::new(
                    "section::create",
                    json!({ "name": name, "identifier": identifier }),
                ),
                self.inner.create(name, identifier),
            )
            .await
    }

    async fn update(
        &self,
        section_id: Id,
        name: &str,
        identifier: &str,
    ) -> HandlerResult<Section> {
        self.core
            .mutate(
                InnerCall::new(
                    "section::update",
                    json!({ "section": section_id, "name": name, "identifier": identifier }),
                ),
                self.inner.update(section_id, name, identifier),
                |_| vec![self.section_tag(section_id)],
            )
            .await
    }

    async fn load(&self, section_id: Id) -> HandlerResult<Section> {
        self.core
            .get_cached(
                self.core.key(KeyKind::Section, &[section_id.into()]),
                InnerCall::new("section::load", json!({ "section": section_id })),
                self.inner.load(section_id),
                |section| vec![self.section_tag(section.id)],
            )
            .await
    }

    async fn load_all(&self) -> HandlerResult<Vec<Section>> {
        self.core
            .passthrough(
                InnerCall::new("section::load_all", json!({})),
                self.inner.load_all(),
            )
            .await
    }

    async fn load_by_identifier(&self, identifier: &str) -> HandlerResult<Section> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::SectionByIdentifier, &[Arg::text(identifier)]),
                InnerCall::new(
                    "section::load_by_identifier",
                    json!({ "identifier": identifier }),
                ),
                self.inner.load_by_identifier(identifier),
                |section| vec![self.section_tag(section.id)],
            )
            .await
    }

    async fn delete(&self, section_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("section::delete", json!({ "section": section_id })),
                self.inner.delete(section_id),
                |_| vec![self.section_tag(section_id)],
            )
            .await
    }

    async fn assign(&self, section_id: Id, content_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "section::assign",
                    json!({ "section": section_id, "content": content_id }),
                ),
                self.inner.assign(section_id, content_id),
                |_| vec![self.core.tag(TagKind::Content, &[content_id.into()])],
            )
            .await
    }

    async fn assignments_count(&self, section_id: Id) -> HandlerResult<u64> {
        self.core
            .passthrough(
                InnerCall::new("section::assignments_count", json!({ "section": section_id })),
                self.inner.assignments_count(section_id),
            )
            .await
    }

    async fn policies_count(&self, section_id: Id) -> HandlerResult<u64> {
        self.core
            .passthrough(
                InnerCall::new("section::policies_count", json!({ "section": section_id })),
                self.inner.policies_count(section_id),
            )
            .await
    }

    async fn count_role_assignments_using_section(&self, section_id: Id) -> HandlerResult<u64> {
        self.core
            .passthrough(
                InnerCall::new(
                    "section::count_role_assignments_using_section",
                    json!({ "section": section_id }),
                ),
                self.inner.count_role_assignments_using_section(section_id),
            )
            .await
    }
}

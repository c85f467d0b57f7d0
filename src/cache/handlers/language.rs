use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{HandlerResult, LanguageHandler};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::language::{Language, LanguageCreateStruct};

pub struct LanguageCacheHandler {
    inner: Arc<dyn LanguageHandler>,
    core: Arc<CacheCore>,
}

impl LanguageCacheHandler {
    pub fn new(inner: Arc<dyn LanguageHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn language_tag(&self, language_id: Id) -> String {
        self.core.tag(TagKind::Language, &[language_id.into()])
    }

    fn list_tag(&self) -> String {
        self.core.tag(TagKind::LanguageList, &[])
    }

    fn code_key(&self, language_code: &str) -> String {
        self.core
            .key(KeyKind::LanguageCode, &[Arg::text(language_code)])
    }
}

#[async_trait]
impl LanguageHandler for LanguageCacheHandler {
    async fn create(&self, input: LanguageCreateStruct) -> HandlerResult<Language> {
        self.core
            .mutate(
                InnerCall::new("language::create", json!({ "struct": input })),
                self.inner.create(input),
                |_| vec![self.list_tag()],
            )
            .await
    }

    async fn update(&self, language: Language) -> HandlerResult<()> {
        let language_id = language.id;
        self.core
            .mutate(
                InnerCall::new("language::update", json!({ "language": language })),
                self.inner.update(language),
                |_| vec![self.language_tag(language_id)],
            )
            .await
    }

    async fn load(&self, language_id: Id) -> HandlerResult<Language> {
        self.core
            .get_cached(
                self.core.key(KeyKind::Language, &[language_id.into()]),
                InnerCall::new("language::load", json!({ "language": language_id })),
                self.inner.load(language_id),
                |language| vec![self.language_tag(language.id)],
            )
            .await
    }

    async fn load_list(&self, language_ids: &[Id]) -> HandlerResult<HashMap<Id, Language>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                language_ids,
                |id| self.core.key(KeyKind::Language, &[(*id).into()]),
                |misses| InnerCall::new("language::load_list", json!({ "languages": misses })),
                |misses: Vec<Id>| async move { inner.load_list(&misses).await },
                |language| vec![self.language_tag(language.id)],
            )
            .await
    }

    async fn load_by_language_code(&self, language_code: &str) -> HandlerResult<Language> {
        self.core
            .get_cached(
                self.code_key(language_code),
                InnerCall::new(
                    "language::load_by_language_code",
                    json!({ "language_code": language_code }),
                ),
                self.inner.load_by_language_code(language_code),
                |language| vec![self.language_tag(language.id)],
            )
            .await
    }

    async fn load_list_by_language_codes(
        &self,
        language_codes: &[String],
    ) -> HandlerResult<HashMap<String, Language>> {
        let inner = &self.inner;
        self.core
            .get_cached_list(
                language_codes,
                |code| self.code_key(code),
                |misses| {
                    InnerCall::new(
                        "language::load_list_by_language_codes",
                        json!({ "language_codes": misses }),
                    )
                },
                |misses: Vec<String>| async move { inner.load_list_by_language_codes(&misses).await },
                |language| vec![self.language_tag(language.id)],
            )
            .await
    }

    async fn load_all(&self) -> HandlerResult<Vec<Language>> {
        self.core
            .get_cached(
                self.core.key(KeyKind::LanguageList, &[]),
                InnerCall::new("language::load_all", json!({})),
                self.inner.load_all(),
                |languages| {
                    let mut tags = vec![self.list_tag()];
                    tags.extend(languages.iter().map(|language| self.language_tag(language.id)));
                    tags
                },
            )
            .await
    }

    async fn delete(&self, language_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("language::delete", json!({ "language": language_id })),
                self.inner.delete(language_id),
                |_| vec![self.language_tag(language_id), self.list_tag()],
            )
            .await
    }
}

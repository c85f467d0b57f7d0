use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::application::handlers::{HandlerResult, TransactionHandler};
use crate::cache::core::{CacheCore, InnerCall};

/// Brackets inner transactions with the store's transaction hooks so shared
/// invalidation waits for the commit.
pub struct TransactionCacheHandler {
    inner: Arc<dyn TransactionHandler>,
    core: Arc<CacheCore>,
}

impl TransactionCacheHandler {
    pub fn new(inner: Arc<dyn TransactionHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }
}

#[async_trait]
impl TransactionHandler for TransactionCacheHandler {
    async fn begin_transaction(&self) -> HandlerResult<()> {
        self.core.store().begin_transaction().await;
        let result = self
            .core
            .passthrough(
                InnerCall::new("transaction::begin_transaction", json!({})),
                self.inner.begin_transaction(),
            )
            .await;
        if result.is_err() {
            self.core.store().rollback_transaction().await;
        }
        result
    }

    async fn commit(&self) -> HandlerResult<()> {
        self.core
            .passthrough(
                InnerCall::new("transaction::commit", json!({})),
                self.inner.commit(),
            )
            .await?;

        if let Err(err) = self.core.store().commit_transaction().await {
            warn!(error = %err, "flushing deferred cache invalidation failed");
        }
        Ok(())
    }

    async fn rollback(&self) -> HandlerResult<()> {
        self.core.store().rollback_transaction().await;
        self.core
            .passthrough(
                InnerCall::new("transaction::rollback", json!({})),
                self.inner.rollback(),
            )
            .await
    }
}

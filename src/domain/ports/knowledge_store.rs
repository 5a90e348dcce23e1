use async_trait::async_trait;

use super::errors::KnowledgeStoreError;
use crate::domain::models::{KnowledgeRecord, KnowledgeSignature, KnowledgeSnippet};

/// Port for the long-lived, cross-session knowledge store.
///
/// The store is shared, not owned by any session. Every failure is
/// non-fatal for callers.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Similarity lookup, closest first, at most `limit` snippets.
    async fn query(
        &self,
        signature: &KnowledgeSignature,
        limit: usize,
    ) -> Result<Vec<KnowledgeSnippet>, KnowledgeStoreError>;

    /// Insert or replace the record for its session.
    async fn upsert(&self, record: KnowledgeRecord) -> Result<(), KnowledgeStoreError>;
}

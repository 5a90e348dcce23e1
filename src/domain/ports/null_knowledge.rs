//! Null knowledge store implementation.
//!
//! Used when progressive learning is disabled but the type system
//! requires a KnowledgeStore implementation.

use async_trait::async_trait;

use super::errors::KnowledgeStoreError;
use super::KnowledgeStore;
use crate::domain::models::{KnowledgeRecord, KnowledgeSignature, KnowledgeSnippet};

/// A no-op knowledge store that remembers nothing.
#[derive(Debug, Clone, Default)]
pub struct NullKnowledgeStore;

impl NullKnowledgeStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KnowledgeStore for NullKnowledgeStore {
    async fn query(
        &self,
        _signature: &KnowledgeSignature,
        _limit: usize,
    ) -> Result<Vec<KnowledgeSnippet>, KnowledgeStoreError> {
        Ok(Vec::new())
    }

    async fn upsert(&self, _record: KnowledgeRecord) -> Result<(), KnowledgeStoreError> {
        Ok(())
    }
}

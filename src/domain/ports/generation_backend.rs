use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::GenerationError;
use crate::domain::models::{GameAnalysis, KnowledgeSnippet, RawTestCase, TestCategory};

/// Everything a generation backend needs to propose test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub analysis: GameAnalysis,
    pub knowledge: Vec<KnowledgeSnippet>,
    /// Number of test cases the backend is asked for
    pub requested_count: usize,
    /// Categories the pool must span
    pub required_categories: Vec<TestCategory>,
    /// Token budget for this attempt; grows with every retry
    pub prompt_budget: u32,
    /// 0-based attempt number
    pub attempt: u32,
}

/// Port for the language model that writes test cases.
///
/// Output is deliberately loose ([`RawTestCase`]); the generator validates it.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<Vec<RawTestCase>, GenerationError>;
}

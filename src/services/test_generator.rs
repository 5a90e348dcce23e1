//! Test generator.
//!
//! Builds the candidate pool from a game analysis and prior knowledge.
//! Backend output is validated record by record; valid records accumulate
//! across attempts until the pool is large enough and spans every mandatory
//! category. The generator never invents records to close a gap.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    GameAnalysis, GenerationConfig, KnowledgeConfig, KnowledgeSignature, KnowledgeSnippet,
    RawTestCase, TestCase, TestCategory,
};
use crate::domain::ports::{GenerationBackend, GenerationRequest, KnowledgeStore};
use crate::infrastructure::TokenBucketRateLimiter;

/// Builds the candidate test pool for an analyzed game.
///
/// Each attempt asks the [`GenerationBackend`] for what is still missing,
/// with a larger prompt budget, until the pool is big enough and covers
/// every mandatory category.
pub struct TestGenerator {
    backend: Arc<dyn GenerationBackend>,
    knowledge: Arc<dyn KnowledgeStore>,
    rate_limiter: TokenBucketRateLimiter,
    config: GenerationConfig,
    knowledge_config: KnowledgeConfig,
}

/// Pool under construction.
#[derive(Debug, Default)]
struct PoolBuilder {
    cases: Vec<TestCase>,
    seen: HashSet<(String, TestCategory)>,
    malformed: usize,
    duplicates: usize,
}

impl PoolBuilder {
    fn missing_categories(&self) -> Vec<TestCategory> {
        TestCategory::MANDATORY
            .into_iter()
            .filter(|category| !self.cases.iter().any(|c| c.category == *category))
            .collect()
    }

    fn is_complete(&self, minimum: usize) -> bool {
        self.cases.len() >= minimum && self.missing_categories().is_empty()
    }

    fn absorb(&mut self, raw: Vec<RawTestCase>) -> usize {
        let before = self.cases.len();
        for record in raw {
            let id = (self.cases.len() + 1) as u32;
            match record.validate(id) {
                Ok(case) => {
                    if self.seen.insert(case.dedup_key()) {
                        self.cases.push(case);
                    } else {
                        self.duplicates += 1;
                        debug!(name = %case.name, category = %case.category, "dropping duplicate test case");
                    }
                }
                Err(reason) => {
                    self.malformed += 1;
                    warn!(%reason, "dropping malformed test case");
                }
            }
        }
        self.cases.len() - before
    }
}

impl TestGenerator {
    /// Creates a new TestGenerator
    ///
    /// # Arguments
    /// - `backend`: Model backend producing raw test records
    /// - `knowledge`: Cross-session store queried for prior findings
    /// - `rate_limiter`: Limiter shared with the verdict judges
    /// - `config`: Pool minimum, attempt count, prompt budget and call timeout
    /// - `knowledge_config`: Snippet limit and store timeout
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        knowledge: Arc<dyn KnowledgeStore>,
        rate_limiter: TokenBucketRateLimiter,
        config: GenerationConfig,
        knowledge_config: KnowledgeConfig,
    ) -> Self {
        Self {
            backend,
            knowledge,
            rate_limiter,
            config,
            knowledge_config,
        }
    }

    /// Produce a validated, duplicate-free pool.
    ///
    /// Malformed records are dropped and counted. Backend errors and timeouts
    /// use up an attempt without failing the call. Knowledge store failures
    /// are logged and generation proceeds without snippets.
    ///
    /// # Arguments
    /// - `analysis`: Analyzed game; its type and mechanics select the knowledge snippets
    ///
    /// # Errors
    /// Returns `InsufficientTestCases` when the pool is still too small or
    /// misses a mandatory category after the last attempt.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// # use playtest::domain::models::GameAnalysis;
    /// # async fn example(generator: playtest::services::TestGenerator) -> anyhow::Result<()> {
    /// let analysis = GameAnalysis::new("https://games.example/sudoku", "sudoku")
    ///     .with_mechanics(["grid input", "timer"]);
    /// let pool = generator.generate(&analysis).await?;
    /// assert!(pool.len() >= 20);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, analysis), fields(url = %analysis.url, game_type = %analysis.game_type))]
    pub async fn generate(&self, analysis: &GameAnalysis) -> DomainResult<Vec<TestCase>> {
        let knowledge = self.fetch_knowledge(analysis).await;
        let minimum = self.config.min_test_cases;
        let mut pool = PoolBuilder::default();

        for attempt in 0..self.config.max_attempts {
            let missing = pool.missing_categories();
            let request = GenerationRequest {
                analysis: analysis.clone(),
                knowledge: knowledge.clone(),
                requested_count: minimum.saturating_sub(pool.cases.len()).max(missing.len()),
                required_categories: missing,
                prompt_budget: self.config.base_prompt_budget.saturating_mul(attempt + 1),
                attempt,
            };

            self.rate_limiter.acquire().await;
            let call = timeout(
                Duration::from_millis(self.config.timeout_ms),
                self.backend.generate(&request),
            )
            .await;

            match call {
                Ok(Ok(raw)) => {
                    let received = raw.len();
                    let accepted = pool.absorb(raw);
                    info!(
                        attempt,
                        received,
                        accepted,
                        pool_size = pool.cases.len(),
                        prompt_budget = request.prompt_budget,
                        "generation attempt finished"
                    );
                }
                Ok(Err(e)) => warn!(attempt, error = %e, "generation attempt failed"),
                Err(_) => warn!(
                    attempt,
                    timeout_ms = self.config.timeout_ms,
                    "generation attempt timed out"
                ),
            }

            if pool.is_complete(minimum) {
                info!(
                    pool_size = pool.cases.len(),
                    malformed = pool.malformed,
                    duplicates = pool.duplicates,
                    "test pool generated"
                );
                return Ok(pool.cases);
            }
        }

        let missing_categories = pool.missing_categories();
        warn!(
            produced = pool.cases.len(),
            required = minimum,
            missing = missing_categories.len(),
            "generation exhausted its attempts"
        );
        Err(DomainError::InsufficientTestCases {
            produced: pool.cases.len(),
            required: minimum,
            missing_categories,
        })
    }

    /// Similar prior knowledge; a failing store yields none.
    async fn fetch_knowledge(&self, analysis: &GameAnalysis) -> Vec<KnowledgeSnippet> {
        let signature = KnowledgeSignature::from_analysis(analysis);
        let query = timeout(
            Duration::from_millis(self.knowledge_config.timeout_ms),
            self.knowledge
                .query(&signature, self.knowledge_config.max_snippets),
        )
        .await;

        match query {
            Ok(Ok(snippets)) => {
                debug!(count = snippets.len(), "retrieved knowledge snippets");
                snippets
            }
            Ok(Err(e)) => {
                warn!(error = %e, "knowledge query failed, generating without prior knowledge");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.knowledge_config.timeout_ms,
                    "knowledge query timed out, generating without prior knowledge"
                );
                Vec::new()
            }
        }
    }
}

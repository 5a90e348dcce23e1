//! Common test utilities for integration tests
//!
//! Builds a [`SessionService`] wired to scripted collaborators and the
//! in-memory stores, with handles kept for assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;

use playtest::adapters::judges::JudgeRegistry;
use playtest::adapters::memory::{InMemoryKnowledgeStore, InMemorySessionRepository};
use playtest::adapters::scripted::{
    ScriptedBrowserDriver, ScriptedGenerationBackend, ScriptedJudge, StaticInspector,
};
use playtest::domain::models::{
    Config, GameAnalysis, KnowledgeRecord, KnowledgeSignature, KnowledgeSnippet,
};
use playtest::domain::ports::{KnowledgeStore, KnowledgeStoreError};
use playtest::services::{Collaborators, SessionService};

pub const GAME_URL: &str = "https://games.example.test/sudoku";

/// Knowledge store whose every call fails.
#[derive(Debug, Default)]
pub struct UnavailableKnowledgeStore;

#[async_trait]
impl KnowledgeStore for UnavailableKnowledgeStore {
    async fn query(
        &self,
        _signature: &KnowledgeSignature,
        _limit: usize,
    ) -> Result<Vec<KnowledgeSnippet>, KnowledgeStoreError> {
        Err(KnowledgeStoreError::Unavailable("store offline".to_string()))
    }

    async fn upsert(&self, _record: KnowledgeRecord) -> Result<(), KnowledgeStoreError> {
        Err(KnowledgeStoreError::Unavailable("store offline".to_string()))
    }
}

/// Configuration suitable for fast tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.rate_limit.requests_per_second = 1000.0;
    config
}

pub fn sudoku() -> GameAnalysis {
    GameAnalysis::new(GAME_URL, "sudoku")
        .with_element_count(81)
        .with_mechanics(["grid input", "number validation", "timer"])
}

pub struct Harness {
    pub service: Arc<SessionService>,
    pub repo: Arc<InMemorySessionRepository>,
    pub inspector: Arc<StaticInspector>,
    pub backend: Arc<ScriptedGenerationBackend>,
    pub driver: Arc<ScriptedBrowserDriver>,
    pub primary: Arc<ScriptedJudge>,
    pub cross_agent: Arc<ScriptedJudge>,
}

pub struct HarnessBuilder {
    config: Config,
    inspector: StaticInspector,
    backend: ScriptedGenerationBackend,
    driver: ScriptedBrowserDriver,
    primary: ScriptedJudge,
    cross_agent: ScriptedJudge,
    knowledge: Arc<dyn KnowledgeStore>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            inspector: StaticInspector::new(sudoku()),
            backend: ScriptedGenerationBackend::balanced(24),
            driver: ScriptedBrowserDriver::new(),
            primary: ScriptedJudge::new("primary"),
            cross_agent: ScriptedJudge::new("cross-agent"),
            knowledge: Arc::new(InMemoryKnowledgeStore::new()),
        }
    }

    pub fn config(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn inspector(mut self, inspector: StaticInspector) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn backend(mut self, backend: ScriptedGenerationBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn driver(mut self, driver: ScriptedBrowserDriver) -> Self {
        self.driver = driver;
        self
    }

    pub fn primary(mut self, judge: ScriptedJudge) -> Self {
        self.primary = judge;
        self
    }

    pub fn knowledge(mut self, store: Arc<dyn KnowledgeStore>) -> Self {
        self.knowledge = store;
        self
    }

    pub fn build(self) -> Harness {
        let repo = Arc::new(InMemorySessionRepository::new());
        let inspector = Arc::new(self.inspector);
        let backend = Arc::new(self.backend);
        let driver = Arc::new(self.driver);
        let primary = Arc::new(self.primary);
        let cross_agent = Arc::new(self.cross_agent);

        let collaborators = Collaborators {
            inspector: inspector.clone(),
            generation: backend.clone(),
            driver: driver.clone(),
            judges: JudgeRegistry::new()
                .with_judge(primary.clone())
                .with_judge(cross_agent.clone()),
            knowledge: self.knowledge,
        };
        let service = Arc::new(SessionService::new(repo.clone(), collaborators, &self.config));

        Harness {
            service,
            repo,
            inspector,
            backend,
            driver,
            primary,
            cross_agent,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until the store holds at least `count` records, up to `timeout_ms`.
///
/// Knowledge feedback is written on a background task after REPORT returns.
pub async fn wait_for_records(
    store: &InMemoryKnowledgeStore,
    count: usize,
    timeout_ms: u64,
) -> Vec<KnowledgeRecord> {
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        let records = store.records().await;
        if records.len() >= count || start.elapsed() >= timeout {
            return records;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

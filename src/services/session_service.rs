//! Session state machine service.
//!
//! Drives a session through ANALYZED → GENERATED → RANKED → EXECUTED →
//! REPORTED. Every transition of one session runs under that session's
//! async mutex and is written back to the [`SessionRepository`] in a single
//! update, so concurrent callers never observe a half-applied stage.
//! Re-requesting a stage the session already reached returns the stored
//! session without calling any collaborator.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::execution_coordinator::ExecutionCoordinator;
use super::report_builder::ReportBuilder;
use super::test_generator::TestGenerator;
use super::test_ranker::TestRanker;
use crate::adapters::judges::JudgeRegistry;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, GameAnalysis, GameInfo, KnowledgeRecord, Report, Session, SessionStage, StageInput,
};
use crate::domain::ports::{
    BrowserDriver, GameInspector, GenerationBackend, InspectionError, KnowledgeStore,
    SessionRepository,
};
use crate::infrastructure::TokenBucketRateLimiter;

/// Retention is capped at roughly a century.
const MAX_RETENTION_HOURS: i64 = 24 * 365 * 100;

/// External collaborators the engine consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub inspector: Arc<dyn GameInspector>,
    pub generation: Arc<dyn GenerationBackend>,
    pub driver: Arc<dyn BrowserDriver>,
    pub judges: JudgeRegistry,
    pub knowledge: Arc<dyn KnowledgeStore>,
}

/// Service owning the session lifecycle.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use playtest::adapters::memory::InMemorySessionRepository;
/// use playtest::domain::models::{Config, SessionStage};
/// use playtest::services::{Collaborators, SessionService};
///
/// async fn example(collaborators: Collaborators) -> anyhow::Result<()> {
///     let repo = Arc::new(InMemorySessionRepository::new());
///     let service = SessionService::new(repo, collaborators, &Config::default());
///
///     let session = service.run_pipeline("https://games.example/sudoku").await?;
///     assert_eq!(session.stage(), SessionStage::Reported);
///     Ok(())
/// }
/// ```
pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
    inspector: Arc<dyn GameInspector>,
    knowledge: Arc<dyn KnowledgeStore>,
    generator: TestGenerator,
    ranker: TestRanker,
    coordinator: ExecutionCoordinator,
    reports: ReportBuilder,
    inspection_timeout: Duration,
    knowledge_timeout: Duration,
    max_session_age: chrono::Duration,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    cancel_flags: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl SessionService {
    /// Creates a new SessionService
    ///
    /// The generator and the coordinator share one rate limiter for model calls.
    ///
    /// # Arguments
    /// - `repo`: Session repository implementation (injected dependency)
    /// - `collaborators`: Inspector, generation backend, browser driver, judges and knowledge store
    /// - `config`: Loaded configuration; every timeout and limit is read once here
    pub fn new(
        repo: Arc<dyn SessionRepository>,
        collaborators: Collaborators,
        config: &Config,
    ) -> Self {
        let rate_limiter = TokenBucketRateLimiter::new(config.rate_limit.requests_per_second);
        let generator = TestGenerator::new(
            collaborators.generation,
            collaborators.knowledge.clone(),
            rate_limiter.clone(),
            config.generation.clone(),
            config.knowledge.clone(),
        );
        let coordinator = ExecutionCoordinator::new(
            collaborators.driver,
            collaborators.judges,
            rate_limiter,
            config.execution.clone(),
        );
        let max_age_hours = i64::try_from(config.retention.max_session_age_hours)
            .unwrap_or(i64::MAX)
            .min(MAX_RETENTION_HOURS);

        Self {
            repo,
            inspector: collaborators.inspector,
            knowledge: collaborators.knowledge,
            generator,
            ranker: TestRanker::new(config.ranking.clone()),
            coordinator,
            reports: ReportBuilder::new(),
            inspection_timeout: Duration::from_millis(config.inspection.timeout_ms),
            knowledge_timeout: Duration::from_millis(config.knowledge.timeout_ms),
            max_session_age: chrono::Duration::hours(max_age_hours),
            locks: Mutex::new(HashMap::new()),
            cancel_flags: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a session for `url` at CREATED.
    ///
    /// # Errors
    /// Returns error if:
    /// - `url` is empty or whitespace (`ValidationFailed`)
    /// - Repository operation fails
    #[instrument(skip(self), err)]
    pub async fn create_session(&self, url: &str) -> DomainResult<Session> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DomainError::ValidationFailed("URL cannot be empty".to_string()));
        }
        let session = Session::new_with_uuid(url);
        self.repo.create(session.clone()).await?;
        info!(session_id = %session.id, "session created");
        Ok(session)
    }

    /// Creates a session and analyzes its game.
    ///
    /// When the inspection fails or exceeds `inspection.timeout_ms` the
    /// session stays at CREATED and can be retried with [`Self::analyze`].
    ///
    /// # Errors
    /// Returns error if:
    /// - `url` is empty
    /// - The inspector fails or times out (`Inspection`)
    ///
    /// # Examples
    ///
    /// ```ignore
    /// # async fn example(service: playtest::services::SessionService) -> anyhow::Result<()> {
    /// let session = service.start("https://games.example/sudoku").await?;
    /// println!("{} is a {}", session.id, session.analysis().unwrap().game_type);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start(&self, url: &str) -> DomainResult<Session> {
        let session = self.create_session(url).await?;
        self.analyze(&session.id).await
    }

    /// Drives a new session for `url` through every stage.
    ///
    /// # Errors
    /// Stops at the first failing stage; the session keeps the last stage it reached.
    pub async fn run_pipeline(&self, url: &str) -> DomainResult<Session> {
        let mut session = self.start(url).await?;
        for input in [
            StageInput::Generate,
            StageInput::Rank,
            StageInput::Execute,
            StageInput::Report,
        ] {
            session = self.advance(&session.id, input).await?;
        }
        Ok(session)
    }

    /// Inspects the game; CREATED → ANALYZED.
    ///
    /// # Errors
    /// `Inspection` when the inspector fails or times out. See [`Self::advance`].
    pub async fn analyze(&self, session_id: &str) -> DomainResult<Session> {
        self.advance(session_id, StageInput::Analyze).await
    }

    /// Builds the test pool; ANALYZED → GENERATED.
    ///
    /// # Errors
    /// `InsufficientTestCases` when the backend never yields a complete pool.
    pub async fn generate(&self, session_id: &str) -> DomainResult<Session> {
        self.advance(session_id, StageInput::Generate).await
    }

    /// Selects the top-N tests; GENERATED → RANKED.
    pub async fn rank(&self, session_id: &str) -> DomainResult<Session> {
        self.advance(session_id, StageInput::Rank).await
    }

    /// Runs and validates the ranked tests; RANKED → EXECUTED.
    ///
    /// Driver and judge failures become INDETERMINATE runs rather than errors.
    ///
    /// # Errors
    /// Returns error if a configured judge variant is not registered.
    pub async fn execute(&self, session_id: &str) -> DomainResult<Session> {
        self.advance(session_id, StageInput::Execute).await
    }

    /// Builds the report; EXECUTED → REPORTED.
    ///
    /// Knowledge feedback is written in the background once the report is stored.
    pub async fn report(&self, session_id: &str) -> DomainResult<Session> {
        self.advance(session_id, StageInput::Report).await
    }

    /// Moves the session to `input`'s target stage.
    ///
    /// # Arguments
    /// - `session_id`: Session to advance
    /// - `input`: Stage request; its target must be the stage right after the current one
    ///
    /// # Errors
    /// Returns error if:
    /// - `SessionNotFound` for an unknown id
    /// - `InvalidStageTransition` when the session is behind the required stage
    /// - the stage component fails; the session is left unchanged
    ///
    /// # Examples
    ///
    /// ```ignore
    /// # use playtest::domain::models::{SessionStage, StageInput};
    /// # async fn example(service: playtest::services::SessionService) -> anyhow::Result<()> {
    /// let session = service.start("https://games.example/sudoku").await?;
    /// let session = service.advance(&session.id, StageInput::Generate).await?;
    /// assert_eq!(session.stage(), SessionStage::Generated);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(target = %input.target()), err)]
    pub async fn advance(&self, session_id: &str, input: StageInput) -> DomainResult<Session> {
        if !self.repo.exists(session_id).await? {
            return Err(DomainError::SessionNotFound(session_id.to_string()));
        }

        let (session, feedback) = {
            let lock = self.lock_for(session_id).await;
            let _guard = lock.lock().await;
            self.apply(session_id, input).await?
        };

        if let Some(record) = feedback {
            self.feed_knowledge(record);
        }
        Ok(session)
    }

    /// Runs one stage transition; the caller holds the session lock.
    async fn apply(
        &self,
        session_id: &str,
        input: StageInput,
    ) -> DomainResult<(Session, Option<KnowledgeRecord>)> {
        let mut session = match self.load(session_id).await {
            Ok(session) => session,
            Err(e) => {
                if matches!(e, DomainError::SessionNotFound(_)) {
                    self.locks.lock().await.remove(session_id);
                }
                return Err(e);
            }
        };
        let target = input.target();

        if session.has_reached(target) {
            debug!(current = %session.stage(), "stage already reached, returning stored session");
            return Ok((session, None));
        }
        if session.stage() != input.required() {
            return Err(session.invalid_transition(target));
        }

        let mut feedback: Option<KnowledgeRecord> = None;

        match input {
            StageInput::Analyze => {
                let analysis = self.inspect(&session.url).await?;
                info!(
                    game_type = %analysis.game_type,
                    element_count = analysis.element_count,
                    mechanics = analysis.mechanics.len(),
                    "game analyzed"
                );
                session.record_analysis(analysis)?;
            }
            StageInput::Generate => {
                let analysis = required_analysis(&session, target)?;
                let pool = self.generator.generate(&analysis).await?;
                session.record_pool(pool)?;
            }
            StageInput::Rank => {
                let pool = session
                    .pool()
                    .ok_or_else(|| session.invalid_transition(target))?;
                let ranked = self.ranker.rank(pool);
                info!(pool = pool.len(), selected = ranked.len(), "test pool ranked");
                session.record_ranking(ranked)?;
            }
            StageInput::Execute => {
                let ranked = session
                    .ranked()
                    .ok_or_else(|| session.invalid_transition(target))?
                    .to_vec();
                let cancel = self.cancel_flag(session_id).await;
                let record = self.coordinator.execute(&session.url, &ranked, cancel.clone()).await?;
                session.cancel_requested = cancel.load(Ordering::SeqCst);
                session.record_execution(record)?;
            }
            StageInput::Report => {
                let analysis = required_analysis(&session, target)?;
                let execution = session
                    .execution()
                    .ok_or_else(|| session.invalid_transition(target))?;
                let report = self.reports.build(
                    &session.id,
                    GameInfo::from(&analysis),
                    &execution.verdicts,
                    &execution.runs,
                );
                info!(
                    total = report.summary.total_tests,
                    pass_rate = report.summary.pass_rate,
                    status = %report.summary.overall_status,
                    "report built"
                );
                feedback = Some(self.reports.knowledge_record(&analysis, &report));
                session.record_report(report)?;
            }
        }

        self.repo.update(session.clone()).await?;
        info!(stage = %session.stage(), "session advanced");
        Ok((session, feedback))
    }

    /// Requests cooperative cancellation of the session's execution.
    ///
    /// Tests not yet started are skipped; in-flight runs finish. Does not wait
    /// for the session lock, so it takes effect while execution is running.
    #[instrument(skip(self), err)]
    pub async fn cancel(&self, session_id: &str) -> DomainResult<()> {
        if !self.repo.exists(session_id).await? {
            return Err(DomainError::SessionNotFound(session_id.to_string()));
        }
        self.cancel_flag(session_id)
            .await
            .store(true, Ordering::SeqCst);
        info!("cancel requested");
        Ok(())
    }

    /// Loads the stored session.
    ///
    /// # Errors
    /// `SessionNotFound` for an unknown or expired id.
    pub async fn get_session(&self, session_id: &str) -> DomainResult<Session> {
        self.load(session_id).await
    }

    /// The stored report.
    ///
    /// # Errors
    /// `InvalidStageTransition` until the session is REPORTED.
    pub async fn get_report(&self, session_id: &str) -> DomainResult<Report> {
        let session = self.load(session_id).await?;
        session
            .report()
            .cloned()
            .ok_or_else(|| DomainError::InvalidStageTransition {
                session_id: session.id.clone(),
                current: session.stage(),
                required: SessionStage::Reported,
            })
    }

    /// Lists stored sessions, optionally filtered by stage.
    ///
    /// # Arguments
    /// - `stage`: Only sessions currently at this stage
    /// - `limit`: Maximum number of sessions returned
    pub async fn list_sessions(
        &self,
        stage: Option<SessionStage>,
        limit: usize,
    ) -> DomainResult<Vec<Session>> {
        self.repo.list(stage, limit).await
    }

    /// Removes sessions untouched for longer than `max_age`.
    #[instrument(skip(self), err)]
    pub async fn expire_sessions(&self, max_age: chrono::Duration) -> DomainResult<Vec<String>> {
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let expired = self.repo.expire_older_than(cutoff).await?;
        if !expired.is_empty() {
            let mut locks = self.locks.lock().await;
            let mut flags = self.cancel_flags.lock().await;
            for id in &expired {
                locks.remove(id);
                flags.remove(id);
            }
            info!(count = expired.len(), "expired sessions");
        }
        Ok(expired)
    }

    /// Applies the configured retention policy.
    pub async fn expire_stale_sessions(&self) -> DomainResult<Vec<String>> {
        self.expire_sessions(self.max_session_age).await
    }

    async fn load(&self, session_id: &str) -> DomainResult<Session> {
        self.repo
            .get(session_id)
            .await?
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }

    async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    async fn cancel_flag(&self, session_id: &str) -> Arc<AtomicBool> {
        self.cancel_flags
            .lock()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    async fn inspect(&self, url: &str) -> DomainResult<GameAnalysis> {
        match timeout(self.inspection_timeout, self.inspector.inspect(url)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(InspectionError::Timeout {
                url: url.to_string(),
                after_ms: self.inspection_timeout.as_millis() as u64,
            }
            .into()),
        }
    }

    /// Best-effort upsert on a background task; the report is already stored.
    fn feed_knowledge(&self, record: KnowledgeRecord) {
        let knowledge = Arc::clone(&self.knowledge);
        let limit = self.knowledge_timeout;
        tokio::spawn(async move {
            let session_id = record.session_id.clone();
            match timeout(limit, knowledge.upsert(record)).await {
                Ok(Ok(())) => debug!(%session_id, "knowledge record stored"),
                Ok(Err(e)) => warn!(%session_id, error = %e, "knowledge upsert failed"),
                Err(_) => warn!(
                    %session_id,
                    timeout_ms = limit.as_millis() as u64,
                    "knowledge upsert timed out"
                ),
            }
        });
    }
}

fn required_analysis(session: &Session, target: SessionStage) -> DomainResult<GameAnalysis> {
    session
        .analysis()
        .cloned()
        .ok_or_else(|| session.invalid_transition(target))
}

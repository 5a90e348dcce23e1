//! Session domain model.
//!
//! A session is one end-to-end testing workflow for a single game URL. Its
//! data lives in [`SessionState`], a sum type with one variant per stage;
//! every variant carries exactly the entities that exist at that stage, so a
//! session holding verdicts without a ranking cannot be constructed. Stages
//! only move forward and none can be skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::execution::RunResult;
use super::game::GameAnalysis;
use super::ranking::RankedTestCase;
use super::report::Report;
use super::test_case::TestCase;
use super::verdict::TestVerdict;
use crate::domain::errors::{DomainError, DomainResult};

/// Session lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStage {
    Created,
    Analyzed,
    Generated,
    Ranked,
    Executed,
    Reported,
}

impl SessionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Analyzed => "ANALYZED",
            Self::Generated => "GENERATED",
            Self::Ranked => "RANKED",
            Self::Executed => "EXECUTED",
            Self::Reported => "REPORTED",
        }
    }

    /// The only stage from which this stage can be entered.
    pub fn predecessor(&self) -> Option<Self> {
        match self {
            Self::Created => None,
            Self::Analyzed => Some(Self::Created),
            Self::Generated => Some(Self::Analyzed),
            Self::Ranked => Some(Self::Generated),
            Self::Executed => Some(Self::Ranked),
            Self::Reported => Some(Self::Executed),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Reported)
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-advancing request; each names exactly one target stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageInput {
    Analyze,
    Generate,
    Rank,
    Execute,
    Report,
}

impl StageInput {
    pub fn target(&self) -> SessionStage {
        match self {
            Self::Analyze => SessionStage::Analyzed,
            Self::Generate => SessionStage::Generated,
            Self::Rank => SessionStage::Ranked,
            Self::Execute => SessionStage::Executed,
            Self::Report => SessionStage::Reported,
        }
    }

    pub fn required(&self) -> SessionStage {
        match self {
            Self::Analyze => SessionStage::Created,
            Self::Generate => SessionStage::Analyzed,
            Self::Rank => SessionStage::Generated,
            Self::Execute => SessionStage::Ranked,
            Self::Report => SessionStage::Executed,
        }
    }
}

/// Outcome of the execution stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// All runs of all tests, grouped by test in ranked order
    pub runs: Vec<RunResult>,
    /// One verdict per ranked test, in ranked order
    pub verdicts: Vec<TestVerdict>,
    /// True when a cancel request stopped scheduling before every test ran
    pub cancelled: bool,
    pub completed_at: DateTime<Utc>,
}

/// Stage-specific session data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Created,
    Analyzed {
        analysis: GameAnalysis,
    },
    Generated {
        analysis: GameAnalysis,
        pool: Vec<TestCase>,
    },
    Ranked {
        analysis: GameAnalysis,
        pool: Vec<TestCase>,
        ranked: Vec<RankedTestCase>,
    },
    Executed {
        analysis: GameAnalysis,
        pool: Vec<TestCase>,
        ranked: Vec<RankedTestCase>,
        execution: ExecutionRecord,
    },
    Reported {
        analysis: GameAnalysis,
        pool: Vec<TestCase>,
        ranked: Vec<RankedTestCase>,
        execution: ExecutionRecord,
        report: Report,
    },
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Created
    }
}

impl SessionState {
    pub fn stage(&self) -> SessionStage {
        match self {
            Self::Created => SessionStage::Created,
            Self::Analyzed { .. } => SessionStage::Analyzed,
            Self::Generated { .. } => SessionStage::Generated,
            Self::Ranked { .. } => SessionStage::Ranked,
            Self::Executed { .. } => SessionStage::Executed,
            Self::Reported { .. } => SessionStage::Reported,
        }
    }
}

/// Timestamp of a stage being entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub stage: SessionStage,
    pub entered_at: DateTime<Utc>,
}

/// One testing workflow for a game URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub url: String,
    pub state: SessionState,
    /// Set once a cancel request was observed
    #[serde(default)]
    pub cancel_requested: bool,
    pub history: Vec<StageEntry>,
    pub created_at: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            url: url.into(),
            state: SessionState::Created,
            cancel_requested: false,
            history: vec![StageEntry {
                stage: SessionStage::Created,
                entered_at: now,
            }],
            created_at: now,
            last_update_time: now,
        }
    }

    /// Creates a new session with a UUID identifier
    pub fn new_with_uuid(url: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), url)
    }

    pub fn stage(&self) -> SessionStage {
        self.state.stage()
    }

    pub fn has_reached(&self, stage: SessionStage) -> bool {
        self.stage() >= stage
    }

    pub fn analysis(&self) -> Option<&GameAnalysis> {
        match &self.state {
            SessionState::Created => None,
            SessionState::Analyzed { analysis }
            | SessionState::Generated { analysis, .. }
            | SessionState::Ranked { analysis, .. }
            | SessionState::Executed { analysis, .. }
            | SessionState::Reported { analysis, .. } => Some(analysis),
        }
    }

    pub fn pool(&self) -> Option<&[TestCase]> {
        match &self.state {
            SessionState::Generated { pool, .. }
            | SessionState::Ranked { pool, .. }
            | SessionState::Executed { pool, .. }
            | SessionState::Reported { pool, .. } => Some(pool),
            _ => None,
        }
    }

    pub fn ranked(&self) -> Option<&[RankedTestCase]> {
        match &self.state {
            SessionState::Ranked { ranked, .. }
            | SessionState::Executed { ranked, .. }
            | SessionState::Reported { ranked, .. } => Some(ranked),
            _ => None,
        }
    }

    pub fn execution(&self) -> Option<&ExecutionRecord> {
        match &self.state {
            SessionState::Executed { execution, .. } | SessionState::Reported { execution, .. } => {
                Some(execution)
            }
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match &self.state {
            SessionState::Reported { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Error describing an attempt to enter `target` from the current stage.
    pub fn invalid_transition(&self, target: SessionStage) -> DomainError {
        DomainError::InvalidStageTransition {
            session_id: self.id.clone(),
            current: self.stage(),
            required: target.predecessor().unwrap_or(SessionStage::Created),
        }
    }

    pub fn record_analysis(&mut self, analysis: GameAnalysis) -> DomainResult<()> {
        match std::mem::take(&mut self.state) {
            SessionState::Created => {
                self.enter(SessionState::Analyzed { analysis });
                Ok(())
            }
            other => self.reject(other, SessionStage::Analyzed),
        }
    }

    pub fn record_pool(&mut self, pool: Vec<TestCase>) -> DomainResult<()> {
        match std::mem::take(&mut self.state) {
            SessionState::Analyzed { analysis } => {
                self.enter(SessionState::Generated { analysis, pool });
                Ok(())
            }
            other => self.reject(other, SessionStage::Generated),
        }
    }

    pub fn record_ranking(&mut self, ranked: Vec<RankedTestCase>) -> DomainResult<()> {
        match std::mem::take(&mut self.state) {
            SessionState::Generated { analysis, pool } => {
                self.enter(SessionState::Ranked {
                    analysis,
                    pool,
                    ranked,
                });
                Ok(())
            }
            other => self.reject(other, SessionStage::Ranked),
        }
    }

    pub fn record_execution(&mut self, execution: ExecutionRecord) -> DomainResult<()> {
        match std::mem::take(&mut self.state) {
            SessionState::Ranked {
                analysis,
                pool,
                ranked,
            } => {
                self.enter(SessionState::Executed {
                    analysis,
                    pool,
                    ranked,
                    execution,
                });
                Ok(())
            }
            other => self.reject(other, SessionStage::Executed),
        }
    }

    pub fn record_report(&mut self, report: Report) -> DomainResult<()> {
        match std::mem::take(&mut self.state) {
            SessionState::Executed {
                analysis,
                pool,
                ranked,
                execution,
            } => {
                self.enter(SessionState::Reported {
                    analysis,
                    pool,
                    ranked,
                    execution,
                    report,
                });
                Ok(())
            }
            other => self.reject(other, SessionStage::Reported),
        }
    }

    fn enter(&mut self, state: SessionState) {
        let now = Utc::now();
        self.history.push(StageEntry {
            stage: state.stage(),
            entered_at: now,
        });
        self.state = state;
        self.last_update_time = now;
    }

    fn reject(&mut self, previous: SessionState, target: SessionStage) -> DomainResult<()> {
        self.state = previous;
        Err(self.invalid_transition(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::test_case::{ActionPlan, Priority, TestCategory};

    fn test_case(id: u32) -> TestCase {
        TestCase {
            id,
            name: format!("case {id}"),
            category: TestCategory::Functional,
            priority: Priority::Medium,
            description: String::new(),
            plan: ActionPlan::default(),
            detection_confidence: None,
        }
    }

    #[test]
    fn test_new_session() {
        let session = Session::new("s1", "https://example.test/game");
        assert_eq!(session.id, "s1");
        assert_eq!(session.stage(), SessionStage::Created);
        assert!(session.analysis().is_none());
        assert_eq!(session.history.len(), 1);
        assert!(!session.cancel_requested);
    }

    #[test]
    fn test_new_session_with_uuid() {
        let a = Session::new_with_uuid("https://example.test");
        let b = Session::new_with_uuid("https://example.test");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_forward_transitions() {
        let mut session = Session::new("s1", "https://example.test");
        session
            .record_analysis(GameAnalysis::new("https://example.test", "sudoku"))
            .unwrap();
        assert_eq!(session.stage(), SessionStage::Analyzed);

        session.record_pool(vec![test_case(1), test_case(2)]).unwrap();
        assert_eq!(session.stage(), SessionStage::Generated);
        assert_eq!(session.pool().map(<[TestCase]>::len), Some(2));
        assert_eq!(session.analysis().unwrap().game_type, "sudoku");
        assert_eq!(session.history.len(), 3);
    }

    #[test]
    fn test_skipping_a_stage_is_rejected_and_state_kept() {
        let mut session = Session::new("s1", "https://example.test");
        let err = session.record_pool(vec![test_case(1)]).unwrap_err();
        match err {
            DomainError::InvalidStageTransition {
                current, required, ..
            } => {
                assert_eq!(current, SessionStage::Created);
                assert_eq!(required, SessionStage::Analyzed);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.stage(), SessionStage::Created);
    }

    #[test]
    fn test_backward_transition_is_rejected() {
        let mut session = Session::new("s1", "https://example.test");
        session
            .record_analysis(GameAnalysis::new("https://example.test", "sudoku"))
            .unwrap();
        let err = session
            .record_analysis(GameAnalysis::new("https://example.test", "other"))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStageTransition { .. }));
        assert_eq!(session.analysis().unwrap().game_type, "sudoku");
    }

    #[test]
    fn test_stage_ordering_and_predecessors() {
        assert!(SessionStage::Created < SessionStage::Analyzed);
        assert!(SessionStage::Executed < SessionStage::Reported);
        assert_eq!(SessionStage::Created.predecessor(), None);
        assert_eq!(
            SessionStage::Reported.predecessor(),
            Some(SessionStage::Executed)
        );
        for input in [
            StageInput::Analyze,
            StageInput::Generate,
            StageInput::Rank,
            StageInput::Execute,
            StageInput::Report,
        ] {
            assert_eq!(input.target().predecessor(), Some(input.required()));
        }
    }

    #[test]
    fn test_state_serializes_with_stage_tag() {
        let mut session = Session::new("s1", "https://example.test");
        session
            .record_analysis(GameAnalysis::new("https://example.test", "sudoku"))
            .unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["state"]["stage"], "ANALYZED");
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }
}

pub mod config;
pub mod execution;
pub mod game;
pub mod knowledge;
pub mod ranking;
pub mod report;
pub mod session;
pub mod test_case;
pub mod verdict;

pub use config::{
    Config, ExecutionConfig, GenerationConfig, InspectionConfig, KnowledgeConfig, LoggingConfig,
    RankingConfig, RateLimitConfig, RetentionConfig,
};
pub use execution::{
    Artifact, ArtifactBundle, FailureSource, JudgeRole, RawVerdict, RunFailure, RunOutcome,
    RunResult, MAX_CONFIDENCE,
};
pub use game::GameAnalysis;
pub use knowledge::{KnowledgeRecord, KnowledgeSignature, KnowledgeSnippet};
pub use ranking::RankedTestCase;
pub use report::{
    ArtifactsSummary, GameInfo, OverallStatus, Report, ReportSummary, ReproducibilityStats,
    Severity, TriageNote,
};
pub use session::{ExecutionRecord, Session, SessionStage, SessionState, StageEntry, StageInput};
pub use test_case::{
    ActionPlan, ActionStep, MalformedTestCase, Priority, RawStep, RawTestCase, TestCase,
    TestCategory,
};
pub use verdict::{FinalResult, TestVerdict};

//! Run-level execution records: artifacts, raw judge verdicts, run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One captured piece of evidence. File storage is the driver's concern;
/// the core only keeps references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Screenshot { reference: String },
    DomSnapshot { reference: String },
    ConsoleLog { entries: Vec<String> },
    NetworkLog { entries: Vec<String> },
    /// Recorded when a run degraded to INDETERMINATE
    FailureRecord { source: FailureSource, message: String },
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Screenshot { .. } => "screenshot",
            Self::DomSnapshot { .. } => "dom_snapshot",
            Self::ConsoleLog { .. } => "console_log",
            Self::NetworkLog { .. } => "network_log",
            Self::FailureRecord { .. } => "failure_record",
        }
    }
}

/// Evidence returned by one browser driver execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub artifacts: Vec<Artifact>,
}

impl ArtifactBundle {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self { artifacts }
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Outcome of a single run as judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Pass,
    Fail,
    Indeterminate,
}

impl RunOutcome {
    pub fn is_determinate(&self) -> bool {
        !matches!(self, Self::Indeterminate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Indeterminate => "INDETERMINATE",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bound of every confidence percentage.
pub const MAX_CONFIDENCE: u8 = 100;

/// Raw verdict from a verdict judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVerdict {
    pub result: RunOutcome,
    /// 0..=100
    pub confidence: u8,
    #[serde(default)]
    pub reasoning: String,
}

impl RawVerdict {
    pub fn new(result: RunOutcome, confidence: u8) -> Self {
        Self {
            result,
            confidence: confidence.min(MAX_CONFIDENCE),
            reasoning: String::new(),
        }
    }

    pub fn indeterminate() -> Self {
        Self::new(RunOutcome::Indeterminate, 0)
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

/// Which judge configuration produced a run's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeRole {
    /// Repeat-validation runs
    Primary,
    /// Tie-breaking run with the alternate judge
    CrossAgent,
}

/// Collaborator that caused a run to degrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSource {
    Driver,
    Judge,
}

impl fmt::Display for FailureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver => f.write_str("driver"),
            Self::Judge => f.write_str("judge"),
        }
    }
}

/// Details of a per-run collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub source: FailureSource,
    /// timeout, navigation, element-not-found, backend, ...
    pub kind: String,
    pub message: String,
}

/// One execution attempt of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub test_id: u32,
    /// 0-based position among this test's runs
    pub run_index: u32,
    pub role: JudgeRole,
    /// Name of the judge variant used
    pub judge: String,
    pub artifacts: Vec<Artifact>,
    pub verdict: RawVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn outcome(&self) -> RunOutcome {
        self.verdict.result
    }
}

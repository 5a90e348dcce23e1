//! Per-test aggregated verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::test_case::{Priority, TestCategory};

/// Final result of a test case across all its runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalResult {
    Pass,
    Fail,
    Flaky,
    Unknown,
}

impl FinalResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Flaky => "FLAKY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FinalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate judgement for one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestVerdict {
    pub test_id: u32,
    pub test_name: String,
    pub category: TestCategory,
    pub priority: Priority,
    pub result: FinalResult,
    /// Mean judge confidence over determinate runs, 0..=100
    pub confidence: u8,
    /// Share of determinate runs agreeing with the majority, 0..=100.
    /// `None` iff `run_count == 0`.
    pub reproducibility: Option<u8>,
    pub run_count: u32,
    pub pass_count: u32,
    pub fail_count: u32,
    pub indeterminate_count: u32,
    pub cross_agent_used: bool,
    pub reason: String,
}

impl TestVerdict {
    pub fn is_pass(&self) -> bool {
        self.result == FinalResult::Pass
    }

    /// Reproducibility as a 0.0..=1.0 fraction, treating an undefined value as 0.
    pub fn reproducibility_fraction(&self) -> f64 {
        f64::from(self.reproducibility.unwrap_or(0)) / 100.0
    }
}

//! Ranked selection of test cases.

use serde::{Deserialize, Serialize};

use super::test_case::TestCase;

/// A selected test case with its score and a human-readable justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTestCase {
    #[serde(flatten)]
    pub test_case: TestCase,
    /// Higher is more valuable
    pub overall_score: f64,
    pub ranking_reason: String,
    /// True when the item entered the selection through the coverage swap
    #[serde(default)]
    pub coverage_swap: bool,
}

impl RankedTestCase {
    pub fn id(&self) -> u32 {
        self.test_case.id
    }
}

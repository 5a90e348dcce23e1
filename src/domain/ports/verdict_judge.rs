use async_trait::async_trait;

use super::errors::JudgeError;
use crate::domain::models::{ArtifactBundle, RawVerdict, TestCase};

/// Port for a vision/language model that judges captured evidence.
///
/// Several variants may be registered (different model, prompt or sampling);
/// the execution coordinator picks the primary and cross-agent variant by name.
#[async_trait]
pub trait VerdictJudge: Send + Sync {
    /// Variant name used in run records and configuration
    fn name(&self) -> &str;

    /// Judge whether the evidence shows the test's expected result.
    async fn judge(
        &self,
        test_case: &TestCase,
        evidence: &ArtifactBundle,
    ) -> Result<RawVerdict, JudgeError>;
}

//! Scripted verdict judge.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::models::{ArtifactBundle, RawVerdict, RunOutcome, TestCase};
use crate::domain::ports::{JudgeError, VerdictJudge};

/// Judge variant that replays queued verdicts per test id.
///
/// Test ids without a queued verdict get the default verdict.
#[derive(Debug)]
pub struct ScriptedJudge {
    name: String,
    default_verdict: Result<RawVerdict, JudgeError>,
    scripts: RwLock<HashMap<u32, VecDeque<Result<RawVerdict, JudgeError>>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedJudge {
    /// A judge that passes everything with confidence 90 unless scripted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_verdict: Ok(RawVerdict::new(RunOutcome::Pass, 90)),
            scripts: RwLock::new(HashMap::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_default_verdict(mut self, verdict: Result<RawVerdict, JudgeError>) -> Self {
        self.default_verdict = verdict;
        self
    }

    /// Sleep this long before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue verdicts for `test_id`, consumed in call order.
    pub async fn script(&self, test_id: u32, verdicts: Vec<Result<RawVerdict, JudgeError>>) {
        self.scripts
            .write()
            .await
            .entry(test_id)
            .or_default()
            .extend(verdicts);
    }

    /// Queue plain outcomes for `test_id` with confidence 80.
    pub async fn script_outcomes(&self, test_id: u32, outcomes: &[RunOutcome]) {
        let verdicts = outcomes
            .iter()
            .map(|outcome| Ok(RawVerdict::new(*outcome, 80)))
            .collect();
        self.script(test_id, verdicts).await;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerdictJudge for ScriptedJudge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn judge(
        &self,
        test_case: &TestCase,
        _evidence: &ArtifactBundle,
    ) -> Result<RawVerdict, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .scripts
            .write()
            .await
            .get_mut(&test_case.id)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| self.default_verdict.clone())
    }
}

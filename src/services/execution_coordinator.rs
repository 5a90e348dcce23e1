//! Execution coordinator.
//!
//! Runs every ranked test case through the browser driver and a verdict
//! judge, repeating and cross-checking as the [`ValidationProtocol`] asks.
//! Tests run concurrently up to `max_concurrency`; the runs of one test are
//! strictly sequential. Each test collects its runs in task-local state and
//! the coordinator only hands back the finished [`ExecutionRecord`].
//!
//! Driver and judge failures, including timeouts, never escape: the run
//! becomes INDETERMINATE and the failure is kept as an artifact.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::validation::{self, NextRun, ValidationProtocol};
use crate::adapters::judges::JudgeRegistry;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Artifact, ExecutionConfig, ExecutionRecord, FailureSource, JudgeRole, RankedTestCase,
    RawVerdict, RunFailure, RunResult, TestCase, TestVerdict, MAX_CONFIDENCE,
};
use crate::domain::ports::{BrowserDriver, DriverError, JudgeError, VerdictJudge};
use crate::infrastructure::TokenBucketRateLimiter;

pub const CANCELLED_REASON: &str = "not executed: session cancelled";

/// Everything one test task needs; cloned into each spawned task.
#[derive(Clone)]
struct RunContext {
    url: Arc<str>,
    driver: Arc<dyn BrowserDriver>,
    primary: Arc<dyn VerdictJudge>,
    cross_agent: Arc<dyn VerdictJudge>,
    rate_limiter: TokenBucketRateLimiter,
    protocol: ValidationProtocol,
    driver_timeout: Duration,
    judge_timeout: Duration,
    cancel: Arc<AtomicBool>,
}

/// Runs and verdict of one test, built in isolation.
struct TestOutcome {
    runs: Vec<RunResult>,
    verdict: TestVerdict,
    interrupted: bool,
}

pub struct ExecutionCoordinator {
    driver: Arc<dyn BrowserDriver>,
    judges: JudgeRegistry,
    rate_limiter: TokenBucketRateLimiter,
    config: ExecutionConfig,
}

impl ExecutionCoordinator {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        judges: JudgeRegistry,
        rate_limiter: TokenBucketRateLimiter,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            driver,
            judges,
            rate_limiter,
            config,
        }
    }

    /// Execute the ranked selection against the game at `url`.
    ///
    /// `cancel` is checked before each test is scheduled and before each
    /// further run of a started test. Tests that never start get an UNKNOWN
    /// verdict with no runs.
    ///
    /// # Errors
    /// Returns `ValidationFailed` when a configured judge variant is not registered.
    #[instrument(skip(self, ranked, cancel), fields(tests = ranked.len()))]
    pub async fn execute(
        &self,
        url: &str,
        ranked: &[RankedTestCase],
        cancel: Arc<AtomicBool>,
    ) -> DomainResult<ExecutionRecord> {
        let context = RunContext {
            url: Arc::from(url),
            driver: self.driver.clone(),
            primary: self.judges.get(&self.config.primary_judge)?,
            cross_agent: self.judges.get(&self.config.cross_agent_judge)?,
            rate_limiter: self.rate_limiter.clone(),
            protocol: ValidationProtocol::new(self.config.repeat_runs),
            driver_timeout: Duration::from_millis(self.config.driver_timeout_ms),
            judge_timeout: Duration::from_millis(self.config.judge_timeout_ms),
            cancel: cancel.clone(),
        };

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(ranked.len());

        for item in ranked {
            let test_case = item.test_case.clone();
            if cancel.load(Ordering::SeqCst) {
                handles.push((test_case, None));
                continue;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ValidationFailed("Semaphore error".to_string()))?;

            // Waiting for a slot can take a while; re-check before starting
            if cancel.load(Ordering::SeqCst) {
                drop(permit);
                handles.push((test_case, None));
                continue;
            }

            let context = context.clone();
            let task_case = test_case.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                run_test(&context, &task_case).await
            });
            handles.push((test_case, Some(handle)));
        }

        let mut runs = Vec::new();
        let mut verdicts = Vec::with_capacity(handles.len());
        let mut cancelled = false;

        for (test_case, handle) in handles {
            let Some(handle) = handle else {
                cancelled = true;
                verdicts.push(validation::not_executed(&test_case, CANCELLED_REASON));
                continue;
            };
            match handle.await {
                Ok(outcome) => {
                    cancelled |= outcome.interrupted;
                    runs.extend(outcome.runs);
                    verdicts.push(outcome.verdict);
                }
                Err(e) => {
                    warn!(test_id = test_case.id, error = %e, "test task aborted");
                    verdicts.push(validation::not_executed(
                        &test_case,
                        format!("not executed: test task aborted ({e})"),
                    ));
                }
            }
        }

        info!(
            tests = verdicts.len(),
            runs = runs.len(),
            cancelled,
            "execution finished"
        );

        Ok(ExecutionRecord {
            runs,
            verdicts,
            cancelled,
            completed_at: Utc::now(),
        })
    }
}

/// Run one test until the protocol is satisfied or cancellation is observed.
async fn run_test(context: &RunContext, test_case: &TestCase) -> TestOutcome {
    let mut runs: Vec<RunResult> = Vec::new();
    let mut interrupted = false;

    loop {
        let (role, judge) = match context.protocol.next_run(&runs) {
            NextRun::Done => break,
            NextRun::Primary => (JudgeRole::Primary, &context.primary),
            NextRun::CrossAgent => (JudgeRole::CrossAgent, &context.cross_agent),
        };
        if !runs.is_empty() && context.cancel.load(Ordering::SeqCst) {
            debug!(test_id = test_case.id, completed = runs.len(), "cancel observed between runs");
            interrupted = true;
            break;
        }
        let run_index = runs.len() as u32;
        runs.push(perform_run(context, test_case, run_index, role, judge.as_ref()).await);
    }

    let mut verdict = validation::aggregate(test_case, &runs);
    if interrupted {
        verdict.reason = format!("{}; remaining runs skipped: session cancelled", verdict.reason);
    }
    debug!(
        test_id = test_case.id,
        result = %verdict.result,
        reproducibility = ?verdict.reproducibility,
        "test verdict"
    );
    TestOutcome {
        runs,
        verdict,
        interrupted,
    }
}

/// One driver execution followed by one judgement.
async fn perform_run(
    context: &RunContext,
    test_case: &TestCase,
    run_index: u32,
    role: JudgeRole,
    judge: &dyn VerdictJudge,
) -> RunResult {
    let started_at = Utc::now();
    let start = Instant::now();

    let driven = timeout(
        context.driver_timeout,
        context.driver.execute(&context.url, &test_case.plan),
    )
    .await
    .unwrap_or_else(|_| {
        Err(DriverError::Timeout {
            after_ms: context.driver_timeout.as_millis() as u64,
        })
    });

    let (mut artifacts, judged) = match driven {
        Ok(bundle) => {
            context.rate_limiter.acquire().await;
            let judged = timeout(context.judge_timeout, judge.judge(test_case, &bundle))
                .await
                .unwrap_or_else(|_| {
                    Err(JudgeError::Timeout {
                        after_ms: context.judge_timeout.as_millis() as u64,
                    })
                })
                .and_then(confidence_in_range)
                .map_err(|e| RunFailure {
                    source: FailureSource::Judge,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            (bundle.artifacts, judged)
        }
        Err(e) => (
            Vec::new(),
            Err(RunFailure {
                source: FailureSource::Driver,
                kind: e.kind().to_string(),
                message: e.to_string(),
            }),
        ),
    };

    let (verdict, failure) = match judged {
        Ok(verdict) => (verdict, None),
        Err(failure) => {
            warn!(
                test_id = test_case.id,
                run_index,
                source = %failure.source,
                kind = %failure.kind,
                error = %failure.message,
                "run degraded to INDETERMINATE"
            );
            artifacts.push(Artifact::FailureRecord {
                source: failure.source,
                message: failure.message.clone(),
            });
            (
                RawVerdict::indeterminate().with_reasoning(failure.message.clone()),
                Some(failure),
            )
        }
    };

    debug!(
        test_id = test_case.id,
        run_index,
        judge = judge.name(),
        result = %verdict.result,
        "run finished"
    );

    RunResult {
        test_id: test_case.id,
        run_index,
        role,
        judge: judge.name().to_string(),
        artifacts,
        verdict,
        failure,
        started_at,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Judges may deserialize any `u8`; anything above 100 is a malformed answer.
fn confidence_in_range(verdict: RawVerdict) -> Result<RawVerdict, JudgeError> {
    if verdict.confidence > MAX_CONFIDENCE {
        return Err(JudgeError::MalformedResponse(format!(
            "confidence {} outside 0..={MAX_CONFIDENCE}",
            verdict.confidence
        )));
    }
    Ok(verdict)
}

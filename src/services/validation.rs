//! Validation protocol.
//!
//! Decides how many runs a test case needs and reconciles their outcomes
//! into a [`TestVerdict`].

use crate::domain::models::{
    FinalResult, JudgeRole, RunOutcome, RunResult, TestCase, TestVerdict, MAX_CONFIDENCE,
};

/// Minimum number of primary runs per test case.
pub const MIN_REPEAT_RUNS: u32 = 2;

/// What the coordinator should do after observing a test's runs so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRun {
    /// Another repeat-validation run with the primary judge
    Primary,
    /// The single tie-breaking run with the cross-agent judge
    CrossAgent,
    Done,
}

/// Repeat and cross-agent validation policy.
#[derive(Debug, Clone, Copy)]
pub struct ValidationProtocol {
    repeat_runs: u32,
}

impl Default for ValidationProtocol {
    fn default() -> Self {
        Self::new(MIN_REPEAT_RUNS)
    }
}

impl ValidationProtocol {
    pub fn new(repeat_runs: u32) -> Self {
        Self {
            repeat_runs: repeat_runs.max(MIN_REPEAT_RUNS),
        }
    }

    pub fn repeat_runs(&self) -> u32 {
        self.repeat_runs
    }

    /// Decide the next run from the runs recorded so far.
    ///
    /// A cross-agent run happens at most once, and only when the determinate
    /// primary results contain both PASS and FAIL. INDETERMINATE runs never
    /// count as disagreement.
    pub fn next_run(&self, runs: &[RunResult]) -> NextRun {
        let primary: Vec<RunOutcome> = runs
            .iter()
            .filter(|r| r.role == JudgeRole::Primary)
            .map(RunResult::outcome)
            .collect();
        if (primary.len() as u32) < self.repeat_runs {
            return NextRun::Primary;
        }
        let cross_agent_done = runs.iter().any(|r| r.role == JudgeRole::CrossAgent);
        if !cross_agent_done && disagree(&primary) {
            return NextRun::CrossAgent;
        }
        NextRun::Done
    }
}

/// True when the determinate outcomes contain both PASS and FAIL.
pub fn disagree(outcomes: &[RunOutcome]) -> bool {
    outcomes.contains(&RunOutcome::Pass) && outcomes.contains(&RunOutcome::Fail)
}

/// Aggregate a test's runs into its verdict.
///
/// - no runs: UNKNOWN, reproducibility undefined
/// - only INDETERMINATE runs: UNKNOWN, reproducibility 0
/// - determinate runs agree: that result, reproducibility 100
/// - determinate runs disagree: FLAKY, reproducibility = majority share, rounded
///
/// Confidence is the rounded mean judge confidence over determinate runs,
/// each run counted at no more than 100.
pub fn aggregate(test_case: &TestCase, runs: &[RunResult]) -> TestVerdict {
    let pass_count = count(runs, RunOutcome::Pass);
    let fail_count = count(runs, RunOutcome::Fail);
    let indeterminate_count = count(runs, RunOutcome::Indeterminate);
    let determinate = pass_count + fail_count;
    let run_count = runs.len() as u32;

    let confidence = if determinate == 0 {
        0
    } else {
        let total: u32 = runs
            .iter()
            .filter(|r| r.outcome().is_determinate())
            .map(|r| u32::from(r.verdict.confidence.min(MAX_CONFIDENCE)))
            .sum();
        (f64::from(total) / f64::from(determinate)).round() as u8
    };

    let (result, reproducibility, reason) = if run_count == 0 {
        (FinalResult::Unknown, None, "no runs recorded".to_string())
    } else if determinate == 0 {
        let kinds = failure_kinds(runs);
        let reason = if kinds.is_empty() {
            format!("all {run_count} runs were indeterminate")
        } else {
            format!("all {run_count} runs were indeterminate ({})", kinds.join(", "))
        };
        (FinalResult::Unknown, Some(0), reason)
    } else if fail_count == 0 {
        (
            FinalResult::Pass,
            Some(100),
            format!("{pass_count} of {determinate} determinate runs passed"),
        )
    } else if pass_count == 0 {
        (
            FinalResult::Fail,
            Some(100),
            format!("{fail_count} of {determinate} determinate runs failed"),
        )
    } else {
        let majority = pass_count.max(fail_count);
        let share = (f64::from(majority) * 100.0 / f64::from(determinate)).round() as u8;
        (
            FinalResult::Flaky,
            Some(share),
            format!("runs disagree: {pass_count} passed, {fail_count} failed"),
        )
    };

    TestVerdict {
        test_id: test_case.id,
        test_name: test_case.name.clone(),
        category: test_case.category,
        priority: test_case.priority,
        result,
        confidence,
        reproducibility,
        run_count,
        pass_count,
        fail_count,
        indeterminate_count,
        cross_agent_used: runs.iter().any(|r| r.role == JudgeRole::CrossAgent),
        reason,
    }
}

/// Verdict for a test that never ran.
pub fn not_executed(test_case: &TestCase, reason: impl Into<String>) -> TestVerdict {
    let mut verdict = aggregate(test_case, &[]);
    verdict.reason = reason.into();
    verdict
}

fn count(runs: &[RunResult], outcome: RunOutcome) -> u32 {
    runs.iter().filter(|r| r.outcome() == outcome).count() as u32
}

fn failure_kinds(runs: &[RunResult]) -> Vec<String> {
    let mut kinds: Vec<String> = Vec::new();
    for failure in runs.iter().filter_map(|r| r.failure.as_ref()) {
        let kind = format!("{} {}", failure.source, failure.kind);
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

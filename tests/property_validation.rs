use chrono::Utc;
use playtest::domain::models::{
    ActionPlan, ActionStep, FinalResult, JudgeRole, Priority, RawVerdict, RunOutcome, RunResult,
    TestCase, TestCategory,
};
use playtest::services::validation::{aggregate, NextRun, ValidationProtocol};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

fn test_case() -> TestCase {
    TestCase {
        id: 1,
        name: "grid accepts digits".to_string(),
        category: TestCategory::Functional,
        priority: Priority::High,
        description: String::new(),
        plan: ActionPlan {
            steps: vec![ActionStep::described("Type 5 into the first cell")],
            expected_result: "Cell shows 5".to_string(),
        },
        detection_confidence: None,
    }
}

fn run(index: u32, role: JudgeRole, outcome: RunOutcome, confidence: u8) -> RunResult {
    RunResult {
        test_id: 1,
        run_index: index,
        role,
        judge: "primary".to_string(),
        artifacts: Vec::new(),
        verdict: RawVerdict::new(outcome, confidence),
        failure: None,
        started_at: Utc::now(),
        duration_ms: 0,
    }
}

fn outcome_strategy() -> impl Strategy<Value = RunOutcome> {
    prop_oneof![
        Just(RunOutcome::Pass),
        Just(RunOutcome::Fail),
        Just(RunOutcome::Indeterminate),
    ]
}

proptest! {
    /// Property: counts add up and reproducibility is defined iff something ran
    #[test]
    fn prop_aggregate_counts(
        outcomes in prop::collection::vec((outcome_strategy(), 0u8..=100), 0..8)
    ) {
        let runs: Vec<RunResult> = outcomes
            .iter()
            .enumerate()
            .map(|(i, (o, c))| run(i as u32 + 1, JudgeRole::Primary, *o, *c))
            .collect();
        let verdict = aggregate(&test_case(), &runs);

        prop_assert_eq!(verdict.run_count as usize, runs.len());
        prop_assert_eq!(
            verdict.pass_count + verdict.fail_count + verdict.indeterminate_count,
            verdict.run_count
        );
        prop_assert_eq!(verdict.reproducibility.is_none(), runs.is_empty());
        prop_assert!(verdict.confidence <= 100);
        if let Some(r) = verdict.reproducibility {
            prop_assert!(r <= 100);
        }
    }

    /// Property: the final result follows the determinate outcomes
    #[test]
    fn prop_aggregate_result(
        outcomes in prop::collection::vec(outcome_strategy(), 1..8)
    ) {
        let runs: Vec<RunResult> = outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| run(i as u32 + 1, JudgeRole::Primary, *o, 80))
            .collect();
        let verdict = aggregate(&test_case(), &runs);

        let expected = match (verdict.pass_count, verdict.fail_count) {
            (0, 0) => FinalResult::Unknown,
            (_, 0) => FinalResult::Pass,
            (0, _) => FinalResult::Fail,
            _ => FinalResult::Flaky,
        };
        prop_assert_eq!(verdict.result, expected);

        if verdict.result == FinalResult::Flaky {
            let repro = verdict.reproducibility.unwrap_or_default();
            prop_assert!((50..100).contains(&repro));
        }
    }

    /// Property: the protocol makes exactly repeat_runs primary runs and one
    /// cross-agent run exactly when determinate primary outcomes disagree
    #[test]
    fn prop_protocol_run_plan(
        repeat_runs in 0u32..5,
        primary_outcomes in prop::collection::vec(outcome_strategy(), 5),
        cross_outcome in outcome_strategy(),
    ) {
        let protocol = ValidationProtocol::new(repeat_runs);
        let mut runs: Vec<RunResult> = Vec::new();
        let mut primary_iter = primary_outcomes.iter();

        loop {
            let index = runs.len() as u32 + 1;
            match protocol.next_run(&runs) {
                NextRun::Primary => {
                    let outcome = *primary_iter.next().ok_or_else(|| {
                        TestCaseError::fail("protocol asked for too many primary runs")
                    })?;
                    runs.push(run(index, JudgeRole::Primary, outcome, 80));
                }
                NextRun::CrossAgent => {
                    runs.push(run(index, JudgeRole::CrossAgent, cross_outcome, 80));
                }
                NextRun::Done => break,
            }
            prop_assert!(runs.len() <= 6);
        }

        let expected_primary = repeat_runs.max(2) as usize;
        let primaries: Vec<RunOutcome> = runs
            .iter()
            .filter(|r| r.role == JudgeRole::Primary)
            .map(RunResult::outcome)
            .collect();
        let cross_runs = runs.iter().filter(|r| r.role == JudgeRole::CrossAgent).count();

        prop_assert_eq!(primaries.len(), expected_primary);
        let disagreement =
            primaries.contains(&RunOutcome::Pass) && primaries.contains(&RunOutcome::Fail);
        prop_assert_eq!(cross_runs, usize::from(disagreement));
    }
}

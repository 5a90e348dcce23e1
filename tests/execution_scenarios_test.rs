//! Execution-stage scenarios: degraded runs, judge variants and cancellation.

mod common;

use std::time::Duration;

use common::{HarnessBuilder, GAME_URL};
use playtest::adapters::scripted::{DriverResponse, ScriptedBrowserDriver, ScriptedJudge};
use playtest::domain::models::{FinalResult, OverallStatus, SessionStage, Severity};
use playtest::domain::ports::{DriverError, JudgeError};
use playtest::services::CANCELLED_REASON;
use playtest::DomainError;

#[tokio::test]
async fn test_driver_failure_degrades_to_unknown_with_triage() {
    let h = HarnessBuilder::new().build();
    let session = h.service.start(GAME_URL).await.unwrap();
    h.service.generate(&session.id).await.unwrap();
    let ranked = h.service.rank(&session.id).await.unwrap();

    let target = ranked.ranked().unwrap()[0].clone();
    h.driver
        .script(
            target.test_case.plan.clone(),
            vec![
                DriverResponse::error(DriverError::Navigation("page crashed".to_string())),
                DriverResponse::error(DriverError::Navigation("page crashed".to_string())),
            ],
        )
        .await;

    h.service.execute(&session.id).await.unwrap();
    let reported = h.service.report(&session.id).await.unwrap();
    let report = reported.report().unwrap();

    let verdict = report
        .test_results
        .iter()
        .find(|v| v.test_id == target.id())
        .unwrap();
    assert_eq!(verdict.result, FinalResult::Unknown);
    assert_eq!(verdict.reproducibility, Some(0));
    assert_eq!(verdict.indeterminate_count, 2);
    assert!(!verdict.cross_agent_used);

    assert_eq!(report.triage_notes.len(), 1);
    let note = &report.triage_notes[0];
    assert_eq!(note.severity, Severity::Critical);
    assert_eq!(note.errors, vec!["navigation failed: page crashed".to_string()]);

    assert_eq!(report.artifacts_summary.by_kind.get("failure_record"), Some(&2));
    assert_eq!(report.summary.inconclusive, 1);
    // 9 of 10 passed with nothing flaky
    assert_eq!(report.summary.overall_status, OverallStatus::Healthy);
}

#[tokio::test]
async fn test_judge_outage_makes_every_verdict_inconclusive() {
    let h = HarnessBuilder::new()
        .primary(
            ScriptedJudge::new("primary")
                .with_default_verdict(Err(JudgeError::Backend("503 from model".to_string()))),
        )
        .build();

    let session = h.service.run_pipeline(GAME_URL).await.unwrap();
    let report = session.report().unwrap();

    assert_eq!(report.summary.total_tests, 10);
    assert_eq!(report.summary.inconclusive, 10);
    assert!(report.summary.pass_rate.abs() < f64::EPSILON);
    assert_eq!(report.summary.overall_status, OverallStatus::Critical);
    assert_eq!(h.cross_agent.calls(), 0);
    assert!(report
        .triage_notes
        .iter()
        .all(|n| n.errors == vec!["judge backend error: 503 from model".to_string()]));
}

#[tokio::test]
async fn test_unregistered_judge_variant_fails_before_any_run() {
    let h = HarnessBuilder::new()
        .config(|c| c.execution.cross_agent_judge = "vision-v2".to_string())
        .build();
    let session = h.service.start(GAME_URL).await.unwrap();
    h.service.generate(&session.id).await.unwrap();
    h.service.rank(&session.id).await.unwrap();

    let err = h.service.execute(&session.id).await.unwrap_err();
    match err {
        DomainError::ValidationFailed(message) => assert!(message.contains("vision-v2")),
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert_eq!(h.driver.calls(), 0);
    assert_eq!(
        h.service.get_session(&session.id).await.unwrap().stage(),
        SessionStage::Ranked
    );
}

#[tokio::test]
async fn test_cancel_during_execution_keeps_finished_tests() {
    let h = HarnessBuilder::new()
        .config(|c| c.execution.max_concurrency = 1)
        .driver(ScriptedBrowserDriver::with_default_response(
            DriverResponse::delayed(Duration::from_millis(100)),
        ))
        .build();
    let session = h.service.start(GAME_URL).await.unwrap();
    h.service.generate(&session.id).await.unwrap();
    h.service.rank(&session.id).await.unwrap();

    let execution = {
        let service = h.service.clone();
        let id = session.id.clone();
        tokio::spawn(async move { service.execute(&id).await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    h.service.cancel(&session.id).await.unwrap();

    let executed = execution.await.unwrap().unwrap();
    assert_eq!(executed.stage(), SessionStage::Executed);
    assert!(executed.cancel_requested);

    let record = executed.execution().unwrap();
    assert!(record.cancelled);
    assert_eq!(record.verdicts.len(), 10);

    let skipped = record
        .verdicts
        .iter()
        .filter(|v| v.reason == CANCELLED_REASON)
        .count();
    let finished = record.verdicts.iter().filter(|v| v.run_count > 0).count();
    assert!(finished >= 1, "the in-flight test finishes");
    assert!(skipped >= 1, "queued tests are skipped");
    assert!(record
        .verdicts
        .iter()
        .filter(|v| v.run_count == 0)
        .all(|v| v.result == FinalResult::Unknown && v.reproducibility.is_none()));
    assert!(h.driver.calls() < 20);
}

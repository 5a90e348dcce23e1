//! End-to-end tests of the session state machine with scripted collaborators.

mod common;

use std::sync::Arc;

use common::{wait_for_records, HarnessBuilder, UnavailableKnowledgeStore, GAME_URL};
use playtest::adapters::memory::InMemoryKnowledgeStore;
use playtest::adapters::scripted::{balanced_pool, ScriptedGenerationBackend, StaticInspector};
use playtest::domain::models::{
    FinalResult, OverallStatus, RunOutcome, SessionStage, TestCategory,
};
use playtest::domain::ports::{InspectionError, SessionRepository};
use playtest::services::CANCELLED_REASON;
use playtest::DomainError;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_full_pipeline_produces_healthy_report() {
    common::setup_test_logging();
    let h = HarnessBuilder::new().build();

    let session = h.service.run_pipeline(GAME_URL).await.unwrap();
    assert_eq!(session.stage(), SessionStage::Reported);
    assert_eq!(session.pool().unwrap().len(), 24);

    let ranked = session.ranked().unwrap();
    assert_eq!(ranked.len(), 10);
    for mandatory in TestCategory::ALL.iter().filter(|c| c.is_mandatory()) {
        assert!(
            ranked.iter().any(|r| r.test_case.category == *mandatory),
            "{mandatory} missing from selection"
        );
    }

    let report = h.service.get_report(&session.id).await.unwrap();
    assert_eq!(report.report_id, format!("report-{}", session.id));
    assert_eq!(report.summary.total_tests, 10);
    assert_eq!(report.summary.passed, 10);
    assert!((report.summary.pass_rate - 100.0).abs() < f64::EPSILON);
    assert_eq!(report.summary.overall_status, OverallStatus::Healthy);
    assert!(report.triage_notes.is_empty());
    assert_eq!(report.game_info.url, GAME_URL);
    assert_eq!(report.game_info.element_count, 81);

    // Verdicts keep ranked order
    let verdict_ids: Vec<u32> = report.test_results.iter().map(|v| v.test_id).collect();
    let ranked_ids: Vec<u32> = ranked.iter().map(|r| r.id()).collect();
    assert_eq!(verdict_ids, ranked_ids);

    // Two primary runs per test, no disagreement
    assert_eq!(h.primary.calls(), 20);
    assert_eq!(h.cross_agent.calls(), 0);
    assert_eq!(h.driver.calls(), 20);
}

#[tokio::test]
async fn test_disagreement_yields_flaky_verdict() {
    let h = HarnessBuilder::new().build();
    h.primary
        .script_outcomes(1, &[RunOutcome::Pass, RunOutcome::Fail])
        .await;

    let session = h.service.run_pipeline(GAME_URL).await.unwrap();
    let report = h.service.get_report(&session.id).await.unwrap();

    let flaky = report
        .test_results
        .iter()
        .find(|v| v.test_id == 1)
        .expect("test 1 is ranked first");
    assert_eq!(flaky.result, FinalResult::Flaky);
    assert_eq!(flaky.run_count, 3);
    assert!(flaky.cross_agent_used);
    assert_eq!(flaky.reproducibility, Some(67));
    assert_eq!(h.cross_agent.calls(), 1);

    assert_eq!(report.summary.flaky, 1);
    assert_eq!(report.summary.passed, 9);
    assert_eq!(report.summary.overall_status, OverallStatus::Moderate);
    assert_eq!(report.triage_notes.len(), 1);
    assert_eq!(report.triage_notes[0].test_id, 1);
}

#[tokio::test]
async fn test_repeated_stage_requests_return_cached_session() {
    let h = HarnessBuilder::new().build();
    let session = h.service.start(GAME_URL).await.unwrap();

    let generated = assert_ok!(h.service.generate(&session.id).await);
    let again = assert_ok!(h.service.generate(&session.id).await);
    let analyzed_again = assert_ok!(h.service.analyze(&session.id).await);

    assert_eq!(generated.pool(), again.pool());
    assert_eq!(analyzed_again.stage(), SessionStage::Generated);
    assert_eq!(h.backend.requests().await.len(), 1);
    assert_eq!(h.inspector.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_advances_run_component_once() {
    let h = HarnessBuilder::new().build();
    let session = h.service.start(GAME_URL).await.unwrap();

    let first = {
        let service = Arc::clone(&h.service);
        let id = session.id.clone();
        tokio::spawn(async move { service.generate(&id).await })
    };
    let second = {
        let service = Arc::clone(&h.service);
        let id = session.id.clone();
        tokio::spawn(async move { service.generate(&id).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first.pool(), second.pool());
    assert_eq!(h.backend.requests().await.len(), 1);
}

#[tokio::test]
async fn test_out_of_order_stage_is_rejected() {
    let h = HarnessBuilder::new().build();
    let session = h.service.start(GAME_URL).await.unwrap();

    let err = assert_err!(h.service.execute(&session.id).await);
    assert!(matches!(
        err,
        DomainError::InvalidStageTransition {
            current: SessionStage::Analyzed,
            required: SessionStage::Ranked,
            ..
        }
    ));
    assert_eq!(h.driver.calls(), 0);
}

#[tokio::test]
async fn test_unknown_session_id() {
    let h = HarnessBuilder::new().build();
    assert!(matches!(
        h.service.get_session("nope").await,
        Err(DomainError::SessionNotFound(id)) if id == "nope"
    ));
    assert!(matches!(
        h.service.report("nope").await,
        Err(DomainError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn test_insufficient_pool_keeps_session_analyzed() {
    let h = HarnessBuilder::new()
        .backend(ScriptedGenerationBackend::balanced(5))
        .build();
    let session = h.service.start(GAME_URL).await.unwrap();

    let err = assert_err!(h.service.generate(&session.id).await);
    match err {
        DomainError::InsufficientTestCases {
            produced, required, ..
        } => {
            assert_eq!(produced, 5);
            assert_eq!(required, 20);
        }
        other => panic!("expected InsufficientTestCases, got {other:?}"),
    }
    assert_eq!(h.backend.requests().await.len(), 3);
    assert_eq!(
        h.service.get_session(&session.id).await.unwrap().stage(),
        SessionStage::Analyzed
    );
}

#[tokio::test]
async fn test_pool_completed_on_retry() {
    let h = HarnessBuilder::new()
        .backend(ScriptedGenerationBackend::new(vec![
            Ok(balanced_pool(12)),
            Ok(balanced_pool(24)),
        ]))
        .build();

    let session = h.service.start(GAME_URL).await.unwrap();
    let session = h.service.generate(&session.id).await.unwrap();

    // The second attempt repeats the first twelve names; duplicates are dropped
    assert_eq!(session.pool().unwrap().len(), 24);
    let requests = h.backend.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests[1].prompt_budget > requests[0].prompt_budget);
}

#[tokio::test]
async fn test_inspection_failure_allows_retry_from_created() {
    let h = HarnessBuilder::new()
        .inspector(StaticInspector::failing(InspectionError::UnsupportedContent {
            url: GAME_URL.to_string(),
            reason: "no canvas or grid found".to_string(),
        }))
        .build();

    let err = h.service.start(GAME_URL).await.unwrap_err();
    assert!(matches!(err, DomainError::Inspection(_)));

    let sessions = h.service.list_sessions(None, 10).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].stage(), SessionStage::Created);
}

#[tokio::test]
async fn test_cancel_before_execution_skips_every_test() {
    let h = HarnessBuilder::new().build();
    let session = h.service.start(GAME_URL).await.unwrap();
    h.service.generate(&session.id).await.unwrap();
    h.service.rank(&session.id).await.unwrap();

    h.service.cancel(&session.id).await.unwrap();
    let executed = h.service.execute(&session.id).await.unwrap();

    assert_eq!(executed.stage(), SessionStage::Executed);
    assert!(executed.cancel_requested);
    let record = executed.execution().unwrap();
    assert!(record.cancelled);
    assert!(record.runs.is_empty());
    assert_eq!(record.verdicts.len(), 10);
    for verdict in &record.verdicts {
        assert_eq!(verdict.result, FinalResult::Unknown);
        assert_eq!(verdict.run_count, 0);
        assert_eq!(verdict.reproducibility, None);
        assert_eq!(verdict.reason, CANCELLED_REASON);
    }
    assert_eq!(h.driver.calls(), 0);

    let reported = h.service.report(&session.id).await.unwrap();
    let report = reported.report().unwrap();
    assert_eq!(report.summary.inconclusive, 10);
    assert_eq!(report.summary.overall_status, OverallStatus::Critical);
}

#[tokio::test]
async fn test_knowledge_failure_does_not_block_report() {
    let h = HarnessBuilder::new()
        .knowledge(Arc::new(UnavailableKnowledgeStore))
        .build();

    let session = h.service.run_pipeline(GAME_URL).await.unwrap();
    assert_eq!(session.stage(), SessionStage::Reported);
    assert!(h.backend.requests().await[0].knowledge.is_empty());

    let stored = h.repo.get(&session.id).await.unwrap().unwrap();
    assert!(stored.report().is_some());
}

#[tokio::test]
async fn test_report_feeds_knowledge_for_next_session() {
    let store = Arc::new(InMemoryKnowledgeStore::new());
    let h = HarnessBuilder::new().knowledge(store.clone()).build();

    let first = h.service.run_pipeline(GAME_URL).await.unwrap();
    let records = wait_for_records(&store, 1, 2000).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id, first.id);

    let second = h.service.start(GAME_URL).await.unwrap();
    h.service.generate(&second.id).await.unwrap();

    let requests = h.backend.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests[0].knowledge.is_empty());
    assert_eq!(requests[1].knowledge.len(), 1);
    assert!(requests[1].knowledge[0].content.contains("sudoku"));
}

#[tokio::test]
async fn test_get_report_requires_reported_stage() {
    let h = HarnessBuilder::new().build();
    let session = h.service.start(GAME_URL).await.unwrap();
    h.service.generate(&session.id).await.unwrap();
    h.service.rank(&session.id).await.unwrap();
    h.service.execute(&session.id).await.unwrap();

    assert!(matches!(
        h.service.get_report(&session.id).await,
        Err(DomainError::InvalidStageTransition {
            current: SessionStage::Executed,
            required: SessionStage::Reported,
            ..
        })
    ));
    let reported = h.service.report(&session.id).await.unwrap();
    assert_eq!(
        reported.report(),
        Some(&h.service.get_report(&session.id).await.unwrap())
    );
}

#[tokio::test]
async fn test_history_records_every_stage() {
    let h = HarnessBuilder::new().build();
    let session = h.service.run_pipeline(GAME_URL).await.unwrap();

    let stages: Vec<SessionStage> = session.history.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            SessionStage::Created,
            SessionStage::Analyzed,
            SessionStage::Generated,
            SessionStage::Ranked,
            SessionStage::Executed,
            SessionStage::Reported,
        ]
    );
}

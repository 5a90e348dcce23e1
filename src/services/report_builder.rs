//! Report builder.
//!
//! Turns a session's verdicts and runs into the immutable [`Report`]:
//! summary and health status, reproducibility statistics, severity-ordered
//! triage notes, grouped recommendations and an artifact census. Building is
//! pure; the knowledge feedback record is derived from the finished report.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::models::{
    ArtifactsSummary, FinalResult, GameAnalysis, GameInfo, KnowledgeRecord, OverallStatus,
    Report, ReportSummary, ReproducibilityStats, RunResult, Severity, TestCategory, TestVerdict,
    TriageNote,
};

/// Maximum distinct run errors attached to one triage note.
const MAX_NOTE_ERRORS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the report for a session from its verdicts (in ranked order) and runs.
    pub fn build(
        &self,
        session_id: &str,
        game_info: GameInfo,
        verdicts: &[TestVerdict],
        runs: &[RunResult],
    ) -> Report {
        let summary = summarize(verdicts);
        let reproducibility_stats = reproducibility_stats(verdicts);
        let recommendations = recommendations(verdicts, &summary, &reproducibility_stats);

        Report {
            report_id: format!("report-{session_id}"),
            session_id: session_id.to_string(),
            generated_at: Utc::now(),
            game_info,
            summary,
            test_results: verdicts.to_vec(),
            reproducibility_stats,
            triage_notes: triage_notes(verdicts, runs),
            recommendations,
            artifacts_summary: artifacts_summary(runs),
        }
    }

    /// Compact record pushed to the knowledge store after reporting.
    pub fn knowledge_record(&self, analysis: &GameAnalysis, report: &Report) -> KnowledgeRecord {
        let categories_with = |result: FinalResult| -> Vec<TestCategory> {
            report
                .test_results
                .iter()
                .filter(|v| v.result == result)
                .map(|v| v.category)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        KnowledgeRecord {
            session_id: report.session_id.clone(),
            game_type: analysis.game_type.clone(),
            mechanics: analysis.mechanics.clone(),
            failing_categories: categories_with(FinalResult::Fail),
            flaky_categories: categories_with(FinalResult::Flaky),
            pass_rate: report.summary.pass_rate,
            recorded_at: report.generated_at,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn summarize(verdicts: &[TestVerdict]) -> ReportSummary {
    let count = |result: FinalResult| verdicts.iter().filter(|v| v.result == result).count() as u32;
    let total_tests = verdicts.len() as u32;
    let passed = count(FinalResult::Pass);
    let flaky = count(FinalResult::Flaky);
    let pass_rate = if total_tests == 0 {
        0.0
    } else {
        round2(f64::from(passed) * 100.0 / f64::from(total_tests))
    };

    ReportSummary {
        total_tests,
        passed,
        failed: count(FinalResult::Fail),
        flaky,
        inconclusive: count(FinalResult::Unknown),
        pass_rate,
        overall_status: overall_status(pass_rate, flaky),
    }
}

pub fn overall_status(pass_rate: f64, flaky: u32) -> OverallStatus {
    if pass_rate >= 90.0 && flaky == 0 {
        OverallStatus::Healthy
    } else if pass_rate >= 75.0 {
        OverallStatus::Moderate
    } else if pass_rate >= 50.0 {
        OverallStatus::Concerning
    } else {
        OverallStatus::Critical
    }
}

/// Severity grows with the risk `1 - reproducibility * confidence`.
///
/// An undefined reproducibility counts as 0, so a test with no evidence is
/// CRITICAL. A FAIL is never below HIGH.
pub fn severity(verdict: &TestVerdict) -> Severity {
    let risk = 1.0 - verdict.reproducibility_fraction() * f64::from(verdict.confidence) / 100.0;
    let tier = if risk >= 0.75 {
        Severity::Critical
    } else if risk >= 0.5 {
        Severity::High
    } else if risk >= 0.25 {
        Severity::Medium
    } else {
        Severity::Low
    };
    if verdict.result == FinalResult::Fail {
        tier.max(Severity::High)
    } else {
        tier
    }
}

pub fn recommended_action(verdict: &TestVerdict) -> &'static str {
    match verdict.result {
        FinalResult::Fail if verdict.reproducibility == Some(100) => {
            "Consistent failure - investigate root cause immediately"
        }
        FinalResult::Fail => "Intermittent failure - check for race conditions or async issues",
        FinalResult::Flaky if verdict.pass_count > verdict.fail_count => {
            "Mostly passing - tighten test conditions or add waits"
        }
        FinalResult::Flaky => "Highly unstable - review test design and environment",
        FinalResult::Unknown if verdict.run_count == 0 => {
            "Not executed - rerun execution to collect evidence"
        }
        FinalResult::Unknown => "Inconclusive - review browser driver and judge logs",
        FinalResult::Pass => "No action needed",
    }
}

/// One note per non-PASS verdict, most severe first, stable within a tier.
pub fn triage_notes(verdicts: &[TestVerdict], runs: &[RunResult]) -> Vec<TriageNote> {
    let mut notes: Vec<TriageNote> = verdicts
        .iter()
        .filter(|v| !v.is_pass())
        .map(|v| {
            let mut errors: Vec<String> = Vec::new();
            for failure in runs
                .iter()
                .filter(|r| r.test_id == v.test_id)
                .filter_map(|r| r.failure.as_ref())
            {
                if errors.len() < MAX_NOTE_ERRORS && !errors.contains(&failure.message) {
                    errors.push(failure.message.clone());
                }
            }
            TriageNote {
                test_id: v.test_id,
                test_name: v.test_name.clone(),
                severity: severity(v),
                issue: format!("{}: {}", v.result, v.reason),
                recommended_action: recommended_action(v).to_string(),
                errors,
            }
        })
        .collect();
    notes.sort_by(|a, b| b.severity.cmp(&a.severity));
    notes
}

pub fn reproducibility_stats(verdicts: &[TestVerdict]) -> ReproducibilityStats {
    let values: Vec<u8> = verdicts.iter().filter_map(|v| v.reproducibility).collect();
    if values.is_empty() {
        return ReproducibilityStats {
            average: 0.0,
            min: 0,
            max: 0,
            highly_reproducible: 0,
            low_reproducibility: 0,
        };
    }
    let sum: u32 = values.iter().copied().map(u32::from).sum();
    ReproducibilityStats {
        average: round2(f64::from(sum) / values.len() as f64),
        min: values.iter().copied().min().unwrap_or(0),
        max: values.iter().copied().max().unwrap_or(0),
        highly_reproducible: values.iter().filter(|v| **v >= 90).count() as u32,
        low_reproducibility: values.iter().filter(|v| **v < 70).count() as u32,
    }
}

pub fn recommendations(
    verdicts: &[TestVerdict],
    summary: &ReportSummary,
    stats: &ReproducibilityStats,
) -> Vec<String> {
    if summary.total_tests == 0 {
        return vec!["No test verdicts were recorded. Rerun execution before drawing conclusions.".to_string()];
    }

    let mut recommendations = Vec::new();

    let mut by_category: BTreeMap<TestCategory, Vec<&str>> = BTreeMap::new();
    for verdict in verdicts.iter().filter(|v| !v.is_pass()) {
        by_category
            .entry(verdict.category)
            .or_default()
            .push(&verdict.test_name);
    }
    for (category, names) in &by_category {
        recommendations.push(format!(
            "{} {category} test(s) did not pass: {}. Review {category} behaviour first.",
            names.len(),
            names.join(", ")
        ));
    }

    if summary.pass_rate < 50.0 {
        recommendations.push(
            "Critical: Pass rate is below 50%. Prioritize fixing core functionality tests."
                .to_string(),
        );
    } else if summary.pass_rate < 80.0 {
        recommendations
            .push("Warning: Pass rate is below 80%. Review and fix failing tests.".to_string());
    }

    if summary.flaky > 0 {
        recommendations.push(format!(
            "Found {} flaky test(s). Consider adding explicit waits or stabilizing the test environment.",
            summary.flaky
        ));
    }

    if stats.low_reproducibility > 0 || stats.average < 80.0 {
        recommendations.push(format!(
            "Average reproducibility is {:.0}% with {} test(s) below 70%. Tests may be affected by timing issues or external factors.",
            stats.average, stats.low_reproducibility
        ));
    }

    if summary.inconclusive > 0 {
        recommendations.push(format!(
            "{} test(s) were inconclusive. Review test execution logs for errors.",
            summary.inconclusive
        ));
    }

    if recommendations.is_empty() {
        recommendations.push("Test suite is healthy. Consider expanding test coverage.".to_string());
    }
    recommendations
}

pub fn artifacts_summary(runs: &[RunResult]) -> ArtifactsSummary {
    let mut by_kind: BTreeMap<String, u32> = BTreeMap::new();
    for artifact in runs.iter().flat_map(|r| r.artifacts.iter()) {
        *by_kind.entry(artifact.kind().to_string()).or_insert(0) += 1;
    }
    ArtifactsSummary {
        total_artifacts: by_kind.values().sum(),
        by_kind,
    }
}

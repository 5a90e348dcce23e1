//! Session-level report model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::game::GameAnalysis;
use super::verdict::TestVerdict;

/// Health classification of a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Healthy,
    Moderate,
    Concerning,
    Critical,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Healthy => "HEALTHY",
            Self::Moderate => "MODERATE",
            Self::Concerning => "CONCERNING",
            Self::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Triage severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_tests: u32,
    pub passed: u32,
    pub failed: u32,
    pub flaky: u32,
    /// UNKNOWN verdicts
    pub inconclusive: u32,
    /// 0.0..=100.0
    pub pass_rate: f64,
    pub overall_status: OverallStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReproducibilityStats {
    pub average: f64,
    pub min: u8,
    pub max: u8,
    /// Verdicts with reproducibility >= 90
    pub highly_reproducible: u32,
    /// Verdicts with reproducibility < 70
    pub low_reproducibility: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageNote {
    pub test_id: u32,
    pub test_name: String,
    pub severity: Severity,
    pub issue: String,
    pub recommended_action: String,
    /// Distinct run error messages, at most three
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub url: String,
    pub game_type: String,
    pub element_count: u32,
    pub mechanics: Vec<String>,
}

impl From<&GameAnalysis> for GameInfo {
    fn from(analysis: &GameAnalysis) -> Self {
        Self {
            url: analysis.url.clone(),
            game_type: analysis.game_type.clone(),
            element_count: analysis.element_count,
            mechanics: analysis.mechanics.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactsSummary {
    pub total_artifacts: u32,
    pub by_kind: BTreeMap<String, u32>,
}

/// Immutable session report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub game_info: GameInfo,
    pub summary: ReportSummary,
    /// Per-test results in ranked order
    pub test_results: Vec<TestVerdict>,
    pub reproducibility_stats: ReproducibilityStats,
    pub triage_notes: Vec<TriageNote>,
    pub recommendations: Vec<String>,
    pub artifacts_summary: ArtifactsSummary,
}

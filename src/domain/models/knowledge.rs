//! Knowledge store records used for progressive learning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::game::GameAnalysis;
use super::test_case::TestCategory;

/// Similarity lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSignature {
    pub game_type: String,
    pub mechanics: Vec<String>,
}

impl KnowledgeSignature {
    pub fn from_analysis(analysis: &GameAnalysis) -> Self {
        Self {
            game_type: analysis.game_type.clone(),
            mechanics: analysis.mechanics.clone(),
        }
    }
}

/// A prior-knowledge excerpt returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub id: String,
    pub content: String,
    /// Similarity, higher is closer
    pub score: f64,
}

/// Compact outcome of one session pushed back to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub session_id: String,
    pub game_type: String,
    pub mechanics: Vec<String>,
    /// Categories with at least one FAIL verdict
    pub failing_categories: Vec<TestCategory>,
    /// Categories with at least one FLAKY verdict
    pub flaky_categories: Vec<TestCategory>,
    pub pass_rate: f64,
    pub recorded_at: DateTime<Utc>,
}

impl KnowledgeRecord {
    pub fn signature(&self) -> KnowledgeSignature {
        KnowledgeSignature {
            game_type: self.game_type.clone(),
            mechanics: self.mechanics.clone(),
        }
    }

    /// Text form used as the snippet content when the record is retrieved later.
    pub fn summary_text(&self) -> String {
        let join = |cats: &[TestCategory]| {
            if cats.is_empty() {
                "none".to_string()
            } else {
                cats.iter().map(TestCategory::as_str).collect::<Vec<_>>().join(", ")
            }
        };
        format!(
            "{} game ({}): pass rate {:.0}%; failures in {}; flaky in {}",
            self.game_type,
            self.mechanics.join(", "),
            self.pass_rate,
            join(&self.failing_categories),
            join(&self.flaky_categories),
        )
    }
}

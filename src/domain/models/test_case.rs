//! Test case domain model.
//!
//! Test cases are named test intents produced by the generator. The
//! generation backend speaks a loose record shape ([`RawTestCase`]); it is
//! validated into a [`TestCase`] at the generator boundary and nothing
//! loosely typed travels further downstream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority assigned by the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Priority {
    /// Ranking weight (CRITICAL=4 .. LOW=1).
    pub const fn weight(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "normal" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "blocker" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test category.
///
/// The first five variants are mandatory: every generated pool must span
/// them and the ranker guarantees they survive into the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestCategory {
    Functional,
    Boundary,
    EdgeCase,
    StateConsistency,
    UiResponsiveness,
    Performance,
    Usability,
}

impl TestCategory {
    pub const MANDATORY: [Self; 5] = [
        Self::Functional,
        Self::Boundary,
        Self::EdgeCase,
        Self::StateConsistency,
        Self::UiResponsiveness,
    ];

    pub const ALL: [Self; 7] = [
        Self::Functional,
        Self::Boundary,
        Self::EdgeCase,
        Self::StateConsistency,
        Self::UiResponsiveness,
        Self::Performance,
        Self::Usability,
    ];

    pub fn is_mandatory(&self) -> bool {
        Self::MANDATORY.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::Boundary => "boundary",
            Self::EdgeCase => "edge-case",
            Self::StateConsistency => "state-consistency",
            Self::UiResponsiveness => "ui-responsiveness",
            Self::Performance => "performance",
            Self::Usability => "usability",
        }
    }

    /// Parse a category name, accepting the aliases generation backends tend to emit.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "functional" | "function" | "core" => Some(Self::Functional),
            "boundary" | "boundaries" | "limit" | "limits" => Some(Self::Boundary),
            "edge-case" | "edge-cases" | "edge" | "edgecase" => Some(Self::EdgeCase),
            "state-consistency" | "state" | "consistency" | "state-management" => {
                Some(Self::StateConsistency)
            }
            "ui-responsiveness" | "ui" | "responsiveness" | "ui-ux" | "ux" => {
                Some(Self::UiResponsiveness)
            }
            "performance" | "perf" => Some(Self::Performance),
            "usability" | "accessibility" => Some(Self::Usability),
            _ => None,
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interaction step of an action plan. Opaque to the core; only the
/// browser driver interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStep {
    /// Free-text step description (e.g. "Click the restart button")
    pub description: String,
    /// Optional action hint (click, type, wait, verify, navigate)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Optional target selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Optional input value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ActionStep {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            action: None,
            target: None,
            value: None,
        }
    }
}

/// Ordered interaction steps plus the expected outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub steps: Vec<ActionStep>,
    #[serde(default)]
    pub expected_result: String,
}

/// A validated test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique within the session; equals the 1-based generation order
    pub id: u32,
    pub name: String,
    pub category: TestCategory,
    pub priority: Priority,
    pub description: String,
    pub plan: ActionPlan,
    /// Backend's own estimate (0.0-1.0) that this test surfaces a defect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_confidence: Option<f64>,
}

impl TestCase {
    /// Key used to reject duplicates within a pool.
    pub fn dedup_key(&self) -> (String, TestCategory) {
        (self.name.trim().to_lowercase(), self.category)
    }
}

/// A step as emitted by a generation backend: either a bare string or a
/// structured object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStep {
    Text(String),
    Structured(ActionStep),
}

/// Loosely typed test case record straight from a generation backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTestCase {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<RawStep>,
    #[serde(default)]
    pub expected_result: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Why a raw record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTestCase {
    #[error("missing or empty name")]
    MissingName,
    #[error("missing category")]
    MissingCategory,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown priority: {0}")]
    UnknownPriority(String),
    #[error("action plan has no steps")]
    EmptyPlan,
}

impl RawTestCase {
    /// Validate into a [`TestCase`] carrying the given id.
    ///
    /// Required: name, category, at least one non-empty step.
    /// Optional: priority (MEDIUM), description, expected result, confidence (clamped to 0..1).
    pub fn validate(self, id: u32) -> Result<TestCase, MalformedTestCase> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(MalformedTestCase::MissingName)?;

        let raw_category = self.category.ok_or(MalformedTestCase::MissingCategory)?;
        let category = TestCategory::from_str(&raw_category)
            .ok_or(MalformedTestCase::UnknownCategory(raw_category))?;

        let priority = match self.priority {
            Some(p) if !p.trim().is_empty() => {
                Priority::from_str(&p).ok_or(MalformedTestCase::UnknownPriority(p))?
            }
            _ => Priority::default(),
        };

        let steps: Vec<ActionStep> = self
            .steps
            .into_iter()
            .map(|step| match step {
                RawStep::Text(text) => ActionStep::described(text.trim()),
                RawStep::Structured(step) => step,
            })
            .filter(|step| !step.description.trim().is_empty())
            .collect();
        if steps.is_empty() {
            return Err(MalformedTestCase::EmptyPlan);
        }

        let detection_confidence = self
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0));

        Ok(TestCase {
            id,
            name,
            category,
            priority,
            description: self.description.unwrap_or_default(),
            plan: ActionPlan {
                steps,
                expected_result: self.expected_result.unwrap_or_default(),
            },
            detection_confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, category: &str) -> RawTestCase {
        RawTestCase {
            name: Some(name.to_string()),
            category: Some(category.to_string()),
            steps: vec![RawStep::Text("Load the game".to_string())],
            ..Default::default()
        }
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(TestCategory::from_str("ui"), Some(TestCategory::UiResponsiveness));
        assert_eq!(TestCategory::from_str("edge_case"), Some(TestCategory::EdgeCase));
        assert_eq!(TestCategory::from_str("Edge Case"), Some(TestCategory::EdgeCase));
        assert_eq!(TestCategory::from_str("state"), Some(TestCategory::StateConsistency));
        assert_eq!(TestCategory::from_str("security"), None);
    }

    #[test]
    fn test_priority_weights() {
        assert_eq!(Priority::Critical.weight(), 4);
        assert_eq!(Priority::High.weight(), 3);
        assert_eq!(Priority::Medium.weight(), 2);
        assert_eq!(Priority::Low.weight(), 1);
        assert!(Priority::Critical > Priority::High);
    }

    #[test]
    fn test_validate_defaults_optional_fields() {
        let case = raw("Start game", "functional").validate(7).unwrap();
        assert_eq!(case.id, 7);
        assert_eq!(case.priority, Priority::Medium);
        assert_eq!(case.description, "");
        assert_eq!(case.plan.steps.len(), 1);
        assert_eq!(case.detection_confidence, None);
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let mut missing_name = raw("  ", "functional");
        assert_eq!(missing_name.clone().validate(1), Err(MalformedTestCase::MissingName));
        missing_name.name = None;
        assert_eq!(missing_name.validate(1), Err(MalformedTestCase::MissingName));

        assert_eq!(
            raw("X", "security").validate(1),
            Err(MalformedTestCase::UnknownCategory("security".to_string()))
        );

        let mut no_steps = raw("X", "boundary");
        no_steps.steps = vec![RawStep::Text("   ".to_string())];
        assert_eq!(no_steps.validate(1), Err(MalformedTestCase::EmptyPlan));

        let mut bad_priority = raw("X", "boundary");
        bad_priority.priority = Some("urgent-ish".to_string());
        assert!(matches!(
            bad_priority.validate(1),
            Err(MalformedTestCase::UnknownPriority(_))
        ));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut case = raw("X", "boundary");
        case.confidence = Some(1.7);
        assert_eq!(case.validate(1).unwrap().detection_confidence, Some(1.0));
    }

    #[test]
    fn test_raw_steps_accept_strings_and_objects() {
        let json = r##"{
            "name": "Restart",
            "category": "functional",
            "priority": "high",
            "steps": ["Start a game", {"description": "Click restart", "action": "click", "target": "#restart"}]
        }"##;
        let raw: RawTestCase = serde_json::from_str(json).unwrap();
        let case = raw.validate(1).unwrap();
        assert_eq!(case.priority, Priority::High);
        assert_eq!(case.plan.steps[1].target.as_deref(), Some("#restart"));
    }
}

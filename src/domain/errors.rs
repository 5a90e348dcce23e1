//! Domain errors for the playtest engine.

use thiserror::Error;

use super::models::{SessionStage, TestCategory};
use super::ports::InspectionError;

/// Format missing categories as `boundary, edge-case`.
fn format_categories(categories: &[TestCategory]) -> String {
    if categories.is_empty() {
        return "none".to_string();
    }
    categories
        .iter()
        .map(TestCategory::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stage-level errors surfaced to callers unchanged.
///
/// Per-run driver and judge failures never show up here: the execution
/// coordinator downgrades them to INDETERMINATE runs.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    SessionAlreadyExists(String),

    #[error("Invalid stage transition for session {session_id}: session is {current}, operation requires {required}")]
    InvalidStageTransition {
        session_id: String,
        current: SessionStage,
        required: SessionStage,
    },

    #[error("Game inspection failed: {0}")]
    Inspection(#[from] InspectionError),

    #[error(
        "Insufficient test cases: produced {produced}, required {required} (missing categories: {})",
        format_categories(.missing_categories)
    )]
    InsufficientTestCases {
        produced: usize,
        required: usize,
        missing_categories: Vec<TestCategory>,
    },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

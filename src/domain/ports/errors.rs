use thiserror::Error;

/// Browser driver failures. Recoverable: the run becomes INDETERMINATE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("driver timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("browser session error: {0}")]
    Browser(String),
}

impl DriverError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Navigation(_) => "navigation",
            Self::ElementNotFound(_) => "element-not-found",
            Self::Browser(_) => "browser",
        }
    }
}

/// Verdict judge failures. Recoverable: the run becomes INDETERMINATE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeError {
    #[error("judge timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("judge backend error: {0}")]
    Backend(String),

    #[error("malformed judge response: {0}")]
    MalformedResponse(String),
}

impl JudgeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Backend(_) => "backend",
            Self::MalformedResponse(_) => "malformed-response",
        }
    }
}

/// Game inspector failures. Fatal for the analyze stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectionError {
    #[error("{url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("{url} has unsupported content: {reason}")]
    UnsupportedContent { url: String, reason: String },

    #[error("inspection of {url} timed out after {after_ms}ms")]
    Timeout { url: String, after_ms: u64 },
}

/// Generation backend failures. One failed attempt counts against the retry limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation backend error: {0}")]
    Backend(String),

    #[error("generation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

/// Knowledge store failures. Never fatal; logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnowledgeStoreError {
    #[error("knowledge store unavailable: {0}")]
    Unavailable(String),

    #[error("knowledge store error: {0}")]
    Backend(String),

    #[error("knowledge store call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

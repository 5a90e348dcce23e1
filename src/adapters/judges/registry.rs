//! Judge variant registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::VerdictJudge;

/// Registry of verdict judge variants, keyed by [`VerdictJudge::name`].
#[derive(Clone, Default)]
pub struct JudgeRegistry {
    judges: BTreeMap<String, Arc<dyn VerdictJudge>>,
}

impl JudgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a judge, replacing any variant with the same name.
    pub fn register(&mut self, judge: Arc<dyn VerdictJudge>) {
        self.judges.insert(judge.name().to_string(), judge);
    }

    pub fn with_judge(mut self, judge: Arc<dyn VerdictJudge>) -> Self {
        self.register(judge);
        self
    }

    /// Look up a judge variant by name.
    ///
    /// # Errors
    /// Returns `ValidationFailed` when no variant is registered under `name`.
    pub fn get(&self, name: &str) -> DomainResult<Arc<dyn VerdictJudge>> {
        self.judges.get(name).cloned().ok_or_else(|| {
            DomainError::ValidationFailed(format!(
                "no judge registered as '{name}' (available: {})",
                self.available().join(", ")
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.judges.contains_key(name)
    }

    pub fn available(&self) -> Vec<&str> {
        self.judges.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for JudgeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeRegistry")
            .field("judges", &self.available())
            .finish()
    }
}

//! Scripted generation backend.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::models::{RawStep, RawTestCase, TestCategory};
use crate::domain::ports::{GenerationBackend, GenerationError, GenerationRequest};

/// Generation backend answering attempt `n` with the `n`-th scripted output.
///
/// Attempts past the end of the script produce nothing.
#[derive(Debug, Default)]
pub struct ScriptedGenerationBackend {
    attempts: Vec<Result<Vec<RawTestCase>, GenerationError>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerationBackend {
    pub fn new(attempts: Vec<Result<Vec<RawTestCase>, GenerationError>>) -> Self {
        Self {
            attempts,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend that answers the first attempt with a valid pool of `count`
    /// cases cycling through every category.
    pub fn balanced(count: usize) -> Self {
        Self::new(vec![Ok(balanced_pool(count))])
    }

    /// Requests received so far, in order
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

/// `count` valid raw cases whose categories cycle through every category.
pub fn balanced_pool(count: usize) -> Vec<RawTestCase> {
    const PRIORITIES: [&str; 4] = ["CRITICAL", "HIGH", "MEDIUM", "LOW"];
    let categories = TestCategory::ALL;
    (0..count)
        .map(|i| {
            let category = categories[i % categories.len()];
            RawTestCase {
                name: Some(format!("{} check {}", category, i + 1)),
                category: Some(category.as_str().to_string()),
                priority: Some(PRIORITIES[i % PRIORITIES.len()].to_string()),
                description: Some(format!("Exercise {category} behaviour")),
                steps: vec![
                    RawStep::Text("Load the game".to_string()),
                    RawStep::Text(format!("Perform {category} interaction {}", i + 1)),
                ],
                expected_result: Some("Game responds correctly".to_string()),
                confidence: Some(0.5),
            }
        })
        .collect()
}

#[async_trait]
impl GenerationBackend for ScriptedGenerationBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RawTestCase>, GenerationError> {
        self.requests.lock().await.push(request.clone());
        self.attempts
            .get(request.attempt as usize)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

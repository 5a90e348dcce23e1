//! Scripted browser driver for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::models::{ActionPlan, Artifact, ArtifactBundle};
use crate::domain::ports::{BrowserDriver, DriverError};

/// One scripted driver response.
#[derive(Debug, Clone)]
pub struct DriverResponse {
    pub result: Result<ArtifactBundle, DriverError>,
    /// Simulated latency before answering
    pub delay: Option<Duration>,
}

impl DriverResponse {
    pub fn artifacts(bundle: ArtifactBundle) -> Self {
        Self {
            result: Ok(bundle),
            delay: None,
        }
    }

    pub fn error(error: DriverError) -> Self {
        Self {
            result: Err(error),
            delay: None,
        }
    }

    /// Answer successfully after sleeping for `delay`.
    pub fn delayed(delay: Duration) -> Self {
        Self {
            result: Ok(default_bundle()),
            delay: Some(delay),
        }
    }
}

fn default_bundle() -> ArtifactBundle {
    ArtifactBundle::new(vec![
        Artifact::Screenshot {
            reference: "screenshot.png".to_string(),
        },
        Artifact::ConsoleLog {
            entries: Vec::new(),
        },
    ])
}

/// Browser driver that replays queued responses per action plan.
///
/// Plans without a queued response get the default response.
#[derive(Debug)]
pub struct ScriptedBrowserDriver {
    default_response: DriverResponse,
    scripts: RwLock<Vec<(ActionPlan, VecDeque<DriverResponse>)>>,
    calls: AtomicUsize,
}

impl ScriptedBrowserDriver {
    pub fn new() -> Self {
        Self::with_default_response(DriverResponse::artifacts(default_bundle()))
    }

    pub fn with_default_response(response: DriverResponse) -> Self {
        Self {
            default_response: response,
            scripts: RwLock::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue responses for every execution of `plan`, consumed in order.
    pub async fn script(&self, plan: ActionPlan, responses: Vec<DriverResponse>) {
        let mut scripts = self.scripts.write().await;
        match scripts.iter_mut().find(|(p, _)| *p == plan) {
            Some((_, queue)) => queue.extend(responses),
            None => scripts.push((plan, responses.into())),
        }
    }

    /// Number of executions so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next_response(&self, plan: &ActionPlan) -> DriverResponse {
        let mut scripts = self.scripts.write().await;
        scripts
            .iter_mut()
            .find(|(p, _)| p == plan)
            .and_then(|(_, queue)| queue.pop_front())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for ScriptedBrowserDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedBrowserDriver {
    async fn execute(&self, _url: &str, plan: &ActionPlan) -> Result<ArtifactBundle, DriverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.next_response(plan).await;
        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }
        response.result
    }
}

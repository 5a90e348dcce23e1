use async_trait::async_trait;

use super::errors::DriverError;
use crate::domain::models::{ActionPlan, ArtifactBundle};

/// Port for the browser automation layer.
///
/// Drives a real browser through an action plan and captures evidence
/// (screenshots, DOM snapshot, console and network logs). Implementations
/// must not partially mutate shared state on failure.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Execute the plan against the game at `url` and return captured artifacts.
    ///
    /// # Errors
    /// Returns [`DriverError`] on timeout, navigation failure or a missing element.
    async fn execute(&self, url: &str, plan: &ActionPlan) -> Result<ArtifactBundle, DriverError>;
}

use async_trait::async_trait;

use super::errors::InspectionError;
use crate::domain::models::GameAnalysis;

/// Port for the component that inspects a game page.
#[async_trait]
pub trait GameInspector: Send + Sync {
    /// Inspect the game at `url`.
    ///
    /// # Errors
    /// Returns [`InspectionError`] when the URL is unreachable or the content
    /// is not a supported game.
    async fn inspect(&self, url: &str) -> Result<GameAnalysis, InspectionError>;
}

//! Game analysis produced by the game inspector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured description of a game page. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub url: String,
    /// e.g. "sudoku", "math-puzzle", "match-three"
    pub game_type: String,
    /// Number of interactive elements found on the page
    pub element_count: u32,
    /// Detected mechanics, in detection order
    pub mechanics: Vec<String>,
    pub ui_description: String,
    /// Free-text testing hints emitted by the inspector
    #[serde(default)]
    pub test_recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl GameAnalysis {
    pub fn new(url: impl Into<String>, game_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            game_type: game_type.into(),
            element_count: 0,
            mechanics: Vec::new(),
            ui_description: String::new(),
            test_recommendations: Vec::new(),
            analyzed_at: Utc::now(),
        }
    }

    pub fn with_mechanics<I, S>(mut self, mechanics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mechanics = mechanics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_element_count(mut self, count: u32) -> Self {
        self.element_count = count;
        self
    }

    pub fn with_ui_description(mut self, description: impl Into<String>) -> Self {
        self.ui_description = description.into();
        self
    }
}

//! Game inspector returning a fixed analysis.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::models::GameAnalysis;
use crate::domain::ports::{GameInspector, InspectionError};

#[derive(Debug)]
pub struct StaticInspector {
    result: Result<GameAnalysis, InspectionError>,
    calls: AtomicUsize,
}

impl StaticInspector {
    pub fn new(analysis: GameAnalysis) -> Self {
        Self {
            result: Ok(analysis),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: InspectionError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameInspector for StaticInspector {
    async fn inspect(&self, url: &str) -> Result<GameAnalysis, InspectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map(|mut analysis| {
            analysis.url = url.to_string();
            analysis
        })
    }
}

//! In-memory knowledge store with a token-overlap similarity.
//!
//! Stands in for a vector store in tests and offline runs. Records are
//! keyed by session id; a query scores every record by game type match and
//! mechanics overlap.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

use crate::domain::models::{KnowledgeRecord, KnowledgeSignature, KnowledgeSnippet};
use crate::domain::ports::{KnowledgeStore, KnowledgeStoreError};

/// Share of the similarity score carried by an exact game type match.
const GAME_TYPE_WEIGHT: f64 = 0.5;

#[derive(Debug, Default)]
pub struct InMemoryKnowledgeStore {
    records: RwLock<BTreeMap<String, KnowledgeRecord>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored records, ordered by session id
    pub async fn records(&self) -> Vec<KnowledgeRecord> {
        self.records.read().await.values().cloned().collect()
    }
}

fn tokens(values: &[String]) -> HashSet<String> {
    values
        .iter()
        .flat_map(|v| v.split(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Similarity in 0.0..=1.0 between two signatures.
pub fn similarity(a: &KnowledgeSignature, b: &KnowledgeSignature) -> f64 {
    let type_score = if a.game_type.eq_ignore_ascii_case(&b.game_type) {
        1.0
    } else {
        0.0
    };
    let left = tokens(&a.mechanics);
    let right = tokens(&b.mechanics);
    let union = left.union(&right).count();
    let overlap = if union == 0 {
        0.0
    } else {
        left.intersection(&right).count() as f64 / union as f64
    };
    GAME_TYPE_WEIGHT * type_score + (1.0 - GAME_TYPE_WEIGHT) * overlap
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn query(
        &self,
        signature: &KnowledgeSignature,
        limit: usize,
    ) -> Result<Vec<KnowledgeSnippet>, KnowledgeStoreError> {
        let records = self.records.read().await;
        let mut snippets: Vec<KnowledgeSnippet> = records
            .values()
            .map(|record| KnowledgeSnippet {
                id: record.session_id.clone(),
                content: record.summary_text(),
                score: similarity(signature, &record.signature()),
            })
            .filter(|snippet| snippet.score > 0.0)
            .collect();
        snippets.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        snippets.truncate(limit);
        Ok(snippets)
    }

    async fn upsert(&self, record: KnowledgeRecord) -> Result<(), KnowledgeStoreError> {
        self.records
            .write()
            .await
            .insert(record.session_id.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TestCategory;
    use chrono::Utc;

    fn record(session_id: &str, game_type: &str, mechanics: &[&str]) -> KnowledgeRecord {
        KnowledgeRecord {
            session_id: session_id.to_string(),
            game_type: game_type.to_string(),
            mechanics: mechanics.iter().map(|m| (*m).to_string()).collect(),
            failing_categories: vec![TestCategory::Boundary],
            flaky_categories: vec![],
            pass_rate: 80.0,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_similarity_prefers_same_game_type() {
        let sudoku = KnowledgeSignature {
            game_type: "sudoku".to_string(),
            mechanics: vec!["grid input".to_string()],
        };
        let other = KnowledgeSignature {
            game_type: "match-three".to_string(),
            mechanics: vec!["grid swap".to_string()],
        };
        assert!((similarity(&sudoku, &sudoku) - 1.0).abs() < f64::EPSILON);
        assert!(similarity(&sudoku, &other) < 0.5);
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let store = InMemoryKnowledgeStore::new();
        store.upsert(record("a", "sudoku", &["grid", "timer"])).await.unwrap();
        store.upsert(record("b", "math", &["addition"])).await.unwrap();
        store.upsert(record("c", "sudoku", &["grid"])).await.unwrap();

        let signature = KnowledgeSignature {
            game_type: "sudoku".to_string(),
            mechanics: vec!["grid".to_string()],
        };
        let snippets = store.query(&signature, 5).await.unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].id, "c");
        assert!(snippets[0].content.contains("failures in boundary"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_session() {
        let store = InMemoryKnowledgeStore::new();
        store.upsert(record("a", "sudoku", &[])).await.unwrap();
        store.upsert(record("a", "math", &[])).await.unwrap();
        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].game_type, "math");
    }
}

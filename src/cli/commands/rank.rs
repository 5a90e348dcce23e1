//! `playtest rank`: validate a saved raw pool and print the ranked selection.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use super::read_input;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::cli::table::{list_table, render_list};
use crate::domain::models::{Config, RankedTestCase, RawTestCase, TestCase};
use crate::services::TestRanker;

#[derive(Args, Debug)]
pub struct RankArgs {
    /// JSON or YAML file holding an array of generated test cases
    #[arg(short, long)]
    pub pool: PathBuf,

    /// Number of test cases to select (defaults to ranking.top_n)
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RankOutput {
    pub pool_size: usize,
    pub malformed: usize,
    pub selected: Vec<RankedTestCase>,
}

impl CommandOutput for RankOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["rank", "id", "name", "category", "priority", "score"]);
        for (position, ranked) in self.selected.iter().enumerate() {
            let marker = if ranked.coverage_swap { "*" } else { "" };
            table.add_row(vec![
                format!("{}{marker}", position + 1),
                ranked.id().to_string(),
                truncate(&ranked.test_case.name, 40),
                ranked.test_case.category.to_string(),
                ranked.test_case.priority.to_string(),
                format!("{:.3}", ranked.overall_score),
            ]);
        }

        let mut lines = vec![format!(
            "Pool: {} valid, {} malformed",
            self.pool_size, self.malformed
        )];
        lines.push(render_list("selected test case", &table, self.selected.len()));
        if self.selected.iter().any(|r| r.coverage_swap) {
            lines.push("* entered through coverage swap".to_string());
        }
        lines.join("\n")
    }
}

/// Validate raw records in file order; ids are 1-based positions among the valid ones.
pub fn validate_pool(raw: Vec<RawTestCase>) -> (Vec<TestCase>, usize) {
    let mut pool = Vec::with_capacity(raw.len());
    let mut malformed = 0;
    for record in raw {
        let id = u32::try_from(pool.len() + 1).unwrap_or(u32::MAX);
        match record.validate(id) {
            Ok(test_case) => pool.push(test_case),
            Err(reason) => {
                malformed += 1;
                warn!(%reason, "dropping malformed test case");
            }
        }
    }
    (pool, malformed)
}

pub fn execute(args: RankArgs, config: &Config, json_mode: bool) -> Result<()> {
    let raw: Vec<RawTestCase> = read_input(&args.pool)?;
    let (pool, malformed) = validate_pool(raw);

    let ranker = TestRanker::new(config.ranking.clone());
    let selected = ranker.rank_top(&pool, args.top_n.unwrap_or_else(|| ranker.top_n()));

    output(
        &RankOutput {
            pool_size: pool.len(),
            malformed,
            selected,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::balanced_pool;

    #[test]
    fn test_validate_pool_skips_malformed_without_gaps() {
        let mut raw = balanced_pool(3);
        raw.insert(1, RawTestCase::default());

        let (pool, malformed) = validate_pool(raw);
        assert_eq!(malformed, 1);
        assert_eq!(pool.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_rank_output_human() {
        let (pool, _) = validate_pool(balanced_pool(12));
        let selected = TestRanker::new(Config::default().ranking).rank_top(&pool, 5);
        let rendered = RankOutput {
            pool_size: pool.len(),
            malformed: 0,
            selected,
        }
        .to_human();

        assert!(rendered.starts_with("Pool: 12 valid, 0 malformed"));
        assert!(rendered.contains("5 selected test cases:"));
    }
}

//! `playtest report`: build a report from saved verdicts.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::read_input;
use crate::cli::output::{output, percent, truncate, CommandOutput};
use crate::cli::table::list_table;
use crate::domain::models::{GameInfo, Report, RunResult, TestVerdict};
use crate::services::ReportBuilder;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// JSON or YAML file holding `verdicts` and optionally `runs` and `game`
    #[arg(short, long)]
    pub verdicts: PathBuf,

    /// Session id used for the report id
    #[arg(short, long, default_value = "offline")]
    pub session: String,

    /// Game URL, overrides the one in the input file
    #[arg(short, long)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportInput {
    #[serde(default)]
    pub game: Option<GameInfo>,
    pub verdicts: Vec<TestVerdict>,
    #[serde(default)]
    pub runs: Vec<RunResult>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ReportOutput(pub Report);

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        let report = &self.0;
        let summary = &report.summary;
        let mut lines = vec![
            format!("Report {} ({})", report.report_id, report.game_info.url),
            format!(
                "Status: {} | pass rate {:.2}% | {} tests: {} passed, {} failed, {} flaky, {} inconclusive",
                summary.overall_status,
                summary.pass_rate,
                summary.total_tests,
                summary.passed,
                summary.failed,
                summary.flaky,
                summary.inconclusive,
            ),
            format!(
                "Reproducibility: average {:.1}%, min {}%, max {}%",
                report.reproducibility_stats.average,
                report.reproducibility_stats.min,
                report.reproducibility_stats.max,
            ),
        ];

        if !report.test_results.is_empty() {
            let mut table = list_table(&["id", "name", "category", "result", "conf", "repro"]);
            for verdict in &report.test_results {
                table.add_row(vec![
                    verdict.test_id.to_string(),
                    truncate(&verdict.test_name, 36),
                    verdict.category.to_string(),
                    verdict.result.to_string(),
                    format!("{}%", verdict.confidence),
                    percent(verdict.reproducibility),
                ]);
            }
            lines.push(String::new());
            lines.push(table.to_string());
        }

        if !report.triage_notes.is_empty() {
            lines.push("\nTriage:".to_string());
            for note in &report.triage_notes {
                lines.push(format!(
                    "  [{}] #{} {}: {}",
                    note.severity, note.test_id, note.test_name, note.recommended_action
                ));
            }
        }

        lines.push("\nRecommendations:".to_string());
        for recommendation in &report.recommendations {
            lines.push(format!("  - {recommendation}"));
        }
        lines.join("\n")
    }
}

pub fn execute(args: ReportArgs, json_mode: bool) -> Result<()> {
    let input: ReportInput = read_input(&args.verdicts)?;
    let mut game = input.game.unwrap_or_else(|| GameInfo {
        url: String::new(),
        game_type: "unknown".to_string(),
        element_count: 0,
        mechanics: Vec::new(),
    });
    if let Some(url) = args.url {
        game.url = url;
    }
    if game.url.is_empty() {
        return Err(anyhow::anyhow!("no game URL: pass --url or include game.url"))
            .context("Cannot build report");
    }

    let report = ReportBuilder::new().build(&args.session, game, &input.verdicts, &input.runs);
    output(&ReportOutput(report), json_mode);
    Ok(())
}

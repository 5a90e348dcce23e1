//! `playtest aggregate`: aggregate saved runs of one test case into a verdict.

use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::read_input;
use crate::cli::output::{output, percent, CommandOutput};
use crate::domain::models::{RunResult, TestCase, TestVerdict};
use crate::services::validation;

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// JSON or YAML file holding `test_case` and its `runs`
    #[arg(short, long)]
    pub runs: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct AggregateInput {
    pub test_case: TestCase,
    #[serde(default)]
    pub runs: Vec<RunResult>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct VerdictOutput(pub TestVerdict);

impl CommandOutput for VerdictOutput {
    fn to_human(&self) -> String {
        let verdict = &self.0;
        [
            format!("Test #{}: {}", verdict.test_id, verdict.test_name),
            format!("Category: {} ({})", verdict.category, verdict.priority),
            format!("Result: {}", verdict.result),
            format!("Confidence: {}%", verdict.confidence),
            format!("Reproducibility: {}", percent(verdict.reproducibility)),
            format!(
                "Runs: {} ({} passed, {} failed, {} indeterminate){}",
                verdict.run_count,
                verdict.pass_count,
                verdict.fail_count,
                verdict.indeterminate_count,
                if verdict.cross_agent_used {
                    ", cross-agent used"
                } else {
                    ""
                }
            ),
            format!("Reason: {}", verdict.reason),
        ]
        .join("\n")
    }
}

pub fn execute(args: AggregateArgs, json_mode: bool) -> Result<()> {
    let input: AggregateInput = read_input(&args.runs)?;
    let verdict = validation::aggregate(&input.test_case, &input.runs);
    output(&VerdictOutput(verdict), json_mode);
    Ok(())
}

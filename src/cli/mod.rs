//! Command-line interface for the playtest engine.
//!
//! The binary is a thin offline surface over the services: it ranks saved
//! test pools, aggregates saved runs, builds reports from saved verdicts and
//! prints the effective configuration.

pub mod commands;
pub mod output;
pub mod table;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{AggregateArgs, RankArgs, ReportArgs};

#[derive(Parser, Debug)]
#[command(name = "playtest")]
#[command(about = "Playtest - test orchestration and validation for web puzzle games", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .playtest/config.yaml)
    #[arg(short, long, global = true, env = "PLAYTEST_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a generated test pool and print the ranked selection
    Rank(RankArgs),

    /// Aggregate saved run results of one test case into a verdict
    Aggregate(AggregateArgs),

    /// Build a report from saved verdicts
    Report(ReportArgs),

    /// Print the effective configuration
    Config,
}

/// Print an error once at the edge and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank_with_global_flags() {
        let cli = Cli::try_parse_from([
            "playtest", "rank", "--pool", "pool.json", "--top-n", "5", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Rank(args) => {
                assert_eq!(args.pool, PathBuf::from("pool.json"));
                assert_eq!(args.top_n, Some(5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["playtest", "--config", "custom.yaml", "config"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_report_requires_verdicts() {
        assert!(Cli::try_parse_from(["playtest", "report"]).is_err());
    }
}

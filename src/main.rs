//! Playtest CLI entry point.

use anyhow::Result;
use clap::Parser;

use playtest::cli::{commands, handle_error, Cli, Commands};
use playtest::domain::models::Config;
use playtest::infrastructure::config::ConfigLoader;
use playtest::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;
    tracing::debug!(command = ?cli.command, "starting");

    match cli.command {
        Commands::Rank(args) => commands::rank::execute(args, &config, cli.json),
        Commands::Aggregate(args) => commands::aggregate::execute(args, cli.json),
        Commands::Report(args) => commands::report::execute(args, cli.json),
        Commands::Config => commands::config::execute(&config, cli.json),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(&err, json);
    }
}

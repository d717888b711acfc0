//! Finsight CLI - Financial statement analyzer
//!
//! Usage:
//!   finsight kpi --file statement.json               KPIs and trends
//!   finsight weakness --file statement.json          Weaknesses, risk, priorities
//!   finsight report --file statement.csv --year 2023 Full report
//!   finsight benchmarks --industry 은행업             Industry averages

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config = commands::load_analysis_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Kpi { input } => commands::cmd_kpi(&config, &input, cli.json),
        Commands::Weakness {
            input,
            history,
            top,
        } => commands::cmd_weakness(&config, &input, &history, top, cli.json),
        Commands::Report { input, history } => {
            commands::cmd_report(&config, &input, &history, cli.json)
        }
        Commands::Benchmarks { industry } => {
            commands::cmd_benchmarks(&config, industry.as_deref(), cli.json)
        }
        Commands::Config => commands::cmd_config(&config, cli.json),
    }
}

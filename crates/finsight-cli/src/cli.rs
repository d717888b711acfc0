//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Finsight - Financial statement KPIs and weakness analysis
#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Compute KPIs, flag weaknesses and score risk from financial statements", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Statement input shared by the analysis commands
#[derive(Args, Debug, Clone)]
pub struct StatementArgs {
    /// Statement file (JSON, or CSV when the extension is .csv)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Industry label (key, alias or Korean industry name)
    ///
    /// Overrides the industry recorded in the statement file.
    #[arg(short, long)]
    pub industry: Option<String>,

    /// Company code for CSV statements (defaults to the file name)
    #[arg(long)]
    pub corp_code: Option<String>,

    /// Fiscal year for CSV statements (defaults to last calendar year)
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute KPIs and year-over-year trends
    Kpi {
        #[command(flatten)]
        input: StatementArgs,
    },

    /// Flag weaknesses against industry benchmarks and score risk
    Weakness {
        #[command(flatten)]
        input: StatementArgs,

        /// Earlier-year statements for multi-year rules (repeatable)
        #[arg(long)]
        history: Vec<PathBuf>,

        /// Maximum number of improvement priorities
        #[arg(long)]
        top: Option<usize>,
    },

    /// Full report: KPIs, trends, weaknesses, risk and priorities
    Report {
        #[command(flatten)]
        input: StatementArgs,

        /// Earlier-year statements for multi-year rules (repeatable)
        #[arg(long)]
        history: Vec<PathBuf>,
    },

    /// Show industry benchmark averages
    Benchmarks {
        /// Show a single industry
        #[arg(short, long)]
        industry: Option<String>,
    },

    /// Show the active configuration
    Config,
}

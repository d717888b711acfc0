//! Shared command utilities
//!
//! This module contains:
//! - `load_analysis_config` - Resolve the active configuration
//! - `load_statement` / `load_history` - Read statement files (JSON or CSV)
//! - `industry_label` - Pick the industry label for a request
//! - `print_json` - Pretty JSON output

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use finsight_core::{load_config, AnalysisConfig, FinancialStatement};
use serde_json::Value;

use crate::cli::StatementArgs;

/// Load config from an explicit path, the data-dir override, or built-in defaults
pub fn load_analysis_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config = load_config(path).context("Failed to load config")?;
    tracing::debug!(source = %config.source, "Config loaded");
    Ok(config)
}

/// Fiscal year assumed for CSV statements without --year
pub fn default_fiscal_year() -> i32 {
    Utc::now().year() - 1
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn read_statement_file(
    path: &Path,
    corp_code: Option<&str>,
    year: Option<i32>,
    industry: Option<&str>,
) -> Result<FinancialStatement> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    if is_csv(path) {
        let corp_code = corp_code.map(str::to_string).unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        FinancialStatement::from_csv_reader(
            file,
            corp_code,
            year.unwrap_or(0),
            industry.unwrap_or_default(),
        )
        .with_context(|| format!("Failed to parse CSV statement {}", path.display()))
    } else {
        FinancialStatement::from_json_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse JSON statement {}", path.display()))
    }
}

/// Read the statement named by --file
pub fn load_statement(args: &StatementArgs) -> Result<FinancialStatement> {
    let year = if is_csv(&args.file) {
        Some(args.year.unwrap_or_else(default_fiscal_year))
    } else {
        args.year
    };

    let mut statement = read_statement_file(
        &args.file,
        args.corp_code.as_deref(),
        year,
        args.industry.as_deref(),
    )?;

    // Explicit flags win over what the JSON file recorded
    if let Some(code) = &args.corp_code {
        statement.corp_code = code.clone();
    }
    if let Some(year) = year {
        statement.fiscal_year = year;
    }

    tracing::debug!(
        file = %args.file.display(),
        corp_code = statement.corp_code.as_str(),
        fiscal_year = statement.fiscal_year,
        items = statement.items.len(),
        "Statement loaded"
    );
    Ok(statement)
}

/// Read earlier-year statements; CSV files carry no year and keep their order
pub fn load_history(paths: &[PathBuf]) -> Result<Vec<FinancialStatement>> {
    paths
        .iter()
        .map(|p| read_statement_file(p, None, None, None))
        .collect()
}

/// Industry label: --industry, else the statement's own, else the configured default
pub fn industry_label(
    args: &StatementArgs,
    statement: &FinancialStatement,
    config: &AnalysisConfig,
) -> String {
    args.industry
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| Some(statement.industry.trim()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| config.default_industry())
        .to_string()
}

/// Print a JSON value (from `serde_json::to_value`) pretty-printed
pub fn print_json(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to format JSON")?
    );
    Ok(())
}

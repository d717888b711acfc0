//! Analysis command implementations (kpi, weakness, report)

use std::path::PathBuf;

use anyhow::{Context, Result};
use finsight_core::kpi::TrendSet;
use finsight_core::{
    AnalysisConfig, Analyzer, KpiSet, KpiStatus, ResolvedIndustry, WeaknessReport,
};

use super::{format_amount, industry_label, load_history, load_statement, print_json, truncate};
use crate::cli::StatementArgs;

fn status_icon(status: KpiStatus) -> &'static str {
    match status {
        KpiStatus::Excellent => "🟢",
        KpiStatus::Good => "🔵",
        KpiStatus::Fair => "🟡",
        KpiStatus::Poor => "🔴",
        KpiStatus::Error => "⚪",
    }
}

fn print_industry(industry: &ResolvedIndustry) {
    if industry.is_fallback {
        println!(
            "   Industry: {} [{}] (no match for \"{}\", using default)",
            industry.name, industry.key, industry.requested
        );
    } else {
        println!(
            "   Industry: {} [{}] ({} indicators)",
            industry.name, industry.key, industry.profile
        );
    }
}

fn print_kpis(kpis: &KpiSet) {
    println!();
    println!(
        "   {:20} │ {:>9} │ {:>9} │ {:>9} │ Status",
        "Indicator", "Current", "Previous", "Change"
    );
    println!("   ─────────────────────┼───────────┼───────────┼───────────┼───────────");

    for kpi in kpis.values() {
        if kpi.is_error() {
            println!(
                "   {:20} │ {:>9} │ {:>9} │ {:>9} │ {} {}",
                kpi.name,
                "-",
                "-",
                "-",
                status_icon(kpi.status),
                kpi.message.as_deref().unwrap_or("error")
            );
            continue;
        }
        println!(
            "   {:20} │ {:>8.2}{} │ {:>8.2}{} │ {:>+9.2} │ {} {}",
            kpi.name,
            kpi.value,
            kpi.unit,
            kpi.previous_value,
            kpi.unit,
            kpi.change,
            status_icon(kpi.status),
            kpi.status
        );
    }
}

fn print_trends(trends: &TrendSet) {
    if trends.is_empty() {
        return;
    }
    println!();
    println!("   📈 Trends");
    for (field, trend) in trends {
        println!(
            "   {:22} {:>18} → {:>18}  {} {:+.2}%",
            field.as_str(),
            format_amount(trend.previous),
            format_amount(trend.current),
            trend.direction.arrow(),
            trend.change_rate
        );
    }
}

fn print_weaknesses(report: &WeaknessReport) {
    let risk = &report.risk_level;
    println!(
        "   Risk: {} (score {}/100) - {}",
        risk.label, risk.score, risk.message
    );
    println!(
        "   Issues: {} ({} critical, {} warning, {} info)",
        report.total_issues, report.critical_issues, report.warning_issues, report.info_issues
    );

    if report.weaknesses.is_empty() {
        println!();
        println!("   ✅ No weaknesses found.");
        return;
    }

    println!();
    for w in &report.weaknesses {
        println!("   {} [{}] {}", w.severity.icon(), w.rule_id, w.title);
        println!("      {}", w.description);
        println!("      Impact: {}", w.impact);
        println!("      → {}", w.recommendation);
    }

    if !report.priorities.is_empty() {
        println!();
        println!("   📋 Improvement priorities");
        for p in &report.priorities {
            println!(
                "   {}. [{}] {}: {}",
                p.rank,
                p.rule_id,
                p.title,
                truncate(&p.recommendation, 70)
            );
        }
    }
}

pub fn cmd_kpi(config: &AnalysisConfig, input: &StatementArgs, json: bool) -> Result<()> {
    let statement = load_statement(input)?;
    let industry = industry_label(input, &statement, config);

    let analyzer = Analyzer::new(config);
    let report = analyzer
        .kpi_report(&statement, &industry)
        .context("KPI analysis failed")?;

    if json {
        return print_json(&serde_json::to_value(&report)?);
    }

    println!();
    println!(
        "📊 KPI Report: {} (FY{})",
        report.corp_code, report.fiscal_year
    );
    print_industry(&report.industry);
    println!("   ─────────────────────────────────────────────────────────────");
    print_kpis(&report.kpis);
    print_trends(&report.trends);
    Ok(())
}

pub fn cmd_weakness(
    config: &AnalysisConfig,
    input: &StatementArgs,
    history: &[PathBuf],
    top: Option<usize>,
    json: bool,
) -> Result<()> {
    let statement = load_statement(input)?;
    let earlier = load_history(history)?;
    let industry = industry_label(input, &statement, config);

    let mut analyzer = Analyzer::new(config);
    if let Some(top) = top {
        if top == 0 {
            anyhow::bail!("--top must be at least 1");
        }
        analyzer = analyzer.with_top_n(top);
    }

    let report = analyzer
        .weakness_report(&statement, &industry, &earlier)
        .context("Weakness analysis failed")?;

    if json {
        return print_json(&serde_json::to_value(&report)?);
    }

    println!();
    println!(
        "🔍 Weakness Analysis: {} (FY{})",
        report.corp_code, report.fiscal_year
    );
    println!(
        "   Industry: {} (requested \"{}\")",
        report.industry, report.industry_requested
    );
    println!("   ─────────────────────────────────────────────────────────────");
    print_weaknesses(&report);
    Ok(())
}

pub fn cmd_report(
    config: &AnalysisConfig,
    input: &StatementArgs,
    history: &[PathBuf],
    json: bool,
) -> Result<()> {
    let statement = load_statement(input)?;
    let earlier = load_history(history)?;
    let industry = industry_label(input, &statement, config);

    let analyzer = Analyzer::new(config);
    let report = analyzer
        .report(&statement, &industry, &earlier)
        .context("Analysis failed")?;

    if json {
        return print_json(&serde_json::to_value(&report)?);
    }

    println!();
    println!(
        "📑 Financial Analysis Report: {} (FY{})",
        report.kpi.corp_code, report.kpi.fiscal_year
    );
    println!(
        "   Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    print_industry(&report.kpi.industry);
    println!("   ─────────────────────────────────────────────────────────────");
    print_kpis(&report.kpi.kpis);
    print_trends(&report.kpi.trends);
    println!();
    println!("   🔍 Weaknesses");
    print_weaknesses(&report.weakness);
    Ok(())
}

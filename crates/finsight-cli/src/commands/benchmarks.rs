//! Benchmark and configuration commands

use anyhow::Result;
use finsight_core::config::default_config_path;
use finsight_core::{AnalysisConfig, IndicatorKey};

use super::{print_json, truncate};

pub fn cmd_benchmarks(config: &AnalysisConfig, industry: Option<&str>, json: bool) -> Result<()> {
    let table = &config.benchmarks;

    if let Some(label) = industry {
        let resolved = table.resolve(label);
        if json {
            return print_json(&serde_json::to_value(&resolved)?);
        }

        println!();
        println!("🏭 {} [{}]", resolved.name, resolved.key);
        if resolved.is_fallback {
            println!("   ⚠️  No industry matches \"{}\", showing defaults", label);
        }
        println!("   Profile: {}", resolved.profile);
        println!("   ─────────────────────────────────────────");
        for (key, value) in &resolved.averages {
            println!("   {:22} {:>8.2}%", key.title(), value);
        }
        return Ok(());
    }

    if json {
        return print_json(&serde_json::to_value(table.rows())?);
    }

    let columns = [
        IndicatorKey::Roa,
        IndicatorKey::Roe,
        IndicatorKey::DebtRatio,
        IndicatorKey::CurrentRatio,
        IndicatorKey::OperatingMargin,
    ];

    println!();
    println!("🏭 Industry Benchmarks ({} industries)", table.rows().len());
    println!();
    println!(
        "   {:16} │ {:26} │ {:>6} │ {:>6} │ {:>7} │ {:>7} │ {:>6}",
        "Key", "Name", "ROA", "ROE", "Debt", "Current", "OpM"
    );
    println!("   ─────────────────┼────────────────────────────┼────────┼────────┼─────────┼─────────┼────────");
    for row in table.rows() {
        let cells: Vec<String> = columns
            .iter()
            .map(|k| {
                row.averages
                    .get(k)
                    .map(|v| format!("{:.1}", v))
                    .unwrap_or_else(|| "-".to_string())
            })
            .collect();
        let marker = if row.key == table.default_key() { "*" } else { " " };
        println!(
            "   {:15}{} │ {:26} │ {:>6} │ {:>6} │ {:>7} │ {:>7} │ {:>6}",
            row.key,
            marker,
            truncate(&row.name, 26),
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            cells[4]
        );
    }
    println!();
    println!("   * default industry for unknown labels");
    Ok(())
}

pub fn cmd_config(config: &AnalysisConfig, json: bool) -> Result<()> {
    let override_path = default_config_path();

    if json {
        let value = serde_json::json!({
            "source": config.source,
            "override_path": override_path,
            "default_industry": config.default_industry(),
            "industries": config.benchmarks.rows().len(),
            "risk": config.risk,
            "priorities": config.priorities,
        });
        return print_json(&value);
    }

    let risk = &config.risk;
    println!();
    println!("⚙️  Configuration");
    println!("   Source: {}", config.source);
    match override_path {
        Some(path) => println!("   Override path: {}", path.display()),
        None => println!("   Override path: (no data directory on this platform)"),
    }
    println!("   ─────────────────────────────────────────");
    println!(
        "   Default industry: {} ({} industries)",
        config.default_industry(),
        config.benchmarks.rows().len()
    );
    println!(
        "   Risk weights: critical {}, warning {}, info {}",
        risk.critical_weight, risk.warning_weight, risk.info_weight
    );
    println!(
        "   Risk tiers: high >= {}, medium >= {}, low >= {}",
        risk.high_threshold, risk.medium_threshold, risk.low_threshold
    );
    println!("   Priorities shown: {}", config.priorities.top_n);
    Ok(())
}

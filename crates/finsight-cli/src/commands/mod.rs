//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config loading, statement files, JSON output)
//! - `analyze` - Analysis commands (kpi, weakness, report)
//! - `benchmarks` - Benchmark table and configuration commands

pub mod analyze;
pub mod benchmarks;
pub mod core;

// Re-export command functions for main.rs
pub use analyze::*;
pub use benchmarks::*;
pub use core::*;

/// Format an amount with thousands separators, dropping the fraction
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

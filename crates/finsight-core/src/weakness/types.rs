//! Core types for weakness findings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity level of a weakness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - worth watching
    Info,
    /// Below the reference, should be addressed
    Warning,
    /// Well below the reference, needs immediate attention
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Info => 1,
            Severity::Warning => 2,
            Severity::Critical => 3,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Warning => "⚠️",
            Severity::Critical => "🚨",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Area of financial health a weakness belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Leverage,
    Liquidity,
    Profitability,
    CashFlow,
    CapitalAdequacy,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Leverage => "leverage",
            Category::Liquidity => "liquidity",
            Category::Profitability => "profitability",
            Category::CashFlow => "cash_flow",
            Category::CapitalAdequacy => "capital_adequacy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leverage" => Ok(Category::Leverage),
            "liquidity" => Ok(Category::Liquidity),
            "profitability" => Ok(Category::Profitability),
            "cash_flow" => Ok(Category::CashFlow),
            "capital_adequacy" => Ok(Category::CapitalAdequacy),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// A triggered weakness rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    /// Rule identifier (e.g., "R01")
    pub rule_id: String,
    /// Short title (e.g., "High debt ratio")
    pub title: String,
    pub severity: Severity,
    pub category: Category,
    /// What was observed, with the numbers
    pub description: String,
    pub current_value: f64,
    /// Reference the value was measured against
    pub benchmark_value: f64,
    pub recommendation: String,
    /// Likely consequence if left unaddressed
    pub impact: String,
}

impl Weakness {
    pub fn new(
        rule_id: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        category: Category,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            title: title.into(),
            severity,
            category,
            description: String::new(),
            current_value: 0.0,
            benchmark_value: 0.0,
            recommendation: String::new(),
            impact: String::new(),
        }
    }

    /// Set the observed and reference values
    pub fn with_values(mut self, current: f64, benchmark: f64) -> Self {
        self.current_value = current;
        self.benchmark_value = benchmark;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    /// Distance between the observed value and its reference
    pub fn gap(&self) -> f64 {
        (self.current_value - self.benchmark_value).abs()
    }
}

//! Industry benchmark table
//!
//! Read-only lookup from an industry label to per-indicator averages. The
//! built-in table comes from the embedded `config/analysis.toml` and is
//! initialised once per process; override files build their own table via
//! [`crate::config::load_config`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{Error, Result};
use crate::kpi::IndicatorKey;

/// Which indicator set applies to an industry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryProfile {
    /// Debt/liquidity/margin indicators
    General,
    /// Interest-margin and capital-adequacy indicators
    Bank,
}

impl IndustryProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryProfile::General => "general",
            IndustryProfile::Bank => "bank",
        }
    }

    /// Indicators computed for this profile, in display order
    pub fn indicators(&self) -> &'static [IndicatorKey] {
        match self {
            IndustryProfile::Bank => &[
                IndicatorKey::Roa,
                IndicatorKey::Roe,
                IndicatorKey::Nim,
                IndicatorKey::BisCapitalRatio,
                IndicatorKey::OperatingMargin,
            ],
            IndustryProfile::General => &[
                IndicatorKey::Roa,
                IndicatorKey::Roe,
                IndicatorKey::DebtRatio,
                IndicatorKey::CurrentRatio,
                IndicatorKey::OperatingMargin,
                IndicatorKey::NetProfitMargin,
            ],
        }
    }

    pub fn includes(&self, key: IndicatorKey) -> bool {
        self.indicators().contains(&key)
    }
}

impl fmt::Display for IndustryProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IndustryProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "general" => Ok(IndustryProfile::General),
            "bank" => Ok(IndustryProfile::Bank),
            _ => Err(format!("Unknown industry profile: {}", s)),
        }
    }
}

/// One row of the benchmark table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryRow {
    pub key: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub profile: IndustryProfile,
    pub averages: BTreeMap<IndicatorKey, f64>,
}

impl IndustryRow {
    pub fn new(key: impl Into<String>, profile: IndustryProfile) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            aliases: vec![],
            profile,
            averages: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_average(mut self, key: IndicatorKey, value: f64) -> Self {
        self.averages.insert(key, value);
        self
    }

    /// Whether a label names this row (key or alias, case-insensitive)
    pub fn matches(&self, label: &str) -> bool {
        self.key.eq_ignore_ascii_case(label)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(label))
    }
}

/// An industry label resolved against the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedIndustry {
    /// Label as supplied by the caller
    pub requested: String,
    pub key: String,
    pub name: String,
    pub profile: IndustryProfile,
    /// Averages for the profile's indicators, default-row values filled in
    pub averages: BTreeMap<IndicatorKey, f64>,
    /// True when the label matched nothing and the default row was used
    pub is_fallback: bool,
}

impl ResolvedIndustry {
    pub fn benchmark(&self, key: IndicatorKey) -> Option<f64> {
        self.averages.get(&key).copied()
    }
}

/// Industry -> indicator -> average value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkTable {
    rows: Vec<IndustryRow>,
    default_key: String,
}

impl BenchmarkTable {
    /// Build a table; the default row must be present
    pub fn new(rows: Vec<IndustryRow>, default_key: impl Into<String>) -> Result<Self> {
        let default_key = default_key.into();
        if !rows.iter().any(|r| r.key == default_key) {
            return Err(Error::InvalidConfig(format!(
                "Default industry '{}' has no benchmark row",
                default_key
            )));
        }
        Ok(Self { rows, default_key })
    }

    /// Process-wide table built from the embedded configuration
    pub fn builtin() -> &'static BenchmarkTable {
        &config::embedded().benchmarks
    }

    /// Minimal table used when the embedded configuration cannot be parsed
    pub(crate) fn fallback() -> Self {
        let row = IndustryRow::new("default", IndustryProfile::General)
            .with_name("All industries")
            .with_average(IndicatorKey::Roa, 4.0)
            .with_average(IndicatorKey::Roe, 9.0)
            .with_average(IndicatorKey::DebtRatio, 100.0)
            .with_average(IndicatorKey::CurrentRatio, 130.0)
            .with_average(IndicatorKey::OperatingMargin, 8.0)
            .with_average(IndicatorKey::NetProfitMargin, 6.0);
        Self {
            rows: vec![row],
            default_key: "default".to_string(),
        }
    }

    pub fn rows(&self) -> &[IndustryRow] {
        &self.rows
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn default_row(&self) -> Option<&IndustryRow> {
        self.rows.iter().find(|r| r.key == self.default_key)
    }

    /// Find the row for a label without falling back
    pub fn find(&self, label: &str) -> Option<&IndustryRow> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        self.rows.iter().find(|r| r.matches(label))
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<IndustryRow> {
        &mut self.rows
    }

    pub(crate) fn set_default_key(&mut self, key: String) {
        self.default_key = key;
    }

    /// Average for one indicator, falling back to the default row
    pub fn lookup(&self, industry: &str, key: IndicatorKey) -> Option<f64> {
        self.find(industry)
            .and_then(|row| row.averages.get(&key).copied())
            .or_else(|| {
                self.default_row()
                    .and_then(|row| row.averages.get(&key).copied())
            })
    }

    /// Resolve a label to its row (or the default row) with filled averages
    pub fn resolve(&self, industry: &str) -> ResolvedIndustry {
        let (row, is_fallback) = match self.find(industry) {
            Some(row) => (Some(row), false),
            None => {
                tracing::debug!(
                    industry = industry,
                    default = self.default_key.as_str(),
                    "Unknown industry, using default benchmarks"
                );
                (self.default_row(), true)
            }
        };

        let (key, name, profile) = match row {
            Some(row) => (row.key.clone(), row.name.clone(), row.profile),
            None => (
                self.default_key.clone(),
                self.default_key.clone(),
                IndustryProfile::General,
            ),
        };

        let averages = profile
            .indicators()
            .iter()
            .filter_map(|&indicator| {
                self.lookup(&key, indicator)
                    .map(|value| (indicator, value))
            })
            .collect();

        ResolvedIndustry {
            requested: industry.to_string(),
            key,
            name,
            profile,
            averages,
            is_fallback,
        }
    }
}

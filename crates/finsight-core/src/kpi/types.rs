//! Core types for KPI computation

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::normalize::CanonicalField;

/// Financial indicators the calculator knows how to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKey {
    /// Return on assets
    Roa,
    /// Return on equity
    Roe,
    /// Total liabilities over total equity
    DebtRatio,
    /// Current assets over current liabilities
    CurrentRatio,
    OperatingMargin,
    NetProfitMargin,
    /// Net interest margin (banks)
    Nim,
    /// Capital adequacy ratio (banks)
    BisCapitalRatio,
}

impl IndicatorKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKey::Roa => "roa",
            IndicatorKey::Roe => "roe",
            IndicatorKey::DebtRatio => "debt_ratio",
            IndicatorKey::CurrentRatio => "current_ratio",
            IndicatorKey::OperatingMargin => "operating_margin",
            IndicatorKey::NetProfitMargin => "net_profit_margin",
            IndicatorKey::Nim => "nim",
            IndicatorKey::BisCapitalRatio => "bis_capital_ratio",
        }
    }

    /// Display name
    pub fn title(&self) -> &'static str {
        match self {
            IndicatorKey::Roa => "ROA",
            IndicatorKey::Roe => "ROE",
            IndicatorKey::DebtRatio => "Debt ratio",
            IndicatorKey::CurrentRatio => "Current ratio",
            IndicatorKey::OperatingMargin => "Operating margin",
            IndicatorKey::NetProfitMargin => "Net profit margin",
            IndicatorKey::Nim => "NIM",
            IndicatorKey::BisCapitalRatio => "BIS capital ratio",
        }
    }

    pub fn all() -> &'static [IndicatorKey] {
        &[
            IndicatorKey::Roa,
            IndicatorKey::Roe,
            IndicatorKey::DebtRatio,
            IndicatorKey::CurrentRatio,
            IndicatorKey::OperatingMargin,
            IndicatorKey::NetProfitMargin,
            IndicatorKey::Nim,
            IndicatorKey::BisCapitalRatio,
        ]
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IndicatorKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roa" => Ok(IndicatorKey::Roa),
            "roe" => Ok(IndicatorKey::Roe),
            "debt_ratio" => Ok(IndicatorKey::DebtRatio),
            "current_ratio" => Ok(IndicatorKey::CurrentRatio),
            "operating_margin" => Ok(IndicatorKey::OperatingMargin),
            "net_profit_margin" => Ok(IndicatorKey::NetProfitMargin),
            "nim" => Ok(IndicatorKey::Nim),
            "bis_capital_ratio" => Ok(IndicatorKey::BisCapitalRatio),
            _ => Err(format!("Unknown indicator: {}", s)),
        }
    }
}

/// Qualitative band for an indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    /// Not computable (missing line item or zero denominator)
    Error,
}

impl KpiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiStatus::Excellent => "excellent",
            KpiStatus::Good => "good",
            KpiStatus::Fair => "fair",
            KpiStatus::Poor => "poor",
            KpiStatus::Error => "error",
        }
    }
}

impl fmt::Display for KpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One computed indicator with its prior-period comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiResult {
    pub key: IndicatorKey,
    pub name: String,
    pub value: f64,
    pub previous_value: f64,
    /// value - previous_value
    pub change: f64,
    /// change / previous_value * 100, or 0 when previous_value is 0
    pub change_rate: f64,
    pub status: KpiStatus,
    pub unit: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numerator: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denominator: Option<f64>,
    /// Why the indicator could not be computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl KpiResult {
    pub fn is_error(&self) -> bool {
        self.status == KpiStatus::Error
    }
}

/// Indicator key -> result, ordered by key
pub type KpiSet = BTreeMap<IndicatorKey, KpiResult>;

/// Direction of a year-over-year movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Flat => "flat",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Flat => "–",
        }
    }
}

/// Year-over-year movement of one canonical line item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_rate: f64,
    pub direction: Direction,
}

/// Canonical field -> trend, ordered by field
pub type TrendSet = BTreeMap<CanonicalField, Trend>;

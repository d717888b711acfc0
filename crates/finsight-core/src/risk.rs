//! Aggregate risk scoring
//!
//! Sums severity weights over the triggered weaknesses, clamps the result to
//! 0-100 and maps it onto a tier. Adding a weakness never lowers the score.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::weakness::{Severity, Weakness};

/// Risk tier derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Safe,
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe",
            RiskTier::Low => "Low risk",
            RiskTier::Medium => "Medium risk",
            RiskTier::High => "High risk",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskTier::Safe => "Financial condition is sound.",
            RiskTier::Low => "Minor weaknesses found; keep them under review.",
            RiskTier::Medium => "Several weaknesses need attention.",
            RiskTier::High => "Serious weaknesses found; immediate improvement is needed.",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scored risk assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskLevel {
    pub level: RiskTier,
    /// 0-100
    pub score: u32,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    fn weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.config.critical_weight,
            Severity::Warning => self.config.warning_weight,
            Severity::Info => self.config.info_weight,
        }
    }

    fn tier(&self, score: u32) -> RiskTier {
        if score >= self.config.high_threshold {
            RiskTier::High
        } else if score >= self.config.medium_threshold {
            RiskTier::Medium
        } else if score >= self.config.low_threshold {
            RiskTier::Low
        } else {
            RiskTier::Safe
        }
    }

    pub fn score(&self, weaknesses: &[Weakness]) -> RiskLevel {
        let score = weaknesses
            .iter()
            .fold(0u32, |acc, w| acc.saturating_add(self.weight(w.severity)))
            .min(100);
        let level = self.tier(score);

        RiskLevel {
            level,
            score,
            label: level.label().to_string(),
            message: level.message().to_string(),
        }
    }
}

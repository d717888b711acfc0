//! Finsight Core Library
//!
//! Financial-statement analysis for a single company:
//! - Statement normalization from free-text account names
//! - Industry benchmark table with default fallback
//! - KPI computation for bank and general indicator sets
//! - Pluggable weakness rules with severity
//! - Risk scoring and improvement priorities
//! - Config loading with embedded defaults and override files

pub mod analysis;
pub mod benchmarks;
pub mod config;
pub mod error;
pub mod kpi;
pub mod models;
pub mod normalize;
pub mod priority;
pub mod risk;
pub mod weakness;

pub use analysis::{AnalysisReport, Analyzer, KpiReport, WeaknessReport};
pub use benchmarks::{BenchmarkTable, IndustryProfile, IndustryRow, ResolvedIndustry};
pub use config::{load_config, AnalysisConfig, ConfigSource, PriorityConfig, RiskConfig};
pub use error::{Error, Result};
pub use kpi::{Direction, IndicatorKey, KpiCalculator, KpiResult, KpiSet, KpiStatus, Trend};
pub use models::{FinancialStatement, StatementLineItem, StatementType};
pub use normalize::{CanonicalField, NormalizedStatement, Period, StatementNormalizer};
pub use priority::{Priority, PriorityRanker};
pub use risk::{RiskLevel, RiskScorer, RiskTier};
pub use weakness::{Category, RuleContext, Severity, Weakness, WeaknessRule, WeaknessRuleEngine};

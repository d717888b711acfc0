//! KPI computation
//!
//! Turns a normalized statement into the indicator set for an industry
//! profile, each with a prior-period comparison and a qualitative status,
//! plus year-over-year trends for the headline line items.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finsight_core::kpi::KpiCalculator;
//!
//! let kpis = KpiCalculator::new().compute(&normalized, IndustryProfile::General);
//! ```

pub mod calculator;
pub mod types;

pub use calculator::{round2, KpiCalculator};
pub use types::{Direction, IndicatorKey, KpiResult, KpiSet, KpiStatus, Trend, TrendSet};

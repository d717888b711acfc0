//! Weakness Rule Engine
//!
//! Pluggable rules that compare a company's indicators against its industry
//! benchmarks and flag weaknesses with a severity. Rules are independent and
//! run in registration order; the output preserves that order.
//!
//! ## Built-in Rules
//!
//! - **R01** High debt ratio (general)
//! - **R02** Negative operating cash flow in both years
//! - **R03** ROE falling three periods running
//! - **R04** Operating margin below the industry lower quartile
//! - **R05** Current ratio under 100% (general)
//! - **R06/R07** ROA/ROE well below the industry average
//! - **R08/R09** Thin net interest margin / capital buffer (banks)
//! - **R10** Debt ratio rising fast (informational)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use finsight_core::weakness::{RuleContext, WeaknessRuleEngine};
//!
//! let engine = WeaknessRuleEngine::new();
//! let ctx = RuleContext::new(&kpis, &industry).with_operating_cash_flow(-10.0, -5.0);
//! let weaknesses = engine.evaluate(&ctx);
//! ```

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::{RuleContext, WeaknessRule, WeaknessRuleEngine};
pub use rules::{
    builtin_rules, severity_for, Anchor, Margin, NegativeCashFlowRule, RisingLeverageRule,
    RoeDeclineRule, ThresholdRule, Unfavourable,
};
pub use types::{Category, Severity, Weakness};

//! Weakness rule engine - runs registered rules against a KPI set

use std::collections::BTreeMap;

use crate::benchmarks::{IndustryProfile, ResolvedIndustry};
use crate::kpi::{IndicatorKey, KpiResult, KpiSet};

use super::rules;
use super::types::Weakness;

/// Inputs available to weakness rules
pub struct RuleContext<'a> {
    /// Current-period indicators for the industry's profile
    pub kpis: &'a KpiSet,
    /// Resolved industry row with benchmark averages
    pub industry: &'a ResolvedIndustry,
    /// Operating cash flow (current, previous), when reported
    pub operating_cash_flow: Option<(f64, f64)>,
    /// ROE values oldest first, ending with the current period
    pub roe_series: Vec<f64>,
    /// Raw previous-period indicator values that were computable
    pub previous: BTreeMap<IndicatorKey, f64>,
}

impl<'a> RuleContext<'a> {
    pub fn new(kpis: &'a KpiSet, industry: &'a ResolvedIndustry) -> Self {
        Self {
            kpis,
            industry,
            operating_cash_flow: None,
            roe_series: vec![],
            previous: BTreeMap::new(),
        }
    }

    pub fn with_operating_cash_flow(mut self, current: f64, previous: f64) -> Self {
        self.operating_cash_flow = Some((current, previous));
        self
    }

    pub fn with_roe_series(mut self, series: Vec<f64>) -> Self {
        self.roe_series = series;
        self
    }

    pub fn with_previous(mut self, key: IndicatorKey, value: f64) -> Self {
        self.previous.insert(key, value);
        self
    }

    pub fn profile(&self) -> IndustryProfile {
        self.industry.profile
    }

    /// A computed (non-error) indicator of the active set
    pub fn kpi(&self, key: IndicatorKey) -> Option<&KpiResult> {
        self.kpis.get(&key).filter(|k| !k.is_error())
    }

    pub fn benchmark(&self, key: IndicatorKey) -> Option<f64> {
        self.industry.benchmark(key)
    }
}

/// Trait for weakness rules
pub trait WeaknessRule: Send + Sync {
    /// Stable identifier (e.g., "R01")
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Whether the rule runs for an industry profile
    fn applies_to(&self, profile: IndustryProfile) -> bool;

    /// Check the context, returning a weakness when the rule triggers
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<Weakness>;
}

/// Runs rules in registration order
pub struct WeaknessRuleEngine {
    rules: Vec<Box<dyn WeaknessRule>>,
}

impl Default for WeaknessRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WeaknessRuleEngine {
    /// Create an engine with the built-in rule set
    pub fn new() -> Self {
        let mut engine = Self::empty();
        for rule in rules::builtin_rules() {
            engine.register(rule);
        }
        engine
    }

    /// Create an engine with no rules
    pub fn empty() -> Self {
        Self { rules: vec![] }
    }

    /// Register a rule
    pub fn register(&mut self, rule: Box<dyn WeaknessRule>) {
        self.rules.push(rule);
    }

    /// Evaluate every applicable rule, preserving registration order
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Weakness> {
        let profile = ctx.profile();
        let weaknesses: Vec<Weakness> = self
            .rules
            .iter()
            .filter(|rule| rule.applies_to(profile))
            .filter_map(|rule| {
                let found = rule.evaluate(ctx);
                if let Some(ref w) = found {
                    tracing::debug!(
                        rule = rule.id(),
                        severity = w.severity.as_str(),
                        current = w.current_value,
                        benchmark = w.benchmark_value,
                        "Weakness rule triggered"
                    );
                }
                found
            })
            .collect();

        tracing::debug!(
            industry = ctx.industry.key.as_str(),
            profile = profile.as_str(),
            count = weaknesses.len(),
            "Weakness evaluation complete"
        );
        weaknesses
    }

    /// Identifiers of the registered rules
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

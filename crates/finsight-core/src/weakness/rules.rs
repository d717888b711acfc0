//! Built-in weakness rules
//!
//! Threshold rules share one severity scheme: the deviation is the distance
//! from an anchor (industry average or fixed reference) in the unfavourable
//! direction. A rule triggers when the deviation exceeds its margin and is
//! critical when the deviation exceeds 1.5x the margin. A zero margin makes
//! any deviation critical.

use crate::benchmarks::IndustryProfile;
use crate::kpi::IndicatorKey;

use super::engine::{RuleContext, WeaknessRule};
use super::types::{Category, Severity, Weakness};

const ALL: &[IndustryProfile] = &[IndustryProfile::General, IndustryProfile::Bank];
const GENERAL: &[IndustryProfile] = &[IndustryProfile::General];
const BANK: &[IndustryProfile] = &[IndustryProfile::Bank];

/// Severity for a deviation past a margin, None below the margin
pub fn severity_for(deviation: f64, margin: f64) -> Option<Severity> {
    let margin = margin.abs();
    if deviation > margin * 1.5 {
        Some(Severity::Critical)
    } else if deviation > margin {
        Some(Severity::Warning)
    } else {
        None
    }
}

/// Rule set in definition order
pub fn builtin_rules() -> Vec<Box<dyn WeaknessRule>> {
    vec![
        Box::new(DEBT_RATIO_RULE),
        Box::new(NegativeCashFlowRule),
        Box::new(RoeDeclineRule),
        Box::new(OPERATING_MARGIN_RULE),
        Box::new(CURRENT_RATIO_RULE),
        Box::new(ROA_RULE),
        Box::new(ROE_RULE),
        Box::new(NIM_RULE),
        Box::new(BIS_RULE),
        Box::new(RisingLeverageRule::default()),
    ]
}

/// Which side of the anchor is bad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unfavourable {
    Above,
    Below,
}

/// What a threshold rule measures against
#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    /// The industry average for the rule's indicator
    Benchmark,
    Fixed(f64),
}

#[derive(Debug, Clone, Copy)]
pub enum Margin {
    /// Absolute margin in indicator units
    Points(f64),
    /// Share of the anchor value
    FractionOfAnchor(f64),
}

/// Data-driven rule comparing one indicator against an anchor
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    pub id: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub indicator: IndicatorKey,
    pub profiles: &'static [IndustryProfile],
    pub unfavourable: Unfavourable,
    pub anchor: Anchor,
    pub margin: Margin,
    pub recommendation: &'static str,
    pub impact: &'static str,
}

impl ThresholdRule {
    fn reference_label(&self) -> &'static str {
        match self.anchor {
            Anchor::Benchmark => "industry average",
            Anchor::Fixed(_) => "reference",
        }
    }
}

impl WeaknessRule for ThresholdRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.title
    }

    fn applies_to(&self, profile: IndustryProfile) -> bool {
        self.profiles.contains(&profile) && profile.includes(self.indicator)
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<Weakness> {
        let value = ctx.kpi(self.indicator)?.value;
        let anchor = match self.anchor {
            Anchor::Benchmark => ctx.benchmark(self.indicator)?,
            Anchor::Fixed(v) => v,
        };
        let margin = match self.margin {
            Margin::Points(p) => p,
            Margin::FractionOfAnchor(f) => anchor * f,
        };
        let deviation = match self.unfavourable {
            Unfavourable::Above => value - anchor,
            Unfavourable::Below => anchor - value,
        };
        let severity = severity_for(deviation, margin)?;

        let side = match self.unfavourable {
            Unfavourable::Above => "above",
            Unfavourable::Below => "below",
        };
        Some(
            Weakness::new(self.id, self.title, severity, self.category)
                .with_values(value, anchor)
                .with_description(format!(
                    "{} of {:.2}% is {:.2} points {} the {} of {:.2}%",
                    self.indicator.title(),
                    value,
                    deviation,
                    side,
                    self.reference_label(),
                    anchor
                ))
                .with_recommendation(self.recommendation)
                .with_impact(self.impact),
        )
    }
}

pub const DEBT_RATIO_RULE: ThresholdRule = ThresholdRule {
    id: "R01",
    title: "High debt ratio",
    category: Category::Leverage,
    indicator: IndicatorKey::DebtRatio,
    profiles: GENERAL,
    unfavourable: Unfavourable::Above,
    anchor: Anchor::Benchmark,
    margin: Margin::Points(20.0),
    recommendation: "Pay down borrowings or strengthen equity through retained earnings or a capital raise",
    impact: "Heavier interest burden and refinancing risk; weaker credit standing",
};

pub const OPERATING_MARGIN_RULE: ThresholdRule = ThresholdRule {
    id: "R04",
    title: "Weak operating profitability",
    category: Category::Profitability,
    indicator: IndicatorKey::OperatingMargin,
    profiles: ALL,
    unfavourable: Unfavourable::Below,
    anchor: Anchor::Benchmark,
    margin: Margin::FractionOfAnchor(0.5),
    recommendation: "Review the cost structure and pricing; shift the mix toward higher-margin lines",
    impact: "Little buffer against downturns and limited capacity to reinvest",
};

pub const CURRENT_RATIO_RULE: ThresholdRule = ThresholdRule {
    id: "R05",
    title: "Liquidity shortfall",
    category: Category::Liquidity,
    indicator: IndicatorKey::CurrentRatio,
    profiles: GENERAL,
    unfavourable: Unfavourable::Below,
    anchor: Anchor::Fixed(100.0),
    margin: Margin::Points(0.0),
    recommendation: "Secure short-term funding and term out short-term borrowings",
    impact: "Current liabilities exceed current assets; short-term obligations may go unmet",
};

pub const ROA_RULE: ThresholdRule = ThresholdRule {
    id: "R06",
    title: "Low return on assets",
    category: Category::Profitability,
    indicator: IndicatorKey::Roa,
    profiles: ALL,
    unfavourable: Unfavourable::Below,
    anchor: Anchor::Benchmark,
    margin: Margin::FractionOfAnchor(0.2),
    recommendation: "Dispose of idle assets and raise asset turnover",
    impact: "Assets generate less profit than peers",
};

pub const ROE_RULE: ThresholdRule = ThresholdRule {
    id: "R07",
    title: "Low return on equity",
    category: Category::Profitability,
    indicator: IndicatorKey::Roe,
    profiles: ALL,
    unfavourable: Unfavourable::Below,
    anchor: Anchor::Benchmark,
    margin: Margin::FractionOfAnchor(0.2),
    recommendation: "Improve margins and capital efficiency; consider returning surplus capital",
    impact: "Shareholder returns trail the industry, pressuring valuation",
};

pub const NIM_RULE: ThresholdRule = ThresholdRule {
    id: "R08",
    title: "Narrow net interest margin",
    category: Category::Profitability,
    indicator: IndicatorKey::Nim,
    profiles: BANK,
    unfavourable: Unfavourable::Below,
    anchor: Anchor::Benchmark,
    margin: Margin::FractionOfAnchor(0.2),
    recommendation: "Reprice loans and funding; grow low-cost core deposits",
    impact: "Core interest earnings are under pressure",
};

pub const BIS_RULE: ThresholdRule = ThresholdRule {
    id: "R09",
    title: "Thin capital buffer",
    category: Category::CapitalAdequacy,
    indicator: IndicatorKey::BisCapitalRatio,
    profiles: BANK,
    unfavourable: Unfavourable::Below,
    anchor: Anchor::Benchmark,
    margin: Margin::Points(2.5),
    recommendation: "Retain earnings, issue capital instruments or reduce risk-weighted assets",
    impact: "Regulatory limits on loan growth and dividends become likely",
};

/// R02: operating cash flow negative in both periods
///
/// Values are reported in percent so they rank against the other rules:
/// the current outflow as a share of last year's, against 100.
#[derive(Debug, Clone, Default)]
pub struct NegativeCashFlowRule;

impl WeaknessRule for NegativeCashFlowRule {
    fn id(&self) -> &'static str {
        "R02"
    }

    fn name(&self) -> &'static str {
        "Operating cash outflow"
    }

    fn applies_to(&self, _profile: IndustryProfile) -> bool {
        true
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<Weakness> {
        let (current, previous) = ctx.operating_cash_flow?;
        if current >= 0.0 || previous >= 0.0 {
            return None;
        }

        let outflow_ratio = current.abs() / previous.abs() * 100.0;
        let severity = if outflow_ratio > 150.0 {
            Severity::Critical
        } else {
            Severity::Warning
        };

        Some(
            Weakness::new(self.id(), self.name(), severity, Category::CashFlow)
                .with_values(outflow_ratio, 100.0)
                .with_description(format!(
                    "Operating cash flow was negative in both years ({:.0} this year, {:.0} last year)",
                    current, previous
                ))
                .with_recommendation(
                    "Tighten working capital: collect receivables faster, cut inventory and review payment terms",
                )
                .with_impact("Operations depend on outside financing; liquidity can deteriorate quickly"),
        )
    }
}

/// R03: ROE strictly decreasing over the last three periods
#[derive(Debug, Clone, Default)]
pub struct RoeDeclineRule;

impl WeaknessRule for RoeDeclineRule {
    fn id(&self) -> &'static str {
        "R03"
    }

    fn name(&self) -> &'static str {
        "Deteriorating ROE"
    }

    fn applies_to(&self, profile: IndustryProfile) -> bool {
        profile.includes(IndicatorKey::Roe)
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<Weakness> {
        let current = ctx.kpi(IndicatorKey::Roe)?;
        let series = &ctx.roe_series;
        if series.len() < 3 {
            return None;
        }
        let window = &series[series.len() - 3..];
        if !window.windows(2).all(|w| w[1] < w[0]) {
            return None;
        }

        let path = window
            .iter()
            .map(|v| format!("{:.2}%", v))
            .collect::<Vec<_>>()
            .join(" -> ");
        Some(
            Weakness::new(self.id(), self.name(), Severity::Critical, Category::Profitability)
                .with_values(current.value, window[0])
                .with_description(format!("ROE fell for consecutive years: {}", path))
                .with_recommendation(
                    "Review capital efficiency: restore margins, release idle assets and revisit payout policy",
                )
                .with_impact("Sustained decline in shareholder returns"),
        )
    }
}

/// R10: debt ratio up sharply year over year (informational)
#[derive(Debug, Clone)]
pub struct RisingLeverageRule {
    /// Percentage-point rise that triggers the rule
    pub threshold: f64,
}

impl Default for RisingLeverageRule {
    fn default() -> Self {
        Self { threshold: 20.0 }
    }
}

impl WeaknessRule for RisingLeverageRule {
    fn id(&self) -> &'static str {
        "R10"
    }

    fn name(&self) -> &'static str {
        "Rising leverage"
    }

    fn applies_to(&self, profile: IndustryProfile) -> bool {
        profile == IndustryProfile::General
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Option<Weakness> {
        let current = ctx.kpi(IndicatorKey::DebtRatio)?.value;
        let previous = *ctx.previous.get(&IndicatorKey::DebtRatio)?;
        let rise = current - previous;
        if rise <= self.threshold {
            return None;
        }

        Some(
            Weakness::new(self.id(), self.name(), Severity::Info, Category::Leverage)
                .with_values(current, previous)
                .with_description(format!(
                    "Debt ratio rose {:.2} points year over year ({:.2}% -> {:.2}%)",
                    rise, previous, current
                ))
                .with_recommendation("Keep borrowing growth in line with earnings growth")
                .with_impact("Leverage is building up even if still within the industry range"),
        )
    }
}

//! Indicator formulas and status tiers

use crate::benchmarks::IndustryProfile;
use crate::normalize::{CanonicalField, NormalizedStatement, Period};

use super::types::{Direction, IndicatorKey, KpiResult, KpiSet, KpiStatus, Trend, TrendSet};

/// Line items reported in the trend section
const TREND_FIELDS: &[CanonicalField] = &[
    CanonicalField::Revenue,
    CanonicalField::OperatingIncome,
    CanonicalField::NetIncome,
    CanonicalField::TotalAssets,
    CanonicalField::TotalLiabilities,
    CanonicalField::TotalEquity,
    CanonicalField::ComprehensiveIncome,
    CanonicalField::OperatingCashFlow,
];

/// Round to two decimal places for output
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How an indicator value is derived from line items
#[derive(Debug, Clone, Copy)]
enum Formula {
    /// numerator / denominator * 100
    Ratio {
        numerator: CanonicalField,
        denominator: CanonicalField,
    },
    /// (interest income - interest expense) / interest-earning assets * 100
    NetInterestMargin,
    /// Reported BIS ratio, else equity / assets * 100
    CapitalRatio,
}

/// Status cut-offs
#[derive(Debug, Clone, Copy)]
enum Tiers {
    HigherIsBetter { excellent: f64, good: f64, fair: f64 },
    LowerIsBetter { excellent: f64, good: f64, fair: f64 },
}

impl Tiers {
    fn classify(&self, value: f64) -> KpiStatus {
        match *self {
            Tiers::HigherIsBetter {
                excellent,
                good,
                fair,
            } => {
                if value >= excellent {
                    KpiStatus::Excellent
                } else if value >= good {
                    KpiStatus::Good
                } else if value >= fair {
                    KpiStatus::Fair
                } else {
                    KpiStatus::Poor
                }
            }
            Tiers::LowerIsBetter {
                excellent,
                good,
                fair,
            } => {
                if value < excellent {
                    KpiStatus::Excellent
                } else if value < good {
                    KpiStatus::Good
                } else if value < fair {
                    KpiStatus::Fair
                } else {
                    KpiStatus::Poor
                }
            }
        }
    }
}

struct IndicatorDef {
    key: IndicatorKey,
    description: &'static str,
    formula: Formula,
    tiers: Tiers,
}

const INDICATORS: &[IndicatorDef] = &[
    IndicatorDef {
        key: IndicatorKey::Roa,
        description: "Net income / total assets x 100",
        formula: Formula::Ratio {
            numerator: CanonicalField::NetIncome,
            denominator: CanonicalField::TotalAssets,
        },
        tiers: Tiers::HigherIsBetter {
            excellent: 5.0,
            good: 2.0,
            fair: 0.0,
        },
    },
    IndicatorDef {
        key: IndicatorKey::Roe,
        description: "Net income / total equity x 100",
        formula: Formula::Ratio {
            numerator: CanonicalField::NetIncome,
            denominator: CanonicalField::TotalEquity,
        },
        tiers: Tiers::HigherIsBetter {
            excellent: 10.0,
            good: 5.0,
            fair: 0.0,
        },
    },
    IndicatorDef {
        key: IndicatorKey::DebtRatio,
        description: "Total liabilities / total equity x 100",
        formula: Formula::Ratio {
            numerator: CanonicalField::TotalLiabilities,
            denominator: CanonicalField::TotalEquity,
        },
        tiers: Tiers::LowerIsBetter {
            excellent: 100.0,
            good: 150.0,
            fair: 200.0,
        },
    },
    IndicatorDef {
        key: IndicatorKey::CurrentRatio,
        description: "Current assets / current liabilities x 100",
        formula: Formula::Ratio {
            numerator: CanonicalField::CurrentAssets,
            denominator: CanonicalField::CurrentLiabilities,
        },
        tiers: Tiers::HigherIsBetter {
            excellent: 150.0,
            good: 100.0,
            fair: 70.0,
        },
    },
    IndicatorDef {
        key: IndicatorKey::OperatingMargin,
        description: "Operating income / revenue x 100",
        formula: Formula::Ratio {
            numerator: CanonicalField::OperatingIncome,
            denominator: CanonicalField::Revenue,
        },
        tiers: Tiers::HigherIsBetter {
            excellent: 15.0,
            good: 5.0,
            fair: 0.0,
        },
    },
    IndicatorDef {
        key: IndicatorKey::NetProfitMargin,
        description: "Net income / revenue x 100",
        formula: Formula::Ratio {
            numerator: CanonicalField::NetIncome,
            denominator: CanonicalField::Revenue,
        },
        tiers: Tiers::HigherIsBetter {
            excellent: 10.0,
            good: 3.0,
            fair: 0.0,
        },
    },
    IndicatorDef {
        key: IndicatorKey::Nim,
        description: "(Interest income - interest expense) / interest-earning assets x 100",
        formula: Formula::NetInterestMargin,
        tiers: Tiers::HigherIsBetter {
            excellent: 2.0,
            good: 1.5,
            fair: 0.0,
        },
    },
    IndicatorDef {
        key: IndicatorKey::BisCapitalRatio,
        description: "Reported BIS ratio, else total equity / total assets x 100",
        formula: Formula::CapitalRatio,
        tiers: Tiers::HigherIsBetter {
            excellent: 13.0,
            good: 10.5,
            fair: 8.0,
        },
    },
];

fn definition(key: IndicatorKey) -> Option<&'static IndicatorDef> {
    INDICATORS.iter().find(|d| d.key == key)
}

/// Raw value of one indicator for one period
#[derive(Debug, Clone, Copy)]
struct Computed {
    value: f64,
    numerator: Option<f64>,
    denominator: Option<f64>,
}

impl Computed {
    fn ratio(numerator: f64, denominator: f64) -> Self {
        Self {
            value: numerator / denominator * 100.0,
            numerator: Some(numerator),
            denominator: Some(denominator),
        }
    }
}

fn required(
    statement: &NormalizedStatement,
    field: CanonicalField,
    period: Period,
) -> Result<f64, String> {
    statement
        .value(field, period)
        .ok_or_else(|| format!("Missing line item: {}", field))
}

fn evaluate(
    formula: Formula,
    statement: &NormalizedStatement,
    period: Period,
) -> Result<Computed, String> {
    match formula {
        Formula::Ratio {
            numerator,
            denominator,
        } => {
            let num = required(statement, numerator, period)?;
            let den = required(statement, denominator, period)?;
            if den == 0.0 {
                return Err(format!("Zero denominator: {}", denominator));
            }
            Ok(Computed::ratio(num, den))
        }
        Formula::NetInterestMargin => {
            let income = required(statement, CanonicalField::InterestIncome, period)?;
            let expense = statement.amount(CanonicalField::InterestExpense, period);
            let assets = [CanonicalField::LoansReceivable, CanonicalField::TotalAssets]
                .iter()
                .filter_map(|&field| statement.value(field, period))
                .find(|&v| v != 0.0)
                .ok_or_else(|| "Missing or zero interest-earning assets".to_string())?;
            Ok(Computed::ratio(income - expense, assets))
        }
        Formula::CapitalRatio => {
            if let Some(reported) = statement.value(CanonicalField::BisCapitalRatio, period) {
                return Ok(Computed {
                    value: reported,
                    numerator: None,
                    denominator: None,
                });
            }
            let equity = required(statement, CanonicalField::TotalEquity, period)?;
            let assets = required(statement, CanonicalField::TotalAssets, period)?;
            if assets == 0.0 {
                return Err(format!("Zero denominator: {}", CanonicalField::TotalAssets));
            }
            Ok(Computed::ratio(equity, assets))
        }
    }
}

fn change_rate(change: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        change / previous * 100.0
    }
}

/// Computes indicator sets and trends from normalized statements
#[derive(Debug, Clone, Default)]
pub struct KpiCalculator;

impl KpiCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute every indicator of the profile
    pub fn compute(&self, statement: &NormalizedStatement, profile: IndustryProfile) -> KpiSet {
        profile
            .indicators()
            .iter()
            .filter_map(|&key| definition(key))
            .map(|def| (def.key, self.compute_one(def, statement)))
            .collect()
    }

    /// Raw (unrounded) indicator value for one period, None when not computable
    pub fn value_for(
        &self,
        key: IndicatorKey,
        statement: &NormalizedStatement,
        period: Period,
    ) -> Option<f64> {
        let def = definition(key)?;
        evaluate(def.formula, statement, period)
            .ok()
            .map(|c| c.value)
            .filter(|v| v.is_finite())
    }

    fn compute_one(&self, def: &IndicatorDef, statement: &NormalizedStatement) -> KpiResult {
        let current = evaluate(def.formula, statement, Period::Current).and_then(|c| {
            if c.value.is_finite() {
                Ok(c)
            } else {
                Err("Value is not a finite number".to_string())
            }
        });

        match current {
            Ok(computed) => {
                let previous = self
                    .value_for(def.key, statement, Period::Previous)
                    .unwrap_or(0.0);
                let change = computed.value - previous;
                KpiResult {
                    key: def.key,
                    name: def.key.title().to_string(),
                    value: round2(computed.value),
                    previous_value: round2(previous),
                    change: round2(change),
                    change_rate: round2(change_rate(change, previous)),
                    status: def.tiers.classify(computed.value),
                    unit: "%".to_string(),
                    description: def.description.to_string(),
                    numerator: computed.numerator,
                    denominator: computed.denominator,
                    message: None,
                }
            }
            Err(message) => {
                tracing::debug!(
                    indicator = def.key.as_str(),
                    reason = message.as_str(),
                    "Indicator not computable"
                );
                KpiResult {
                    key: def.key,
                    name: def.key.title().to_string(),
                    value: 0.0,
                    previous_value: 0.0,
                    change: 0.0,
                    change_rate: 0.0,
                    status: KpiStatus::Error,
                    unit: "%".to_string(),
                    description: def.description.to_string(),
                    numerator: None,
                    denominator: None,
                    message: Some(message),
                }
            }
        }
    }

    /// Year-over-year movement of the headline line items present
    pub fn trends(&self, statement: &NormalizedStatement) -> TrendSet {
        TREND_FIELDS
            .iter()
            .filter_map(|&field| {
                let resolved = statement.get(field)?;
                let change = resolved.current - resolved.previous;
                let direction = if change > 0.0 {
                    Direction::Up
                } else if change < 0.0 {
                    Direction::Down
                } else {
                    Direction::Flat
                };
                Some((
                    field,
                    Trend {
                        current: resolved.current,
                        previous: resolved.previous,
                        change,
                        change_rate: round2(change_rate(change, resolved.previous)),
                        direction,
                    },
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(fields: &[(CanonicalField, f64, f64)]) -> NormalizedStatement {
        let mut s = NormalizedStatement::default();
        for &(field, current, previous) in fields {
            s.insert(field, current, previous);
        }
        s
    }

    #[test]
    fn test_roa_excellent() {
        let s = statement(&[
            (CanonicalField::NetIncome, 100.0, 50.0),
            (CanonicalField::TotalAssets, 1000.0, 1000.0),
        ]);
        let kpis = KpiCalculator::new().compute(&s, IndustryProfile::General);
        let roa = &kpis[&IndicatorKey::Roa];
        assert_eq!(roa.value, 10.0);
        assert_eq!(roa.status, KpiStatus::Excellent);
        assert_eq!(roa.previous_value, 5.0);
        assert_eq!(roa.change, 5.0);
        assert_eq!(roa.change_rate, 100.0);
        assert_eq!(roa.numerator, Some(100.0));
        assert_eq!(roa.denominator, Some(1000.0));
    }

    #[test]
    fn test_zero_denominator_is_error() {
        let s = statement(&[
            (CanonicalField::NetIncome, 0.0, 0.0),
            (CanonicalField::TotalAssets, 0.0, 0.0),
        ]);
        let kpis = KpiCalculator::new().compute(&s, IndustryProfile::General);
        let roa = &kpis[&IndicatorKey::Roa];
        assert_eq!(roa.status, KpiStatus::Error);
        assert_eq!(roa.value, 0.0);
        assert!(roa.message.as_deref().unwrap().contains("total_assets"));
    }

    #[test]
    fn test_missing_item_is_error() {
        let s = statement(&[(CanonicalField::TotalAssets, 1000.0, 900.0)]);
        let kpis = KpiCalculator::new().compute(&s, IndustryProfile::General);
        let roa = &kpis[&IndicatorKey::Roa];
        assert!(roa.is_error());
        assert_eq!(roa.value, 0.0);
        assert_eq!(roa.message.as_deref(), Some("Missing line item: net_income"));
    }

    #[test]
    fn test_every_indicator_errors_on_zero_denominators() {
        let mut s = NormalizedStatement::default();
        for &field in CanonicalField::all() {
            if field != CanonicalField::BisCapitalRatio {
                s.insert(field, 0.0, 0.0);
            }
        }
        let calc = KpiCalculator::new();
        for profile in [IndustryProfile::General, IndustryProfile::Bank] {
            for (key, kpi) in calc.compute(&s, profile) {
                assert_eq!(kpi.status, KpiStatus::Error, "{} should error", key);
                assert_eq!(kpi.value, 0.0);
            }
        }
    }

    #[test]
    fn test_debt_ratio_tiers() {
        let calc = KpiCalculator::new();
        let cases = [
            (90.0, KpiStatus::Excellent),
            (100.0, KpiStatus::Good),
            (199.0, KpiStatus::Fair),
            (300.0, KpiStatus::Poor),
        ];
        for (liabilities, expected) in cases {
            let s = statement(&[
                (CanonicalField::TotalLiabilities, liabilities, 0.0),
                (CanonicalField::TotalEquity, 100.0, 0.0),
            ]);
            let kpis = calc.compute(&s, IndustryProfile::General);
            assert_eq!(kpis[&IndicatorKey::DebtRatio].status, expected);
        }
    }

    #[test]
    fn test_nim_with_loans() {
        let s = statement(&[
            (CanonicalField::InterestIncome, 80.0, 70.0),
            (CanonicalField::InterestExpense, 30.0, 30.0),
            (CanonicalField::LoansReceivable, 1000.0, 1000.0),
            (CanonicalField::TotalAssets, 5000.0, 5000.0),
        ]);
        let kpis = KpiCalculator::new().compute(&s, IndustryProfile::Bank);
        let nim = &kpis[&IndicatorKey::Nim];
        assert_eq!(nim.value, 5.0);
        assert_eq!(nim.previous_value, 4.0);
        assert_eq!(nim.status, KpiStatus::Excellent);
    }

    #[test]
    fn test_nim_falls_back_to_total_assets() {
        let s = statement(&[
            (CanonicalField::InterestIncome, 80.0, 0.0),
            (CanonicalField::LoansReceivable, 0.0, 0.0),
            (CanonicalField::TotalAssets, 4000.0, 0.0),
        ]);
        let value = KpiCalculator::new()
            .value_for(IndicatorKey::Nim, &s, Period::Current)
            .unwrap();
        assert!((value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_bis_reported_or_derived() {
        let calc = KpiCalculator::new();

        let reported = statement(&[
            (CanonicalField::BisCapitalRatio, 15.2, 14.8),
            (CanonicalField::TotalEquity, 50.0, 50.0),
            (CanonicalField::TotalAssets, 1000.0, 1000.0),
        ]);
        let kpis = calc.compute(&reported, IndustryProfile::Bank);
        assert_eq!(kpis[&IndicatorKey::BisCapitalRatio].value, 15.2);
        assert_eq!(kpis[&IndicatorKey::BisCapitalRatio].status, KpiStatus::Excellent);

        let derived = statement(&[
            (CanonicalField::TotalEquity, 90.0, 0.0),
            (CanonicalField::TotalAssets, 1000.0, 0.0),
        ]);
        let kpis = calc.compute(&derived, IndustryProfile::Bank);
        assert_eq!(kpis[&IndicatorKey::BisCapitalRatio].value, 9.0);
        assert_eq!(kpis[&IndicatorKey::BisCapitalRatio].status, KpiStatus::Fair);
    }

    #[test]
    fn test_profile_key_sets() {
        let calc = KpiCalculator::new();
        let s = NormalizedStatement::default();

        let bank: Vec<_> = calc.compute(&s, IndustryProfile::Bank).into_keys().collect();
        assert_eq!(
            bank,
            vec![
                IndicatorKey::Roa,
                IndicatorKey::Roe,
                IndicatorKey::OperatingMargin,
                IndicatorKey::Nim,
                IndicatorKey::BisCapitalRatio,
            ]
        );

        let general: Vec<_> = calc
            .compute(&s, IndustryProfile::General)
            .into_keys()
            .collect();
        assert_eq!(
            general,
            vec![
                IndicatorKey::Roa,
                IndicatorKey::Roe,
                IndicatorKey::DebtRatio,
                IndicatorKey::CurrentRatio,
                IndicatorKey::OperatingMargin,
                IndicatorKey::NetProfitMargin,
            ]
        );
    }

    #[test]
    fn test_previous_zero_change_rate() {
        let s = statement(&[
            (CanonicalField::NetIncome, 100.0, 0.0),
            (CanonicalField::TotalAssets, 1000.0, 0.0),
        ]);
        let kpis = KpiCalculator::new().compute(&s, IndustryProfile::General);
        let roa = &kpis[&IndicatorKey::Roa];
        assert_eq!(roa.previous_value, 0.0);
        assert_eq!(roa.change_rate, 0.0);
        assert_eq!(roa.change, 10.0);
    }

    #[test]
    fn test_status_uses_unrounded_value() {
        // 4.999 rounds to 5.0 for display but stays below the excellent line
        let s = statement(&[
            (CanonicalField::NetIncome, 4.999, 0.0),
            (CanonicalField::TotalAssets, 100.0, 0.0),
        ]);
        let kpis = KpiCalculator::new().compute(&s, IndustryProfile::General);
        let roa = &kpis[&IndicatorKey::Roa];
        assert_eq!(roa.value, 5.0);
        assert_eq!(roa.status, KpiStatus::Good);
    }

    #[test]
    fn test_trends() {
        let s = statement(&[
            (CanonicalField::Revenue, 1200.0, 1000.0),
            (CanonicalField::NetIncome, 80.0, 100.0),
            (CanonicalField::TotalEquity, 500.0, 500.0),
            (CanonicalField::OperatingCashFlow, -20.0, 0.0),
        ]);
        let trends = KpiCalculator::new().trends(&s);

        assert_eq!(trends.len(), 4);
        let revenue = &trends[&CanonicalField::Revenue];
        assert_eq!(revenue.change, 200.0);
        assert_eq!(revenue.change_rate, 20.0);
        assert_eq!(revenue.direction, Direction::Up);
        assert_eq!(trends[&CanonicalField::NetIncome].direction, Direction::Down);
        assert_eq!(trends[&CanonicalField::TotalEquity].direction, Direction::Flat);
        assert_eq!(trends[&CanonicalField::OperatingCashFlow].change_rate, 0.0);
        assert!(!trends.contains_key(&CanonicalField::TotalAssets));
    }
}

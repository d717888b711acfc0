//! Analysis pipeline
//!
//! Wires the normalizer, KPI calculator, rule engine, risk scorer and
//! priority ranker together for one request. The benchmark table is shared
//! read-only, so one [`Analyzer`] can serve concurrent callers.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::benchmarks::{BenchmarkTable, ResolvedIndustry};
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::kpi::{IndicatorKey, KpiCalculator, KpiSet, TrendSet};
use crate::models::FinancialStatement;
use crate::normalize::{CanonicalField, NormalizedStatement, Period, StatementNormalizer};
use crate::priority::{Priority, PriorityRanker};
use crate::risk::{RiskLevel, RiskScorer};
use crate::weakness::{RuleContext, Severity, Weakness, WeaknessRuleEngine};

/// KPI response
#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    pub corp_code: String,
    pub fiscal_year: i32,
    pub industry: ResolvedIndustry,
    pub kpis: KpiSet,
    pub trends: TrendSet,
}

/// Weakness-analysis response
#[derive(Debug, Clone, Serialize)]
pub struct WeaknessReport {
    pub corp_code: String,
    pub fiscal_year: i32,
    /// Industry label as requested
    pub industry_requested: String,
    /// Industry row actually used
    pub industry: String,
    pub benchmark: BTreeMap<IndicatorKey, f64>,
    pub weaknesses: Vec<Weakness>,
    pub risk_level: RiskLevel,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub info_issues: usize,
    pub priorities: Vec<Priority>,
}

/// Comprehensive report
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub kpi: KpiReport,
    pub weakness: WeaknessReport,
}

/// Request-scoped analysis over a shared benchmark table
pub struct Analyzer {
    benchmarks: Arc<BenchmarkTable>,
    normalizer: StatementNormalizer,
    calculator: KpiCalculator,
    engine: WeaknessRuleEngine,
    scorer: RiskScorer,
    ranker: PriorityRanker,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self::with_benchmarks(Arc::new(config.benchmarks.clone()), config)
    }

    /// Share an existing benchmark table
    pub fn with_benchmarks(benchmarks: Arc<BenchmarkTable>, config: &AnalysisConfig) -> Self {
        Self {
            benchmarks,
            normalizer: StatementNormalizer::new(),
            calculator: KpiCalculator::new(),
            engine: WeaknessRuleEngine::new(),
            scorer: RiskScorer::new(config.risk.clone()),
            ranker: PriorityRanker::new(config.priorities.top_n),
        }
    }

    /// Replace the rule engine (custom rule sets)
    pub fn with_engine(mut self, engine: WeaknessRuleEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Override the priority cap
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.ranker = PriorityRanker::new(top_n);
        self
    }

    pub fn benchmarks(&self) -> &BenchmarkTable {
        &self.benchmarks
    }

    /// Normalize a statement, failing when nothing usable remains
    pub fn normalize(&self, statement: &FinancialStatement) -> Result<NormalizedStatement> {
        if statement.is_empty() {
            return Err(Error::EmptyStatement {
                corp_code: statement.corp_code.clone(),
            });
        }
        let normalized = self.normalizer.normalize(&statement.items);
        if normalized.is_empty() {
            return Err(Error::EmptyStatement {
                corp_code: statement.corp_code.clone(),
            });
        }
        tracing::debug!(
            corp_code = statement.corp_code.as_str(),
            items = statement.items.len(),
            resolved = normalized.resolved_count(),
            "Statement normalized"
        );
        Ok(normalized)
    }

    pub fn kpi_report(&self, statement: &FinancialStatement, industry: &str) -> Result<KpiReport> {
        let normalized = self.normalize(statement)?;
        let resolved = self.benchmarks.resolve(industry);
        Ok(self.build_kpi_report(statement, &normalized, resolved))
    }

    /// Weakness analysis; `earlier` holds prior-year statements for the ROE series
    pub fn weakness_report(
        &self,
        statement: &FinancialStatement,
        industry: &str,
        earlier: &[FinancialStatement],
    ) -> Result<WeaknessReport> {
        let normalized = self.normalize(statement)?;
        let resolved = self.benchmarks.resolve(industry);
        let kpis = self.calculator.compute(&normalized, resolved.profile);
        Ok(self.build_weakness_report(statement, &normalized, &resolved, &kpis, earlier))
    }

    pub fn report(
        &self,
        statement: &FinancialStatement,
        industry: &str,
        earlier: &[FinancialStatement],
    ) -> Result<AnalysisReport> {
        let normalized = self.normalize(statement)?;
        let resolved = self.benchmarks.resolve(industry);
        let kpi = self.build_kpi_report(statement, &normalized, resolved.clone());
        let weakness =
            self.build_weakness_report(statement, &normalized, &resolved, &kpi.kpis, earlier);

        Ok(AnalysisReport {
            generated_at: Utc::now(),
            kpi,
            weakness,
        })
    }

    fn build_kpi_report(
        &self,
        statement: &FinancialStatement,
        normalized: &NormalizedStatement,
        industry: ResolvedIndustry,
    ) -> KpiReport {
        KpiReport {
            corp_code: statement.corp_code.clone(),
            fiscal_year: statement.fiscal_year,
            kpis: self.calculator.compute(normalized, industry.profile),
            trends: self.calculator.trends(normalized),
            industry,
        }
    }

    fn build_weakness_report(
        &self,
        statement: &FinancialStatement,
        normalized: &NormalizedStatement,
        industry: &ResolvedIndustry,
        kpis: &KpiSet,
        earlier: &[FinancialStatement],
    ) -> WeaknessReport {
        let mut ctx = RuleContext::new(kpis, industry)
            .with_roe_series(self.roe_series(statement, normalized, kpis, earlier));

        if let Some(ocf) = normalized.get(CanonicalField::OperatingCashFlow) {
            ctx = ctx.with_operating_cash_flow(ocf.current, ocf.previous);
        }
        for &key in industry.profile.indicators() {
            if let Some(value) = self.calculator.value_for(key, normalized, Period::Previous) {
                ctx = ctx.with_previous(key, value);
            }
        }

        let weaknesses = self.engine.evaluate(&ctx);
        let risk_level = self.scorer.score(&weaknesses);
        let priorities = self.ranker.rank(&weaknesses);
        let count = |severity: Severity| weaknesses.iter().filter(|w| w.severity == severity).count();

        tracing::debug!(
            corp_code = statement.corp_code.as_str(),
            industry = industry.key.as_str(),
            weaknesses = weaknesses.len(),
            score = risk_level.score,
            "Weakness analysis complete"
        );

        WeaknessReport {
            corp_code: statement.corp_code.clone(),
            fiscal_year: statement.fiscal_year,
            industry_requested: industry.requested.clone(),
            industry: industry.key.clone(),
            benchmark: industry.averages.clone(),
            total_issues: weaknesses.len(),
            critical_issues: count(Severity::Critical),
            warning_issues: count(Severity::Warning),
            info_issues: count(Severity::Info),
            risk_level,
            priorities,
            weaknesses,
        }
    }

    /// ROE oldest first: earlier statements, previous period, current period.
    ///
    /// Dated history only extends the series while the years stay
    /// contiguous; the walk stops at the first missing year or at a year
    /// whose ROE can't be computed.
    fn roe_series(
        &self,
        statement: &FinancialStatement,
        normalized: &NormalizedStatement,
        kpis: &KpiSet,
        earlier: &[FinancialStatement],
    ) -> Vec<f64> {
        let current = kpis
            .get(&IndicatorKey::Roe)
            .filter(|k| !k.is_error())
            .and_then(|_| {
                self.calculator
                    .value_for(IndicatorKey::Roe, normalized, Period::Current)
            });
        let Some(current) = current else {
            return Vec::new();
        };
        let Some(previous) = self
            .calculator
            .value_for(IndicatorKey::Roe, normalized, Period::Previous)
        else {
            return vec![current];
        };

        // Newest first while walking back, reversed at the end
        let mut series = vec![current, previous];

        if statement.fiscal_year == 0 {
            let mut history: Vec<&FinancialStatement> = earlier.iter().collect();
            history.sort_by_key(|s| s.fiscal_year);
            series.extend(history.iter().rev().filter_map(|s| self.statement_roe(s)));
        } else {
            let mut by_year: BTreeMap<i32, &FinancialStatement> = BTreeMap::new();
            for s in earlier.iter().filter(|s| s.fiscal_year != 0) {
                by_year.entry(s.fiscal_year).or_insert(s);
            }

            if by_year.is_empty() {
                // Undated history is taken as given, oldest first
                series.extend(earlier.iter().rev().filter_map(|s| self.statement_roe(s)));
            } else {
                let undated = earlier.iter().filter(|s| s.fiscal_year == 0).count();
                if undated > 0 {
                    tracing::debug!(undated, "Ignoring undated statements in dated history");
                }

                let mut expected = statement.fiscal_year.checked_sub(2);
                while let Some(year) = expected {
                    let Some(roe) = by_year.get(&year).and_then(|s| self.statement_roe(s))
                    else {
                        break;
                    };
                    series.push(roe);
                    expected = year.checked_sub(1);
                }
            }
        }

        series.reverse();
        series
    }

    /// Current-period ROE of a standalone statement
    fn statement_roe(&self, statement: &FinancialStatement) -> Option<f64> {
        let normalized = self.normalizer.normalize(&statement.items);
        self.calculator
            .value_for(IndicatorKey::Roe, &normalized, Period::Current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StatementLineItem, StatementType};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_analyzer_is_send_sync() {
        assert_send_sync::<Analyzer>();
    }

    #[test]
    fn test_empty_statement_is_fatal() {
        let analyzer = Analyzer::default();
        let statement = FinancialStatement::new("00126380", 2023, "");
        let err = analyzer.kpi_report(&statement, "").unwrap_err();
        assert!(matches!(err, Error::EmptyStatement { ref corp_code } if corp_code == "00126380"));
    }

    #[test]
    fn test_unrecognised_items_are_fatal() {
        let analyzer = Analyzer::default();
        let statement = FinancialStatement::new("00126380", 2023, "").with_item(
            StatementLineItem::new("기타항목", StatementType::Other, 1.0, 1.0),
        );
        assert!(matches!(
            analyzer.weakness_report(&statement, "", &[]),
            Err(Error::EmptyStatement { .. })
        ));
    }

    #[test]
    fn test_custom_engine_and_top_n() {
        let statement = FinancialStatement::new("c", 2023, "")
            .with_item(StatementLineItem::new(
                "부채총계",
                StatementType::BalanceSheet,
                900.0,
                100.0,
            ))
            .with_item(StatementLineItem::new(
                "자본총계",
                StatementType::BalanceSheet,
                100.0,
                100.0,
            ));

        let report = Analyzer::default()
            .with_top_n(1)
            .weakness_report(&statement, "", &[])
            .unwrap();
        assert_eq!(report.total_issues, 2);
        assert_eq!(report.priorities.len(), 1);
        assert_eq!(report.priorities[0].rule_id, "R01");

        let report = Analyzer::default()
            .with_engine(WeaknessRuleEngine::empty())
            .weakness_report(&statement, "", &[])
            .unwrap();
        assert!(report.weaknesses.is_empty());
        assert_eq!(report.risk_level.score, 0);
    }

    #[test]
    fn test_roe_series_skips_overlapping_years() {
        let analyzer = Analyzer::default();
        let make = |year: i32, income: f64, prev_income: f64| {
            FinancialStatement::new("c", year, "")
                .with_item(StatementLineItem::new(
                    "당기순이익",
                    StatementType::IncomeStatement,
                    income,
                    prev_income,
                ))
                .with_item(StatementLineItem::new(
                    "자본총계",
                    StatementType::BalanceSheet,
                    100.0,
                    100.0,
                ))
        };

        let current = make(2023, 4.0, 8.0);
        let earlier = vec![make(2022, 8.0, 12.0), make(2021, 12.0, 15.0)];
        let normalized = analyzer.normalize(&current).unwrap();
        let resolved = analyzer.benchmarks().resolve("");
        let kpis = analyzer.calculator.compute(&normalized, resolved.profile);

        let series = analyzer.roe_series(&current, &normalized, &kpis, &earlier);
        assert_series(&series, &[12.0, 8.0, 4.0]);
    }

    fn history_fixture(year: i32, income: f64, prev_income: f64) -> FinancialStatement {
        FinancialStatement::new("c", year, "")
            .with_item(StatementLineItem::new(
                "당기순이익",
                StatementType::IncomeStatement,
                income,
                prev_income,
            ))
            .with_item(StatementLineItem::new(
                "자본총계",
                StatementType::BalanceSheet,
                100.0,
                100.0,
            ))
    }

    fn assert_series(series: &[f64], expected: &[f64]) {
        assert_eq!(series.len(), expected.len(), "{:?}", series);
        for (got, want) in series.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
        }
    }

    fn series_for(
        analyzer: &Analyzer,
        current: &FinancialStatement,
        earlier: &[FinancialStatement],
    ) -> Vec<f64> {
        let normalized = analyzer.normalize(current).unwrap();
        let resolved = analyzer.benchmarks().resolve("");
        let kpis = analyzer.calculator.compute(&normalized, resolved.profile);
        analyzer.roe_series(current, &normalized, &kpis, earlier)
    }

    #[test]
    fn test_roe_series_stops_at_year_gap() {
        let analyzer = Analyzer::default();
        let current = history_fixture(2023, 4.0, 8.0);

        // FY2021 is missing, so FY2020 must not be treated as adjacent
        let earlier = vec![history_fixture(2020, 30.0, 40.0)];
        assert_series(&series_for(&analyzer, &current, &earlier), &[8.0, 4.0]);

        let earlier = vec![
            history_fixture(2019, 50.0, 60.0),
            history_fixture(2021, 12.0, 15.0),
            history_fixture(2020, 30.0, 40.0),
        ];
        assert_series(
            &series_for(&analyzer, &current, &earlier),
            &[50.0, 30.0, 12.0, 8.0, 4.0],
        );
    }

    #[test]
    fn test_roe_series_stops_at_uncomputable_year() {
        let analyzer = Analyzer::default();
        let current = history_fixture(2023, 4.0, 8.0);
        let no_equity = FinancialStatement::new("c", 2021, "").with_item(
            StatementLineItem::new("당기순이익", StatementType::IncomeStatement, 12.0, 15.0),
        );
        let earlier = vec![no_equity, history_fixture(2020, 30.0, 40.0)];

        assert_series(&series_for(&analyzer, &current, &earlier), &[8.0, 4.0]);
    }

    #[test]
    fn test_roe_series_extreme_fiscal_year() {
        let analyzer = Analyzer::default();
        let current = history_fixture(i32::MIN, 4.0, 8.0);
        let earlier = vec![history_fixture(2020, 30.0, 40.0)];

        assert_series(&series_for(&analyzer, &current, &earlier), &[8.0, 4.0]);
        assert!(analyzer.weakness_report(&current, "", &earlier).is_ok());
        assert!(analyzer.report(&current, "", &earlier).is_ok());

        let current = history_fixture(i32::MIN + 1, 4.0, 8.0);
        assert_series(&series_for(&analyzer, &current, &earlier), &[8.0, 4.0]);

        let report = analyzer.weakness_report(&current, "", &earlier);
        assert!(report.is_ok());
    }
}

//! Statement normalization
//!
//! Maps free-text account names onto canonical fields. Each field has an
//! ordered alias list; names and aliases are compared after removing
//! whitespace, stripping leading ordinals ("1.", "(2)", "Ⅲ.", "가.") and
//! lower-casing. Aliases are tried in priority order: an exact match on any
//! alias wins first, then the first line item (in source order) whose name
//! contains the alias.
//!
//! A field that matches nothing is *missing*, which is tracked separately
//! from a genuine zero balance. Disclosure taxonomies differ between filers,
//! so a missing field usually means "named differently", not "zero".

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{StatementLineItem, StatementType};

/// Reporting period within a two-year statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Current,
    Previous,
}

/// Canonical line items the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Revenue,
    OperatingIncome,
    NetIncome,
    ComprehensiveIncome,
    TotalAssets,
    TotalLiabilities,
    TotalEquity,
    CurrentAssets,
    CurrentLiabilities,
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
    InterestIncome,
    InterestExpense,
    LoansReceivable,
    BisCapitalRatio,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::OperatingIncome => "operating_income",
            Self::NetIncome => "net_income",
            Self::ComprehensiveIncome => "comprehensive_income",
            Self::TotalAssets => "total_assets",
            Self::TotalLiabilities => "total_liabilities",
            Self::TotalEquity => "total_equity",
            Self::CurrentAssets => "current_assets",
            Self::CurrentLiabilities => "current_liabilities",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::InvestingCashFlow => "investing_cash_flow",
            Self::FinancingCashFlow => "financing_cash_flow",
            Self::InterestIncome => "interest_income",
            Self::InterestExpense => "interest_expense",
            Self::LoansReceivable => "loans_receivable",
            Self::BisCapitalRatio => "bis_capital_ratio",
        }
    }

    /// Get all canonical fields
    pub fn all() -> &'static [CanonicalField] {
        &[
            Self::Revenue,
            Self::OperatingIncome,
            Self::NetIncome,
            Self::ComprehensiveIncome,
            Self::TotalAssets,
            Self::TotalLiabilities,
            Self::TotalEquity,
            Self::CurrentAssets,
            Self::CurrentLiabilities,
            Self::OperatingCashFlow,
            Self::InvestingCashFlow,
            Self::FinancingCashFlow,
            Self::InterestIncome,
            Self::InterestExpense,
            Self::LoansReceivable,
            Self::BisCapitalRatio,
        ]
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("Unknown canonical field: {}", s))
    }
}

const BALANCE_SHEET: &[StatementType] = &[StatementType::BalanceSheet];
const INCOME: &[StatementType] = &[
    StatementType::IncomeStatement,
    StatementType::ComprehensiveIncome,
];
const CASH_FLOW: &[StatementType] = &[StatementType::CashFlow];
const ANY: &[StatementType] = &[
    StatementType::BalanceSheet,
    StatementType::IncomeStatement,
    StatementType::ComprehensiveIncome,
    StatementType::CashFlow,
    StatementType::Other,
];

/// Matching rule for one canonical field
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: CanonicalField,
    /// Alias keywords in priority order
    pub aliases: &'static [&'static str],
    /// Names containing any of these never match (e.g. "비유동" for current assets)
    pub excludes: &'static [&'static str],
    /// Statements the field may be taken from
    pub sources: &'static [StatementType],
}

/// Default alias table: DART (K-IFRS) names first, English names after
fn default_rules() -> Vec<FieldRule> {
    use CanonicalField::*;

    vec![
        FieldRule {
            field: Revenue,
            aliases: &["매출액", "수익(매출액)", "영업수익", "매출", "revenue", "sales"],
            excludes: &["원가", "총이익", "cost", "gross"],
            sources: INCOME,
        },
        FieldRule {
            field: OperatingIncome,
            aliases: &[
                "영업이익",
                "영업이익(손실)",
                "영업손익",
                "operatingincome",
                "operatingprofit",
            ],
            excludes: &[],
            sources: INCOME,
        },
        FieldRule {
            field: NetIncome,
            aliases: &[
                "당기순이익",
                "당기순이익(손실)",
                "계속영업당기순이익",
                "당기순손익",
                "지배기업의소유주에게귀속되는당기순이익",
                "netincome",
                "profitfortheyear",
                "netprofit",
            ],
            excludes: &["주당"],
            sources: INCOME,
        },
        FieldRule {
            field: ComprehensiveIncome,
            aliases: &[
                "총포괄이익",
                "총포괄손익",
                "당기총포괄이익",
                "지배기업의소유주에게귀속되는총포괄이익",
                "totalcomprehensiveincome",
            ],
            excludes: &[],
            sources: INCOME,
        },
        FieldRule {
            field: TotalAssets,
            aliases: &["자산총계", "자산총액", "totalassets"],
            excludes: &[],
            sources: BALANCE_SHEET,
        },
        FieldRule {
            field: TotalLiabilities,
            aliases: &["부채총계", "부채총액", "totalliabilities"],
            excludes: &["자본총계", "andequity"],
            sources: BALANCE_SHEET,
        },
        FieldRule {
            field: TotalEquity,
            aliases: &["자본총계", "자본총액", "totalequity", "shareholders'equity"],
            excludes: &["부채와자본", "liabilitiesand"],
            sources: BALANCE_SHEET,
        },
        FieldRule {
            field: CurrentAssets,
            aliases: &["유동자산", "currentassets"],
            excludes: &["비유동", "noncurrent", "non-current"],
            sources: BALANCE_SHEET,
        },
        FieldRule {
            field: CurrentLiabilities,
            aliases: &["유동부채", "currentliabilities"],
            excludes: &["비유동", "noncurrent", "non-current"],
            sources: BALANCE_SHEET,
        },
        FieldRule {
            field: OperatingCashFlow,
            aliases: &[
                "영업활동현금흐름",
                "영업활동으로인한현금흐름",
                "cashflowsfromoperatingactivities",
                "operatingcashflow",
            ],
            excludes: &[],
            sources: CASH_FLOW,
        },
        FieldRule {
            field: InvestingCashFlow,
            aliases: &[
                "투자활동현금흐름",
                "투자활동으로인한현금흐름",
                "cashflowsfrominvestingactivities",
                "investingcashflow",
            ],
            excludes: &[],
            sources: CASH_FLOW,
        },
        FieldRule {
            field: FinancingCashFlow,
            aliases: &[
                "재무활동현금흐름",
                "재무활동으로인한현금흐름",
                "cashflowsfromfinancingactivities",
                "financingcashflow",
            ],
            excludes: &[],
            sources: CASH_FLOW,
        },
        FieldRule {
            field: InterestIncome,
            aliases: &["이자수익", "interestincome"],
            excludes: &["순이자", "netinterest"],
            sources: INCOME,
        },
        FieldRule {
            field: InterestExpense,
            aliases: &["이자비용", "interestexpense"],
            excludes: &[],
            sources: INCOME,
        },
        FieldRule {
            field: LoansReceivable,
            aliases: &[
                "대출채권",
                "상각후원가측정대출채권",
                "loansreceivable",
                "loanstocustomers",
            ],
            excludes: &[],
            sources: BALANCE_SHEET,
        },
        FieldRule {
            field: BisCapitalRatio,
            aliases: &[
                "bis자기자본비율",
                "bis총자본비율",
                "bis비율",
                "총자본비율",
                "biscapitalratio",
                "capitaladequacyratio",
            ],
            excludes: &[],
            sources: ANY,
        },
    ]
}

fn ordinal_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\(\d+\)|\d+[.)]|[IVXivxⅠ-Ⅻ]+\.|[가-힣]\.)")
            .expect("valid regex")
    })
}

/// Normalize an account name or alias for comparison
///
/// Removes all whitespace, strips one leading ordinal prefix and lower-cases.
pub fn normalize_account_name(name: &str) -> String {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    ordinal_prefix().replace(&compact, "").to_lowercase()
}

/// A canonical field resolved from a specific line item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    /// Account name as it appeared in the filing
    pub account_name: String,
    pub current: f64,
    pub previous: f64,
}

impl ResolvedField {
    pub fn amount(&self, period: Period) -> f64 {
        match period {
            Period::Current => self.current,
            Period::Previous => self.previous,
        }
    }
}

/// Canonical view of a statement
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedStatement {
    fields: BTreeMap<CanonicalField, ResolvedField>,
}

impl NormalizedStatement {
    pub fn get(&self, field: CanonicalField) -> Option<&ResolvedField> {
        self.fields.get(&field)
    }

    /// Whether the field was found in the filing (a found zero is present)
    pub fn is_present(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Amount for a period, None when the field is missing
    pub fn value(&self, field: CanonicalField, period: Period) -> Option<f64> {
        self.get(field).map(|r| r.amount(period))
    }

    /// Amount for a period, reading 0 when the field is missing
    pub fn amount(&self, field: CanonicalField, period: Period) -> f64 {
        self.value(field, period).unwrap_or(0.0)
    }

    pub fn resolved_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&CanonicalField, &ResolvedField)> {
        self.fields.iter()
    }

    /// Insert a resolved field directly (mainly for tests)
    pub fn insert(&mut self, field: CanonicalField, current: f64, previous: f64) {
        self.fields.insert(
            field,
            ResolvedField {
                account_name: field.as_str().to_string(),
                current,
                previous,
            },
        );
    }
}

/// Extracts canonical amounts from raw line items
#[derive(Debug, Clone)]
pub struct StatementNormalizer {
    rules: Vec<FieldRule>,
}

impl Default for StatementNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementNormalizer {
    /// Create a normalizer with the built-in alias table
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Create a normalizer with a custom alias table
    pub fn with_rules(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Resolve every canonical field against the line items
    pub fn normalize(&self, items: &[StatementLineItem]) -> NormalizedStatement {
        let names: Vec<String> = items
            .iter()
            .map(|item| normalize_account_name(&item.account_name))
            .collect();

        let mut normalized = NormalizedStatement::default();
        for rule in &self.rules {
            match resolve(rule, items, &names) {
                Some(idx) => {
                    let item = &items[idx];
                    tracing::trace!(
                        field = rule.field.as_str(),
                        account = item.account_name.as_str(),
                        "Resolved canonical field"
                    );
                    normalized.fields.insert(
                        rule.field,
                        ResolvedField {
                            account_name: item.account_name.clone(),
                            current: item.current_amount,
                            previous: item.previous_amount,
                        },
                    );
                }
                None => {
                    tracing::trace!(field = rule.field.as_str(), "Canonical field missing");
                }
            }
        }
        normalized
    }
}

/// Index of the line item a rule resolves to
fn resolve(rule: &FieldRule, items: &[StatementLineItem], names: &[String]) -> Option<usize> {
    let aliases: Vec<String> = rule
        .aliases
        .iter()
        .map(|a| normalize_account_name(a))
        .collect();
    let excludes: Vec<String> = rule
        .excludes
        .iter()
        .map(|e| normalize_account_name(e))
        .collect();

    let candidate = |idx: &usize| {
        rule.sources.contains(&items[*idx].statement_type)
            && !excludes.iter().any(|e| names[*idx].contains(e.as_str()))
    };

    // Exact names beat containment so "유동자산" never lands on "비유동자산"
    for alias in &aliases {
        if let Some(idx) = (0..items.len())
            .filter(candidate)
            .find(|&i| names[i] == *alias)
        {
            return Some(idx);
        }
    }

    for alias in &aliases {
        if let Some(idx) = (0..items.len())
            .filter(candidate)
            .find(|&i| names[i].contains(alias.as_str()))
        {
            return Some(idx);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, kind: StatementType, current: f64, previous: f64) -> StatementLineItem {
        StatementLineItem::new(name, kind, current, previous)
    }

    #[test]
    fn test_normalize_account_name() {
        assert_eq!(normalize_account_name("1. 유동 자산"), "유동자산");
        assert_eq!(normalize_account_name("(2) 유동부채"), "유동부채");
        assert_eq!(normalize_account_name("Ⅲ. 자본총계"), "자본총계");
        assert_eq!(normalize_account_name("가. 매출액"), "매출액");
        assert_eq!(normalize_account_name("  Total Assets "), "totalassets");
        assert_eq!(normalize_account_name("IV. Net Income"), "netincome");
    }

    #[test]
    fn test_exact_match_beats_containment() {
        let items = vec![
            item("비유동자산", StatementType::BalanceSheet, 700.0, 600.0),
            item("유동자산", StatementType::BalanceSheet, 300.0, 250.0),
        ];
        let normalized = StatementNormalizer::new().normalize(&items);
        assert_eq!(
            normalized.amount(CanonicalField::CurrentAssets, Period::Current),
            300.0
        );
    }

    #[test]
    fn test_containment_in_source_order() {
        let items = vec![
            item("1. 당기순이익(손실)", StatementType::ComprehensiveIncome, 50.0, 40.0),
            item("지배기업의 소유주에게 귀속되는 당기순이익", StatementType::ComprehensiveIncome, 45.0, 35.0),
        ];
        let normalized = StatementNormalizer::new().normalize(&items);
        let resolved = normalized.get(CanonicalField::NetIncome).unwrap();
        assert_eq!(resolved.current, 50.0);
        assert_eq!(resolved.previous, 40.0);
    }

    #[test]
    fn test_alias_priority_order() {
        // "매출액" outranks the looser "영업수익" even though it appears later
        let items = vec![
            item("영업수익", StatementType::IncomeStatement, 10.0, 0.0),
            item("매출액", StatementType::IncomeStatement, 20.0, 0.0),
        ];
        let normalized = StatementNormalizer::new().normalize(&items);
        assert_eq!(normalized.amount(CanonicalField::Revenue, Period::Current), 20.0);
    }

    #[test]
    fn test_excludes_cost_lines_from_revenue() {
        let items = vec![
            item("매출원가", StatementType::IncomeStatement, 70.0, 60.0),
            item("매출", StatementType::IncomeStatement, 100.0, 90.0),
        ];
        let normalized = StatementNormalizer::new().normalize(&items);
        assert_eq!(normalized.amount(CanonicalField::Revenue, Period::Current), 100.0);
    }

    #[test]
    fn test_statement_type_restricts_sources() {
        let items = vec![
            item("영업활동현금흐름", StatementType::IncomeStatement, 1.0, 1.0),
            item("영업활동으로 인한 현금흐름", StatementType::CashFlow, -5.0, -3.0),
        ];
        let normalized = StatementNormalizer::new().normalize(&items);
        assert_eq!(
            normalized.value(CanonicalField::OperatingCashFlow, Period::Current),
            Some(-5.0)
        );
    }

    #[test]
    fn test_missing_is_distinct_from_zero() {
        let items = vec![item("부채총계", StatementType::BalanceSheet, 0.0, 0.0)];
        let normalized = StatementNormalizer::new().normalize(&items);

        assert!(normalized.is_present(CanonicalField::TotalLiabilities));
        assert_eq!(
            normalized.value(CanonicalField::TotalLiabilities, Period::Current),
            Some(0.0)
        );

        assert!(!normalized.is_present(CanonicalField::TotalEquity));
        assert_eq!(normalized.value(CanonicalField::TotalEquity, Period::Current), None);
        assert_eq!(normalized.amount(CanonicalField::TotalEquity, Period::Current), 0.0);
    }

    #[test]
    fn test_english_names() {
        let items = vec![
            item("Total assets", StatementType::BalanceSheet, 1000.0, 900.0),
            item("Net income", StatementType::IncomeStatement, 100.0, 80.0),
            item("Interest income", StatementType::IncomeStatement, 80.0, 70.0),
            item("Net interest income", StatementType::IncomeStatement, 50.0, 40.0),
        ];
        let normalized = StatementNormalizer::new().normalize(&items);
        assert_eq!(normalized.amount(CanonicalField::TotalAssets, Period::Previous), 900.0);
        assert_eq!(normalized.amount(CanonicalField::NetIncome, Period::Current), 100.0);
        assert_eq!(normalized.amount(CanonicalField::InterestIncome, Period::Current), 80.0);
    }

    #[test]
    fn test_empty_items() {
        let normalized = StatementNormalizer::new().normalize(&[]);
        assert!(normalized.is_empty());
        assert_eq!(normalized.resolved_count(), 0);
    }
}

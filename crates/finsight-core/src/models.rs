//! Statement input models
//!
//! The acquisition layer hands statements over in DART's record shape
//! (`account_nm`, `sj_div`, `thstrm_amount`, `frmtrm_amount`), with amounts
//! that may arrive as text. Both that shape and the canonical field names
//! deserialize into the same types.

use std::io::Read;

use csv::ReaderBuilder;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Which financial statement a line item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    BalanceSheet,
    IncomeStatement,
    ComprehensiveIncome,
    CashFlow,
    /// Any other disclosure (e.g. statement of changes in equity)
    Other,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
            Self::ComprehensiveIncome => "comprehensive_income",
            Self::CashFlow => "cash_flow",
            Self::Other => "other",
        }
    }

    /// DART `sj_div` code for this statement
    pub fn code(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "BS",
            Self::IncomeStatement => "IS",
            Self::ComprehensiveIncome => "CIS",
            Self::CashFlow => "CF",
            Self::Other => "-",
        }
    }
}

impl From<&str> for StatementType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "bs" | "balance_sheet" | "balancesheet" => Self::BalanceSheet,
            "is" | "income_statement" | "incomestatement" => Self::IncomeStatement,
            "cis" | "comprehensive_income" | "comprehensiveincome" => Self::ComprehensiveIncome,
            "cf" | "cash_flow" | "cashflow" => Self::CashFlow,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatementType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// One account line from a filing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLineItem {
    #[serde(alias = "account_nm")]
    pub account_name: String,
    #[serde(alias = "sj_div")]
    pub statement_type: StatementType,
    /// Current fiscal year amount
    #[serde(alias = "thstrm_amount", default, deserialize_with = "de_amount")]
    pub current_amount: f64,
    /// Prior fiscal year amount
    #[serde(alias = "frmtrm_amount", default, deserialize_with = "de_amount")]
    pub previous_amount: f64,
}

impl StatementLineItem {
    pub fn new(
        account_name: impl Into<String>,
        statement_type: StatementType,
        current_amount: f64,
        previous_amount: f64,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            statement_type,
            current_amount,
            previous_amount,
        }
    }
}

/// A single company's statement for one fiscal year
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialStatement {
    #[serde(default)]
    pub corp_code: String,
    #[serde(alias = "bsns_year", default, deserialize_with = "de_year")]
    pub fiscal_year: i32,
    #[serde(default)]
    pub industry: String,
    #[serde(alias = "list", default)]
    pub items: Vec<StatementLineItem>,
}

impl FinancialStatement {
    pub fn new(corp_code: impl Into<String>, fiscal_year: i32, industry: impl Into<String>) -> Self {
        Self {
            corp_code: corp_code.into(),
            fiscal_year,
            industry: industry.into(),
            items: Vec::new(),
        }
    }

    /// Append a line item (builder style)
    pub fn with_item(mut self, item: StatementLineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Parse a statement from JSON
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse line items from CSV with DART-style headers
    ///
    /// Required columns: `account_nm`, `sj_div`, `thstrm_amount`; `frmtrm_amount`
    /// is optional. Canonical names (`account_name`, ...) are accepted too.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        corp_code: impl Into<String>,
        fiscal_year: i32,
        industry: impl Into<String>,
    ) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |names: &[&str]| headers.iter().position(|h| names.contains(&h));

        let name_col = column(&["account_nm", "account_name"])
            .ok_or_else(|| Error::InvalidStatement("Missing account_nm column".into()))?;
        let type_col = column(&["sj_div", "statement_type"])
            .ok_or_else(|| Error::InvalidStatement("Missing sj_div column".into()))?;
        let current_col = column(&["thstrm_amount", "current_amount"])
            .ok_or_else(|| Error::InvalidStatement("Missing thstrm_amount column".into()))?;
        let previous_col = column(&["frmtrm_amount", "previous_amount"]);

        let mut statement = Self::new(corp_code, fiscal_year, industry);
        for result in rdr.records() {
            let record = result?;
            let account_name = record.get(name_col).unwrap_or_default();
            if account_name.is_empty() {
                continue;
            }
            let statement_type = StatementType::from(record.get(type_col).unwrap_or_default());
            let current_amount = coerce_amount(record.get(current_col).unwrap_or_default());
            let previous_amount = previous_col
                .and_then(|i| record.get(i))
                .map(coerce_amount)
                .unwrap_or(0.0);

            statement.items.push(StatementLineItem::new(
                account_name,
                statement_type,
                current_amount,
                previous_amount,
            ));
        }

        Ok(statement)
    }
}

/// Parse an amount as it appears in filings
///
/// Accepts thousands separators, currency symbols, surrounding whitespace and
/// accounting-style parentheses for negatives. Returns None for blanks, a bare
/// "-", or anything else that is not a number.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace([',', '$', '₩', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse-or-zero: malformed amounts become 0 rather than failing the statement
fn coerce_amount(s: &str) -> f64 {
    parse_amount(s).unwrap_or_else(|| {
        if !s.trim().is_empty() && s.trim() != "-" {
            debug!(raw = s, "Malformed amount coerced to zero");
        }
        0.0
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Number(n)) if n.is_finite() => n,
        Some(RawNumber::Number(_)) | None => 0.0,
        Some(RawNumber::Text(s)) => coerce_amount(&s),
    })
}

fn de_year<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i32, D::Error> {
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Number(n)) => n as i32,
        Some(RawNumber::Text(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_amount(" -42 "), Some(-42.0));
        assert_eq!(parse_amount("(1,000)"), Some(-1000.0));
        assert_eq!(parse_amount("₩500"), Some(500.0));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_statement_type_codes() {
        assert_eq!(StatementType::from("BS"), StatementType::BalanceSheet);
        assert_eq!(StatementType::from("cis"), StatementType::ComprehensiveIncome);
        assert_eq!(StatementType::from("cash_flow"), StatementType::CashFlow);
        assert_eq!(StatementType::from("SCE"), StatementType::Other);
        assert_eq!(StatementType::IncomeStatement.code(), "IS");
    }

    #[test]
    fn test_deserialize_dart_shape() {
        let json = r#"{
            "corp_code": "00126380",
            "bsns_year": "2023",
            "industry": "반도체 제조업",
            "list": [
                {"account_nm": "자산총계", "sj_div": "BS", "thstrm_amount": "1,000", "frmtrm_amount": "900"},
                {"account_nm": "당기순이익", "sj_div": "CIS", "thstrm_amount": 50, "frmtrm_amount": "-"},
                {"account_nm": "기타", "sj_div": "SCE", "thstrm_amount": "abc"}
            ]
        }"#;

        let statement = FinancialStatement::from_json_str(json).unwrap();
        assert_eq!(statement.fiscal_year, 2023);
        assert_eq!(statement.items.len(), 3);
        assert_eq!(statement.items[0].current_amount, 1000.0);
        assert_eq!(statement.items[0].previous_amount, 900.0);
        assert_eq!(statement.items[1].statement_type, StatementType::ComprehensiveIncome);
        assert_eq!(statement.items[1].current_amount, 50.0);
        assert_eq!(statement.items[1].previous_amount, 0.0);
        assert_eq!(statement.items[2].statement_type, StatementType::Other);
        assert_eq!(statement.items[2].current_amount, 0.0);
        assert_eq!(statement.items[2].previous_amount, 0.0);
    }

    #[test]
    fn test_deserialize_canonical_shape() {
        let json = r#"{
            "corp_code": "X",
            "fiscal_year": 2022,
            "items": [
                {"account_name": "Total assets", "statement_type": "balance_sheet",
                 "current_amount": 10.5, "previous_amount": 9}
            ]
        }"#;

        let statement = FinancialStatement::from_json_str(json).unwrap();
        assert_eq!(statement.fiscal_year, 2022);
        assert!(statement.industry.is_empty());
        assert_eq!(statement.items[0].statement_type, StatementType::BalanceSheet);
        assert_eq!(statement.items[0].current_amount, 10.5);
    }

    #[test]
    fn test_from_csv_reader() {
        let csv = "account_nm,sj_div,thstrm_amount,frmtrm_amount\n\
                   자산총계,BS,\"1,000\",900\n\
                   영업이익,IS,(50),-\n\
                   ,BS,1,1\n";

        let statement =
            FinancialStatement::from_csv_reader(csv.as_bytes(), "C1", 2023, "제조업").unwrap();
        assert_eq!(statement.items.len(), 2);
        assert_eq!(statement.items[0].current_amount, 1000.0);
        assert_eq!(statement.items[1].current_amount, -50.0);
        assert_eq!(statement.items[1].previous_amount, 0.0);
        assert_eq!(statement.industry, "제조업");
    }

    #[test]
    fn test_from_csv_missing_column() {
        let csv = "name,amount\nfoo,1\n";
        let err = FinancialStatement::from_csv_reader(csv.as_bytes(), "C1", 2023, "").unwrap_err();
        assert!(err.to_string().contains("account_nm"));
    }
}

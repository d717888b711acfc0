//! Analysis configuration
//!
//! Benchmark rows, risk weights and the priority cap live in
//! `config/analysis.toml`, compiled into the binary.
//!
//! ## Configuration Resolution
//!
//! 1. An explicit path (`--config`) if given
//! 2. The override in the data dir (~/.local/share/finsight/config/analysis.toml)
//! 3. The embedded defaults
//!
//! Override files are merged over the embedded defaults: sections and keys
//! they leave out keep their default values, and `[industries.<key>]` entries
//! either amend an existing row or add a new one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::benchmarks::{BenchmarkTable, IndustryProfile, IndustryRow};
use crate::error::{Error, Result};
use crate::kpi::IndicatorKey;

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/analysis.toml");

/// Risk score weights and tier thresholds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskConfig {
    pub critical_weight: u32,
    pub warning_weight: u32,
    pub info_weight: u32,
    pub high_threshold: u32,
    pub medium_threshold: u32,
    pub low_threshold: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            critical_weight: 3,
            warning_weight: 2,
            info_weight: 1,
            high_threshold: 60,
            medium_threshold: 30,
            low_threshold: 10,
        }
    }
}

/// Priority list settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityConfig {
    pub top_n: usize,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Embedded => write!(f, "embedded defaults"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub benchmarks: BenchmarkTable,
    pub risk: RiskConfig,
    pub priorities: PriorityConfig,
    pub source: ConfigSource,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        embedded().clone()
    }
}

impl AnalysisConfig {
    /// Label used when the caller gives no industry
    pub fn default_industry(&self) -> &str {
        self.benchmarks.default_key()
    }

    fn bare() -> Self {
        Self {
            benchmarks: BenchmarkTable::fallback(),
            risk: RiskConfig::default(),
            priorities: PriorityConfig::default(),
            source: ConfigSource::Embedded,
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let risk = &self.risk;
        if risk.high_threshold < risk.medium_threshold || risk.medium_threshold < risk.low_threshold
        {
            return Err(Error::InvalidConfig(format!(
                "Risk thresholds must satisfy high >= medium >= low (got {}/{}/{})",
                risk.high_threshold, risk.medium_threshold, risk.low_threshold
            )));
        }
        if risk.high_threshold > 100 {
            return Err(Error::InvalidConfig(format!(
                "Risk high_threshold must be at most 100 (got {})",
                risk.high_threshold
            )));
        }
        if self.priorities.top_n == 0 {
            return Err(Error::InvalidConfig(
                "priorities.top_n must be at least 1".to_string(),
            ));
        }
        for row in self.benchmarks.rows() {
            if let Some((key, value)) = row.averages.iter().find(|(_, v)| !v.is_finite()) {
                return Err(Error::InvalidConfig(format!(
                    "Benchmark {}.{} is not a finite number ({})",
                    row.key, key, value
                )));
            }
        }
        Ok(())
    }
}

/// Configuration parsed from the embedded TOML, initialised once
pub fn embedded() -> &'static AnalysisConfig {
    static EMBEDDED: OnceLock<AnalysisConfig> = OnceLock::new();
    EMBEDDED.get_or_init(|| {
        parse_into(DEFAULT_CONFIG, AnalysisConfig::bare()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Embedded config is invalid, using minimal defaults");
            AnalysisConfig::bare()
        })
    })
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finsight").join("config").join("analysis.toml"))
}

/// Load configuration (explicit path, then override location, then embedded)
pub fn load_config(override_path: Option<&Path>) -> Result<AnalysisConfig> {
    let path = match override_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::InvalidConfig(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Some(path.to_path_buf())
        }
        None => default_config_path().filter(|p| p.exists()),
    };

    let Some(path) = path else {
        return Ok(embedded().clone());
    };

    let content = fs::read_to_string(&path)?;

    tracing::debug!(path = %path.display(), "Loading config override");
    let mut config = parse_config(&content)?;
    config.source = ConfigSource::File(path);
    Ok(config)
}

/// Parse override TOML merged over the embedded defaults
pub fn parse_config(content: &str) -> Result<AnalysisConfig> {
    parse_into(content, embedded().clone())
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    risk: Option<RawRisk>,
    priorities: Option<RawPriorities>,
    industries: Option<BTreeMap<String, RawIndustry>>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    critical_weight: Option<u32>,
    warning_weight: Option<u32>,
    info_weight: Option<u32>,
    high_threshold: Option<u32>,
    medium_threshold: Option<u32>,
    low_threshold: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawPriorities {
    top_n: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawIndustry {
    name: Option<String>,
    aliases: Option<Vec<String>>,
    profile: Option<String>,
    averages: Option<BTreeMap<String, f64>>,
}

fn parse_into(content: &str, mut config: AnalysisConfig) -> Result<AnalysisConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if let Some(risk) = raw.risk {
        let target = &mut config.risk;
        if let Some(v) = risk.critical_weight {
            target.critical_weight = v;
        }
        if let Some(v) = risk.warning_weight {
            target.warning_weight = v;
        }
        if let Some(v) = risk.info_weight {
            target.info_weight = v;
        }
        if let Some(v) = risk.high_threshold {
            target.high_threshold = v;
        }
        if let Some(v) = risk.medium_threshold {
            target.medium_threshold = v;
        }
        if let Some(v) = risk.low_threshold {
            target.low_threshold = v;
        }
    }

    if let Some(top_n) = raw.priorities.and_then(|p| p.top_n) {
        config.priorities.top_n = top_n;
    }

    if let Some(industries) = raw.industries {
        for (key, raw_row) in industries {
            merge_industry(&mut config.benchmarks, key, raw_row)?;
        }
    }

    if let Some(industry) = raw.defaults.and_then(|d| d.industry) {
        let key = config
            .benchmarks
            .find(&industry)
            .map(|row| row.key.clone())
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "Default industry '{}' has no benchmark row",
                    industry
                ))
            })?;
        config.benchmarks.set_default_key(key);
    }

    config.validate()?;
    Ok(config)
}

fn merge_industry(table: &mut BenchmarkTable, key: String, raw: RawIndustry) -> Result<()> {
    let profile = raw
        .profile
        .map(|p| p.parse::<IndustryProfile>())
        .transpose()
        .map_err(|e| Error::InvalidConfig(format!("industries.{}: {}", key, e)))?;

    let mut averages = BTreeMap::new();
    for (name, value) in raw.averages.unwrap_or_default() {
        let indicator = name
            .parse::<IndicatorKey>()
            .map_err(|e| Error::InvalidConfig(format!("industries.{}.averages: {}", key, e)))?;
        averages.insert(indicator, value);
    }

    let rows = table.rows_mut();
    let row = match rows.iter_mut().position(|r| r.key == key) {
        Some(idx) => &mut rows[idx],
        None => {
            rows.push(IndustryRow::new(key, IndustryProfile::General));
            let last = rows.len() - 1;
            &mut rows[last]
        }
    };

    if let Some(name) = raw.name {
        row.name = name;
    }
    if let Some(aliases) = raw.aliases {
        row.aliases = aliases;
    }
    if let Some(profile) = profile {
        row.profile = profile;
    }
    row.averages.extend(averages);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_default_config() {
        let config = parse_into(DEFAULT_CONFIG, AnalysisConfig::bare()).unwrap();
        assert_eq!(config.risk, RiskConfig::default());
        assert_eq!(config.priorities.top_n, 5);
        assert_eq!(config.default_industry(), "default");
        assert!(config.benchmarks.rows().len() >= 16);
    }

    #[test]
    fn test_override_merges_sections() {
        let config = parse_config(
            r#"
            [risk]
            critical_weight = 20

            [priorities]
            top_n = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.risk.critical_weight, 20);
        // Untouched keys keep their defaults
        assert_eq!(config.risk.warning_weight, 2);
        assert_eq!(config.priorities.top_n, 3);
        assert!(config.benchmarks.find("bank").is_some());
    }

    #[test]
    fn test_override_amends_and_adds_industries() {
        let config = parse_config(
            r#"
            [industries.bank.averages]
            nim = 2.1

            [industries.shipbuilding]
            name = "Shipbuilding"
            aliases = ["조선업"]

            [industries.shipbuilding.averages]
            debt_ratio = 210.0
            "#,
        )
        .unwrap();

        let table = &config.benchmarks;
        assert_eq!(table.lookup("bank", IndicatorKey::Nim), Some(2.1));
        assert_eq!(table.lookup("bank", IndicatorKey::Roa), Some(0.6));
        assert_eq!(table.lookup("조선업", IndicatorKey::DebtRatio), Some(210.0));
        assert_eq!(
            table.find("shipbuilding").map(|r| r.profile),
            Some(IndustryProfile::General)
        );
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let err = parse_config(
            r#"
            [risk]
            high_threshold = 20
            medium_threshold = 30
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_indicator_rejected() {
        let err = parse_config(
            r#"
            [industries.bank.averages]
            ebitda_margin = 10.0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ebitda_margin"));
    }

    #[test]
    fn test_unknown_default_industry_rejected() {
        assert!(parse_config("[defaults]\nindustry = \"nowhere\"\n").is_err());
    }

    #[test]
    fn test_zero_top_n_rejected() {
        assert!(parse_config("[priorities]\ntop_n = 0\n").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[priorities]\ntop_n = 2").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.priorities.top_n, 2);
        assert_eq!(config.source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn test_malformed_toml_is_toml_error() {
        let err = parse_config("[risk\ncritical_weight = ").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_unreadable_config_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/analysis.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

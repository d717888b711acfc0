//! Error types for finsight

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The statement had no line items, or none resolved to a canonical field
    #[error("Empty statement: no usable line items for {corp_code}")]
    EmptyStatement { corp_code: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

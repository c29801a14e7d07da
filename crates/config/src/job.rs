// Job payload
// The JSON document a caller hands over to request one statement.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use cashflow_core::Locale;
use cashflow_engine::ReportOptions;

use crate::error::{ConfigError, Result};

/// Report parameters. Flags accept JSON booleans or `"true"`/`"false"`
/// strings; anything unrecognized reads as false.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobParams {
    pub locale: Option<String>,
    pub db_kind: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub include_active_periods: bool,
    #[serde(deserialize_with = "flag")]
    pub include_order_book: bool,
    #[serde(deserialize_with = "flag")]
    pub include_tax_accruals: bool,
    #[serde(deserialize_with = "flag")]
    pub include_vat_details: bool,
    #[serde(deserialize_with = "flag")]
    pub include_bank_balances: bool,
    #[serde(deserialize_with = "flag")]
    pub include_balance_sheet: bool,
    /// Fixed report time; defaults to the time of the run
    pub as_of: Option<DateTime<Utc>>,
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

// Field spellings seen in the wild. The first present one wins.
#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "Params")]
    params_pascal: Option<JobParams>,
    params: Option<JobParams>,
    #[serde(rename = "SqlConnection")]
    sql_connection_pascal: Option<String>,
    #[serde(rename = "sqlConnection")]
    sql_connection: Option<String>,
    #[serde(rename = "connectionString")]
    connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPayload {
    pub params: JobParams,
    pub connection: Option<String>,
}

impl From<RawPayload> for JobPayload {
    fn from(raw: RawPayload) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        Self {
            params: raw.params_pascal.or(raw.params).unwrap_or_default(),
            connection: non_empty(raw.sql_connection_pascal)
                .or_else(|| non_empty(raw.sql_connection))
                .or_else(|| non_empty(raw.connection_string)),
        }
    }
}

impl JobPayload {
    /// Parse a payload. A leading UTF-8 BOM is ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        let json = json.strip_prefix('\u{feff}').unwrap_or(json);
        let raw: RawPayload = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&text)
    }

    pub fn connection(&self) -> Result<&str> {
        self.connection.as_deref().ok_or(ConfigError::MissingConnection)
    }

    pub fn db_kind(&self) -> Option<&str> {
        self.params.db_kind.as_deref()
    }

    /// Normalized locale; `en-GB` when none is given.
    pub fn locale(&self) -> Locale {
        Locale::parse(self.params.locale.as_deref().unwrap_or_default())
    }

    pub fn report_options(&self, now: DateTime<Utc>) -> ReportOptions {
        let p = &self.params;
        let mut options = ReportOptions::new(p.as_of.unwrap_or(now));
        options.include_active_periods = p.include_active_periods;
        options.include_order_book = p.include_order_book;
        options.include_tax_accruals = p.include_tax_accruals;
        options.include_vat_details = p.include_vat_details;
        options.include_bank_balances = p.include_bank_balances;
        options.include_balance_sheet = p.include_balance_sheet;
        options
    }
}

//! Query result types consumed by the section renderers.
//!
//! Everything here is read-only once fetched. Optional numeric fields
//! default to zero so a sparse data source never fails a build.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Classification enums
// -----------------------------------------------------------------------------

/// Top-level cash classification. Codes match the data source's numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashType {
    Trade,
    Tax,
    Money,
}

impl CashType {
    pub fn code(self) -> i64 {
        match self {
            CashType::Trade => 0,
            CashType::Tax => 1,
            CashType::Money => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(CashType::Trade),
            1 => Some(CashType::Tax),
            2 => Some(CashType::Money),
            _ => None,
        }
    }
}

impl FromStr for CashType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return CashType::from_code(code).ok_or_else(|| format!("unknown cash type code {code}"));
        }
        match s.to_ascii_lowercase().as_str() {
            "trade" => Ok(CashType::Trade),
            "tax" => Ok(CashType::Tax),
            "money" => Ok(CashType::Money),
            _ => Err(format!("unknown cash type '{s}'; use Trade, Money or Tax")),
        }
    }
}

impl fmt::Display for CashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CashType::Trade => "Trade",
            CashType::Tax => "Tax",
            CashType::Money => "Money",
        })
    }
}

/// Direction of a category's cash. Expense totals are negated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashPolarity {
    Expense,
    Income,
    #[default]
    Neutral,
}

impl CashPolarity {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => CashPolarity::Expense,
            1 => CashPolarity::Income,
            _ => CashPolarity::Neutral,
        }
    }

    /// Sign applied when aggregating a category's codes into its total.
    pub fn multiplier(self) -> i32 {
        match self {
            CashPolarity::Expense => -1,
            CashPolarity::Income | CashPolarity::Neutral => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryKind {
    #[default]
    CashCode,
    Total,
    Expression,
}

impl CategoryKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => CategoryKind::Total,
            2 => CategoryKind::Expression,
            _ => CategoryKind::CashCode,
        }
    }
}

/// Which spreadsheet dialect an expression template targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxType {
    #[default]
    Both,
    Libre,
    Excel,
}

impl SyntaxType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => SyntaxType::Libre,
            2 => SyntaxType::Excel,
            _ => SyntaxType::Both,
        }
    }

    /// Templates written only for the other dialect are not rendered.
    pub fn renders_here(self) -> bool {
        !matches!(self, SyntaxType::Excel)
    }
}

// -----------------------------------------------------------------------------
// Calendar
// -----------------------------------------------------------------------------

/// A financial year shown as one column block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Period {
    pub year_number: i32,
    pub description: String,
    pub status: String,
}

impl Period {
    /// Label shown over the first month of the block.
    pub fn label(&self) -> String {
        let desc = self.display_name();
        if self.status.is_empty() {
            desc
        } else {
            format!("{} ({})", desc, self.status)
        }
    }

    pub fn display_name(&self) -> String {
        if self.description.is_empty() {
            self.year_number.to_string()
        } else {
            self.description.clone()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Month {
    pub month_number: u32,
    pub name: String,
    pub start_on: Option<NaiveDate>,
}

/// The period the statement is being produced for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivePeriod {
    pub year_number: i32,
    pub month_number: u32,
    pub month_name: String,
    pub description: String,
    pub start_on: Option<NaiveDate>,
}

// -----------------------------------------------------------------------------
// Categories and codes
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub code: String,
    pub name: String,
    pub polarity: CashPolarity,
    pub kind: CategoryKind,
    pub cash_type: Option<CashType>,
    pub display_order: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashCode {
    pub code: String,
    pub description: String,
}

/// A total whose value is the sum of other categories' totals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TotalDefinition {
    pub code: String,
    pub name: String,
    pub source_codes: Vec<String>,
}

/// A named formula over other categories, e.g. `[Sales] - [Costs]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Expression {
    pub code: String,
    pub name: String,
    pub template: String,
    /// Numeric format hint such as `Cash0`, `Num2` or `Pct1`
    pub format: Option<String>,
    pub syntax: SyntaxType,
    pub display_order: i32,
}

/// Outcome of resolving one expression, reported back to the data source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpressionStatus {
    Ok,
    Error(String),
}

impl ExpressionStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, ExpressionStatus::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            ExpressionStatus::Ok => "OK",
            ExpressionStatus::Error(msg) => msg,
        }
    }
}

// -----------------------------------------------------------------------------
// Cash code values
// -----------------------------------------------------------------------------

/// Where a cash-code value comes from. Only `Invoiced` is always included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    #[default]
    Invoiced,
    ActivePeriod,
    OrderBook,
    TaxAccrual,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueSource::Invoiced => "invoiced",
            ValueSource::ActivePeriod => "activePeriod",
            ValueSource::OrderBook => "orderBook",
            ValueSource::TaxAccrual => "taxAccrual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "invoiced" => Some(ValueSource::Invoiced),
            "activePeriod" => Some(ValueSource::ActivePeriod),
            "orderBook" => Some(ValueSource::OrderBook),
            "taxAccrual" => Some(ValueSource::TaxAccrual),
            _ => None,
        }
    }
}

/// The three independent inclusion flags for cash-code values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueInclusion {
    pub active_periods: bool,
    pub order_book: bool,
    pub tax_accruals: bool,
}

impl ValueInclusion {
    pub const NONE: ValueInclusion =
        ValueInclusion { active_periods: false, order_book: false, tax_accruals: false };

    pub fn includes(&self, source: ValueSource) -> bool {
        match source {
            ValueSource::Invoiced => true,
            ValueSource::ActivePeriod => self.active_periods,
            ValueSource::OrderBook => self.order_book,
            ValueSource::TaxAccrual => self.tax_accruals,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthValue {
    pub month_number: u32,
    pub value: f64,
}

// -----------------------------------------------------------------------------
// VAT
// -----------------------------------------------------------------------------

/// VAT figures for one period (a recurrence period or a month).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VatPeriod {
    pub year_number: i32,
    pub start_on: Option<NaiveDate>,
    pub home_sales: f64,
    pub home_purchases: f64,
    pub export_sales: f64,
    pub export_purchases: f64,
    pub home_sales_vat: f64,
    pub home_purchases_vat: f64,
    pub export_sales_vat: f64,
    pub export_purchases_vat: f64,
    pub vat_adjustment: f64,
    pub vat_due: f64,
}

/// Accrued VAT for a year, added onto the matching period bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VatAccrual {
    pub year_number: i32,
    pub home_sales_vat: Option<f64>,
    pub home_purchases_vat: Option<f64>,
    pub export_sales_vat: Option<f64>,
    pub export_purchases_vat: Option<f64>,
    pub vat_due: Option<f64>,
}

// -----------------------------------------------------------------------------
// Bank and balance sheet
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankAccount {
    pub code: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankBalance {
    pub year_number: i32,
    pub month_number: u32,
    pub balance: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceSheetEntry {
    pub asset_code: String,
    pub asset_name: String,
    pub year_number: i32,
    pub month_number: u32,
    pub balance: Option<f64>,
}

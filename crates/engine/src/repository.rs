//! Data source contract and the in-memory fixture implementation.
//!
//! Renderers see the data source only through [`Repository`]. Backends
//! return empty collections for absent data; errors are reserved for
//! failures of the backend itself.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::model::{
    ActivePeriod, BalanceSheetEntry, BankAccount, BankBalance, CashCode, CashType, Category,
    CategoryKind, Expression, ExpressionStatus, Month, MonthValue, Period, ValueInclusion,
    ValueSource, VatAccrual, VatPeriod,
};

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Everything a statement build reads from its data source.
pub trait Repository {
    fn active_period(&self) -> RepoResult<Option<ActivePeriod>>;
    /// Years in column order.
    fn active_years(&self) -> RepoResult<Vec<Period>>;
    /// Months in calendar order.
    fn months(&self) -> RepoResult<Vec<Month>>;
    fn company_name(&self) -> RepoResult<String>;

    /// Cash-code-bearing categories of one classification, in display order.
    fn categories(&self, cash_type: CashType) -> RepoResult<Vec<Category>>;
    fn cash_codes(&self, category_code: &str) -> RepoResult<Vec<CashCode>>;
    /// Monthly values of one code in one year, summed over included sources.
    fn cash_code_values(
        &self,
        cash_code: &str,
        year_number: i32,
        inclusion: ValueInclusion,
    ) -> RepoResult<Vec<MonthValue>>;

    /// Categories of kind `Total`, in display order.
    fn category_totals(&self) -> RepoResult<Vec<Category>>;
    /// Codes summed by a total, in order.
    fn category_total_codes(&self, category_code: &str) -> RepoResult<Vec<String>>;
    fn category_expressions(&self) -> RepoResult<Vec<Expression>>;
    fn category_code_from_name(&self, name: &str) -> RepoResult<Option<String>>;

    /// Record how an expression resolved. Backends without a log ignore it.
    fn report_expression_status(
        &self,
        _category_code: &str,
        _status: &ExpressionStatus,
    ) -> RepoResult<()> {
        Ok(())
    }

    fn vat_recurrence_type(&self) -> RepoResult<String>;
    fn vat_recurrence(&self) -> RepoResult<Vec<VatPeriod>>;
    fn vat_recurrence_accruals(&self) -> RepoResult<Vec<VatAccrual>>;
    fn vat_period_totals(&self) -> RepoResult<Vec<VatPeriod>>;
    fn vat_period_accruals(&self) -> RepoResult<Vec<VatAccrual>>;

    fn bank_accounts(&self) -> RepoResult<Vec<BankAccount>>;
    fn bank_balances(&self, account_code: &str) -> RepoResult<Vec<BankBalance>>;
    /// Entries in entry order.
    fn balance_sheet(&self) -> RepoResult<Vec<BalanceSheetEntry>>;
}

// -----------------------------------------------------------------------------
// Fixture repository
// -----------------------------------------------------------------------------

/// One stored cash-code amount.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashCodeValueRecord {
    pub cash_code: String,
    pub year_number: i32,
    pub month_number: u32,
    pub value: f64,
    pub source: ValueSource,
}

/// Complete data set for one statement, as stored in a JSON fixture.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDataset {
    pub active_period: Option<ActivePeriod>,
    pub years: Vec<Period>,
    pub months: Vec<Month>,
    pub company_name: String,
    pub categories: Vec<Category>,
    /// Category code → cash codes
    pub cash_codes: HashMap<String, Vec<CashCode>>,
    pub cash_code_values: Vec<CashCodeValueRecord>,
    /// Total code → source category codes
    pub total_codes: HashMap<String, Vec<String>>,
    pub expressions: Vec<Expression>,
    pub vat_recurrence_type: String,
    pub vat_recurrence: Vec<VatPeriod>,
    pub vat_recurrence_accruals: Vec<VatAccrual>,
    pub vat_period_totals: Vec<VatPeriod>,
    pub vat_period_accruals: Vec<VatAccrual>,
    pub bank_accounts: Vec<BankAccount>,
    /// Account code → balances
    pub bank_balances: HashMap<String, Vec<BankBalance>>,
    pub balance_sheet: Vec<BalanceSheetEntry>,
}

/// Repository over an in-memory [`ReportDataset`].
#[derive(Debug, Default)]
pub struct FixtureRepository {
    data: ReportDataset,
    statuses: RefCell<Vec<(String, ExpressionStatus)>>,
}

impl FixtureRepository {
    pub fn new(data: ReportDataset) -> Self {
        Self { data, statuses: RefCell::new(Vec::new()) }
    }

    /// Parse a JSON fixture. A leading UTF-8 BOM is ignored.
    pub fn from_json(json: &str) -> RepoResult<Self> {
        let json = json.strip_prefix('\u{feff}').unwrap_or(json);
        let data: ReportDataset = serde_json::from_str(json)?;
        Ok(Self::new(data))
    }

    pub fn dataset(&self) -> &ReportDataset {
        &self.data
    }

    /// Expression statuses reported so far, in order.
    pub fn reported_statuses(&self) -> Vec<(String, ExpressionStatus)> {
        self.statuses.borrow().clone()
    }

    fn sorted_categories<F>(&self, keep: F) -> Vec<Category>
    where
        F: Fn(&Category) -> bool,
    {
        let mut out: Vec<Category> = self.data.categories.iter().filter(|c| keep(c)).cloned().collect();
        out.sort_by(|a, b| a.display_order.cmp(&b.display_order).then_with(|| a.name.cmp(&b.name)));
        out
    }
}

impl Repository for FixtureRepository {
    fn active_period(&self) -> RepoResult<Option<ActivePeriod>> {
        Ok(self.data.active_period.clone())
    }

    fn active_years(&self) -> RepoResult<Vec<Period>> {
        let mut years = self.data.years.clone();
        years.sort_by_key(|y| y.year_number);
        Ok(years)
    }

    fn months(&self) -> RepoResult<Vec<Month>> {
        Ok(self.data.months.clone())
    }

    fn company_name(&self) -> RepoResult<String> {
        Ok(self.data.company_name.clone())
    }

    fn categories(&self, cash_type: CashType) -> RepoResult<Vec<Category>> {
        Ok(self.sorted_categories(|c| {
            c.kind == CategoryKind::CashCode && c.cash_type == Some(cash_type)
        }))
    }

    fn cash_codes(&self, category_code: &str) -> RepoResult<Vec<CashCode>> {
        let mut codes = self.data.cash_codes.get(category_code).cloned().unwrap_or_default();
        codes.sort_by(|a, b| a.description.cmp(&b.description));
        Ok(codes)
    }

    fn cash_code_values(
        &self,
        cash_code: &str,
        year_number: i32,
        inclusion: ValueInclusion,
    ) -> RepoResult<Vec<MonthValue>> {
        let mut by_month: Vec<MonthValue> = Vec::new();
        for rec in &self.data.cash_code_values {
            if rec.cash_code != cash_code
                || rec.year_number != year_number
                || !inclusion.includes(rec.source)
            {
                continue;
            }
            match by_month.iter_mut().find(|m| m.month_number == rec.month_number) {
                Some(existing) => existing.value += rec.value,
                None => by_month.push(MonthValue { month_number: rec.month_number, value: rec.value }),
            }
        }
        by_month.sort_by_key(|m| m.month_number);
        Ok(by_month)
    }

    fn category_totals(&self) -> RepoResult<Vec<Category>> {
        Ok(self.sorted_categories(|c| c.kind == CategoryKind::Total))
    }

    fn category_total_codes(&self, category_code: &str) -> RepoResult<Vec<String>> {
        Ok(self.data.total_codes.get(category_code).cloned().unwrap_or_default())
    }

    fn category_expressions(&self) -> RepoResult<Vec<Expression>> {
        let mut exprs = self.data.expressions.clone();
        exprs.sort_by(|a, b| a.display_order.cmp(&b.display_order).then_with(|| a.name.cmp(&b.name)));
        Ok(exprs)
    }

    fn category_code_from_name(&self, name: &str) -> RepoResult<Option<String>> {
        Ok(self.data.categories.iter().find(|c| c.name == name).map(|c| c.code.clone()))
    }

    fn report_expression_status(&self, category_code: &str, status: &ExpressionStatus) -> RepoResult<()> {
        self.statuses.borrow_mut().push((category_code.to_string(), status.clone()));
        Ok(())
    }

    fn vat_recurrence_type(&self) -> RepoResult<String> {
        Ok(self.data.vat_recurrence_type.to_uppercase())
    }

    fn vat_recurrence(&self) -> RepoResult<Vec<VatPeriod>> {
        Ok(self.data.vat_recurrence.clone())
    }

    fn vat_recurrence_accruals(&self) -> RepoResult<Vec<VatAccrual>> {
        Ok(self.data.vat_recurrence_accruals.clone())
    }

    fn vat_period_totals(&self) -> RepoResult<Vec<VatPeriod>> {
        Ok(self.data.vat_period_totals.clone())
    }

    fn vat_period_accruals(&self) -> RepoResult<Vec<VatAccrual>> {
        Ok(self.data.vat_period_accruals.clone())
    }

    fn bank_accounts(&self) -> RepoResult<Vec<BankAccount>> {
        Ok(self.data.bank_accounts.clone())
    }

    fn bank_balances(&self, account_code: &str) -> RepoResult<Vec<BankBalance>> {
        Ok(self.data.bank_balances.get(account_code).cloned().unwrap_or_default())
    }

    fn balance_sheet(&self) -> RepoResult<Vec<BalanceSheetEntry>> {
        Ok(self.data.balance_sheet.clone())
    }
}

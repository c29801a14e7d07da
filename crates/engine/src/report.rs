//! Statement build: section order and per-build options.

use chrono::{DateTime, Utc};

use cashflow_core::{Diagnostics, Translate};

use crate::error::Result;
use crate::model::{CashType, ValueInclusion};
use crate::render::balance_sheet::render_balance_sheet;
use crate::render::bank::render_bank_balances;
use crate::render::categories::render_categories;
use crate::render::expressions::render_expressions;
use crate::render::header::render_header;
use crate::render::summary::render_summary;
use crate::render::totals::render_totals;
use crate::render::vat::{render_vat_period_totals, render_vat_recurrence};
use crate::render::{Layout, RenderContext};
use crate::repository::Repository;
use crate::sheet::{Sheet, SheetBuilder};

/// Name of the statement's single table.
pub const SHEET_NAME: &str = "Cash Flow";

/// Inclusion flags for one build.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportOptions {
    pub include_active_periods: bool,
    pub include_order_book: bool,
    pub include_tax_accruals: bool,
    pub include_vat_details: bool,
    pub include_bank_balances: bool,
    pub include_balance_sheet: bool,
    /// Report timestamp; also the cut-off for VAT periods not yet started
    pub as_of: DateTime<Utc>,
}

impl ReportOptions {
    /// All optional sections off.
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            include_active_periods: false,
            include_order_book: false,
            include_tax_accruals: false,
            include_vat_details: false,
            include_bank_balances: false,
            include_balance_sheet: false,
            as_of,
        }
    }

    fn trade_inclusion(&self) -> ValueInclusion {
        ValueInclusion {
            active_periods: self.include_active_periods,
            order_book: self.include_order_book,
            tax_accruals: false,
        }
    }

    fn tax_inclusion(&self) -> ValueInclusion {
        ValueInclusion {
            active_periods: self.include_active_periods,
            order_book: false,
            tax_accruals: self.include_tax_accruals,
        }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// The laid-out grid plus everything that needed a fallback.
#[derive(Debug)]
pub struct BuiltReport {
    pub sheet: Sheet,
    pub diagnostics: Diagnostics,
}

/// Build the complete statement grid.
///
/// Sections, top to bottom: header, trade, money, totals of totals, tax,
/// expressions, then the optional bank, VAT and balance sheet blocks.
pub fn build_cash_statement(
    repo: &dyn Repository,
    tr: &dyn Translate,
    options: &ReportOptions,
) -> Result<BuiltReport> {
    let layout = Layout::new(repo.active_years()?, repo.months()?);
    log::info!(
        "building statement: {} year(s) x {} month(s)",
        layout.years.len(),
        layout.months.len()
    );

    let mut ctx = RenderContext::new(repo, tr, options.clone(), layout, SheetBuilder::new(SHEET_NAME));

    render_header(&mut ctx)?;

    let trade = render_categories(&mut ctx, CashType::Trade, options.trade_inclusion())?;
    render_summary(&mut ctx, &trade);

    let money = render_categories(&mut ctx, CashType::Money, ValueInclusion::NONE)?;
    render_summary(&mut ctx, &money);

    render_totals(&mut ctx)?;

    let tax = render_categories(&mut ctx, CashType::Tax, options.tax_inclusion())?;
    render_summary(&mut ctx, &tax);

    render_expressions(&mut ctx)?;

    if options.include_bank_balances {
        render_bank_balances(&mut ctx)?;
        ctx.sheet.append_blank();
    }

    if options.include_vat_details {
        render_vat_recurrence(&mut ctx)?;
        render_vat_period_totals(&mut ctx)?;
    }

    if options.include_balance_sheet {
        render_balance_sheet(&mut ctx)?;
    }

    let RenderContext { sheet, diagnostics, registry, .. } = ctx;
    log::info!(
        "statement built: {} row(s), {} registered total(s), {} diagnostic(s)",
        sheet.current_row_index(),
        registry.len(),
        diagnostics.len()
    );
    Ok(BuiltReport { sheet: sheet.finish(), diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CashCode, CashPolarity, Category, CategoryKind, Expression, Month, Period};
    use crate::repository::{CashCodeValueRecord, FixtureRepository, ReportDataset};
    use crate::sheet::CellContent;
    use cashflow_core::translate::KeysOnly;
    use cashflow_core::CellRef;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 30, 0).unwrap()
    }

    fn record(code: &str, year: i32, month: u32, value: f64) -> CashCodeValueRecord {
        CashCodeValueRecord {
            cash_code: code.into(),
            year_number: year,
            month_number: month,
            value,
            ..Default::default()
        }
    }

    /// Three years; two carry the trade category's values.
    fn dataset() -> ReportDataset {
        let mut values = Vec::new();
        for year in [2025, 2026] {
            values.push(record("C1", year, 1, 100.0));
            values.push(record("C1", year, 2, 200.0));
            values.push(record("C2", year, 1, 50.0));
            values.push(record("C2", year, 2, 50.0));
        }
        let mut data = ReportDataset {
            company_name: "Acme Ltd".into(),
            years: [2024, 2025, 2026]
                .into_iter()
                .map(|y| Period { year_number: y, description: y.to_string(), status: String::new() })
                .collect(),
            months: vec![
                Month { month_number: 1, name: "Jan".into(), start_on: None },
                Month { month_number: 2, name: "Feb".into(), start_on: None },
            ],
            categories: vec![
                Category {
                    code: "TC1".into(),
                    name: "Costs".into(),
                    polarity: CashPolarity::Expense,
                    kind: CategoryKind::CashCode,
                    cash_type: Some(CashType::Trade),
                    display_order: 1,
                },
                Category {
                    code: "NET".into(),
                    name: "Net".into(),
                    polarity: CashPolarity::Neutral,
                    kind: CategoryKind::Total,
                    cash_type: None,
                    display_order: 1,
                },
            ],
            cash_code_values: values,
            expressions: vec![Expression {
                code: "PCT".into(),
                name: "Share".into(),
                template: "[Costs]/[Net]".into(),
                format: Some("PCT1".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        data.cash_codes.insert(
            "TC1".into(),
            vec![
                CashCode { code: "C1".into(), description: "a".into() },
                CashCode { code: "C2".into(), description: "b".into() },
            ],
        );
        data.total_codes.insert("NET".into(), vec!["TC1".into()]);
        data
    }

    fn number_at(sheet: &Sheet, col: u32, row: u32) -> f64 {
        match sheet.cell(CellRef::new(col, row)).map(|c| &c.content) {
            Some(CellContent::Number(v)) => *v,
            _ => 0.0,
        }
    }

    #[test]
    fn test_expense_total_over_two_years() {
        let repo = FixtureRepository::new(dataset());
        let report = build_cash_statement(&repo, &KeysOnly, &ReportOptions::new(as_of())).unwrap();
        let sheet = &report.sheet;

        // header 1-4, blank 5, heading 6, codes 7-8, total 9
        assert_eq!(sheet.cell(CellRef::new(1, 9)).and_then(|c| c.as_text()), Some("TextTotals"));
        assert_eq!(sheet.cell(CellRef::new(3, 9)).and_then(|c| c.as_text()), Some("TC1"));

        // 2024 block is D:F, 2025 is G:I, 2026 is J:L
        assert_eq!(sheet.cell(CellRef::new(9, 9)).and_then(|c| c.as_formula()), Some("SUM([.I7:.I8])*-1"));
        assert_eq!(sheet.cell(CellRef::new(9, 7)).and_then(|c| c.as_formula()), Some("SUM([.G7:.H7])"));

        assert_eq!(sheet.cell(CellRef::new(7, 9)).and_then(|c| c.as_formula()), Some("SUM([.G7:.G8])*-1"));
        assert_eq!(sheet.cell(CellRef::new(12, 9)).and_then(|c| c.as_formula()), Some("SUM([.L7:.L8])*-1"));
        assert_eq!(sheet.cell(CellRef::new(12, 9)).and_then(|c| c.style.as_deref()), Some("CASH0_CELL"));

        // the ranges the totals negate hold 400 in each funded year
        for first in [7, 10] {
            let spent: f64 = (7..=8).map(|row| number_at(sheet, first, row) + number_at(sheet, first + 1, row)).sum();
            assert_eq!(spent, 400.0);
        }
        let quiet: f64 = (7..=8).map(|row| number_at(sheet, 4, row) + number_at(sheet, 5, row)).sum();
        assert_eq!(quiet, 0.0);

        // NET sums the expense total, so the row was registered
        assert_eq!(sheet.cell(CellRef::new(9, 14)).and_then(|c| c.as_formula()), Some("I9"));
        assert_eq!(sheet.cell(CellRef::new(12, 14)).and_then(|c| c.as_formula()), Some("L9"));
    }

    #[test]
    fn test_totals_and_expressions_reference_registered_rows() {
        let repo = FixtureRepository::new(dataset());
        let report = build_cash_statement(&repo, &KeysOnly, &ReportOptions::new(as_of())).unwrap();
        let sheet = &report.sheet;

        // spacer 10, money blank 11, totals blank 12, heading 13, NET 14
        assert_eq!(sheet.cell(CellRef::new(1, 14)).and_then(|c| c.as_text()), Some("NET"));
        assert_eq!(sheet.cell(CellRef::new(4, 14)).and_then(|c| c.as_formula()), Some("D9"));

        // tax blank 15, analysis heading 16, expression 17
        let share = sheet.cell(CellRef::new(4, 17)).unwrap();
        assert_eq!(share.as_formula(), Some("D9/D14"));
        assert_eq!(share.style.as_deref(), Some("PCT1_CELL"));
        assert_eq!(sheet.rows.len(), 17);
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
        assert_eq!(repo.reported_statuses().len(), 1);
    }

    #[test]
    fn test_optional_sections_follow_flags() {
        let repo = FixtureRepository::new(dataset());
        let mut options = ReportOptions::new(as_of());
        options.include_bank_balances = true;
        options.include_vat_details = true;
        options.include_balance_sheet = true;

        let report = build_cash_statement(&repo, &KeysOnly, &options).unwrap();
        let labels: Vec<&str> = report
            .sheet
            .rows
            .iter()
            .filter_map(|r| r.get(1).and_then(|c| c.as_text()))
            .collect();

        let bank = labels.iter().position(|l| *l == "TEXTCLOSINGBALANCES").unwrap();
        let vat = labels.iter().position(|l| l.starts_with("TEXTVATDUETITLE")).unwrap();
        let balance = labels.iter().position(|l| *l == "TEXTBALANCESHEET").unwrap();
        assert!(bank < vat && vat < balance);
        assert!(labels.contains(&"(no bank accounts)"));
    }

    #[test]
    fn test_empty_dataset_still_builds() {
        let repo = FixtureRepository::new(ReportDataset::default());
        let report = build_cash_statement(&repo, &KeysOnly, &ReportOptions::new(as_of())).unwrap();
        assert_eq!(report.sheet.name, SHEET_NAME);
        assert_eq!(report.sheet.frozen_rows, 4);
        assert!(report.sheet.rows.len() > 4);
    }
}

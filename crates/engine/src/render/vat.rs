//! VAT blocks: figures per recurrence period and per month, bucketed into
//! the month column where each period starts, with optional accruals.

use std::collections::BTreeMap;

use chrono::Datelike;

use cashflow_core::refs::row_range;

use super::RenderContext;
use crate::error::Result;
use crate::model::{VatAccrual, VatPeriod};
use crate::sheet::{Cell, Row};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VatLine {
    HomeSales,
    HomePurchases,
    ExportSales,
    ExportPurchases,
    HomeSalesVat,
    HomePurchasesVat,
    ExportSalesVat,
    ExportPurchasesVat,
    Adjustment,
    Due,
}

impl VatLine {
    fn label_key(self) -> &'static str {
        match self {
            VatLine::HomeSales => "TextVatHomeSales",
            VatLine::HomePurchases => "TextVatHomePurchases",
            VatLine::ExportSales => "TextVatExportSales",
            VatLine::ExportPurchases => "TextVatExportPurchases",
            VatLine::HomeSalesVat => "TextVatHomeSalesVat",
            VatLine::HomePurchasesVat => "TextVatHomePurchasesVat",
            VatLine::ExportSalesVat => "TextVatExportSalesVat",
            VatLine::ExportPurchasesVat => "TextVatExportPurchasesVat",
            VatLine::Adjustment => "TextVatAdjustment",
            VatLine::Due => "TextVatDue",
        }
    }

    fn value(self, p: &VatPeriod) -> f64 {
        match self {
            VatLine::HomeSales => p.home_sales,
            VatLine::HomePurchases => p.home_purchases,
            VatLine::ExportSales => p.export_sales,
            VatLine::ExportPurchases => p.export_purchases,
            VatLine::HomeSalesVat => p.home_sales_vat,
            VatLine::HomePurchasesVat => p.home_purchases_vat,
            VatLine::ExportSalesVat => p.export_sales_vat,
            VatLine::ExportPurchasesVat => p.export_purchases_vat,
            VatLine::Adjustment => p.vat_adjustment,
            VatLine::Due => p.vat_due,
        }
    }

    /// Accrued amount for this line; `None` for lines that never accrue.
    fn accrual(self, a: &VatAccrual) -> Option<f64> {
        match self {
            VatLine::HomeSalesVat => a.home_sales_vat,
            VatLine::HomePurchasesVat => a.home_purchases_vat,
            VatLine::ExportSalesVat => a.export_sales_vat,
            VatLine::ExportPurchasesVat => a.export_purchases_vat,
            VatLine::Due => a.vat_due,
            _ => None,
        }
    }
}

const RECURRENCE_LINES: [VatLine; 10] = [
    VatLine::HomeSales,
    VatLine::HomePurchases,
    VatLine::ExportSales,
    VatLine::ExportPurchases,
    VatLine::HomeSalesVat,
    VatLine::HomePurchasesVat,
    VatLine::ExportSalesVat,
    VatLine::ExportPurchasesVat,
    VatLine::Adjustment,
    VatLine::Due,
];

const PERIOD_LINES: [VatLine; 9] = [
    VatLine::HomeSales,
    VatLine::HomePurchases,
    VatLine::ExportSales,
    VatLine::ExportPurchases,
    VatLine::HomeSalesVat,
    VatLine::HomePurchasesVat,
    VatLine::ExportSalesVat,
    VatLine::ExportPurchasesVat,
    VatLine::Due,
];

/// Which bucket the n-th accrual of a year lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AccrualTarget {
    /// Month column of the year's n-th period
    NthPeriod,
    /// The n-th month column
    NthMonth,
}

pub fn render_vat_recurrence(ctx: &mut RenderContext<'_>) -> Result<()> {
    let title = format!("{} {}", ctx.t("TextVatDueTitle"), ctx.repo.vat_recurrence_type()?);
    let periods = ctx.repo.vat_recurrence()?;
    let accruals =
        if ctx.options.include_tax_accruals { ctx.repo.vat_recurrence_accruals()? } else { Vec::new() };
    render_block(ctx, &title, &RECURRENCE_LINES, &periods, &accruals, AccrualTarget::NthPeriod);
    Ok(())
}

pub fn render_vat_period_totals(ctx: &mut RenderContext<'_>) -> Result<()> {
    let title = format!("{} {}", ctx.t("TextVatDueTitle"), ctx.t("TextTotals"));
    let periods = ctx.repo.vat_period_totals()?;
    let accruals =
        if ctx.options.include_tax_accruals { ctx.repo.vat_period_accruals()? } else { Vec::new() };
    render_block(ctx, &title, &PERIOD_LINES, &periods, &accruals, AccrualTarget::NthMonth);
    Ok(())
}

fn render_block(
    ctx: &mut RenderContext<'_>,
    title: &str,
    lines: &[VatLine],
    periods: &[VatPeriod],
    accruals: &[VatAccrual],
    target: AccrualTarget,
) {
    ctx.sheet.append_row(Row::labelled(title.to_uppercase(), ""));

    let as_of = ctx.options.as_of.date_naive();
    let include_future = ctx.options.include_active_periods;

    let mut periods_by_year: BTreeMap<i32, Vec<&VatPeriod>> = BTreeMap::new();
    for period in periods {
        periods_by_year.entry(period.year_number).or_default().push(period);
    }
    let mut accruals_by_year: BTreeMap<i32, Vec<&VatAccrual>> = BTreeMap::new();
    for accrual in accruals {
        accruals_by_year.entry(accrual.year_number).or_default().push(accrual);
    }

    let month_count = ctx.layout.months.len();
    for &line in lines {
        let row_index = ctx.sheet.next_row_index();
        let mut row = Row::labelled(ctx.t(line.label_key()).to_uppercase(), "");

        for (year_idx, year) in ctx.layout.years.iter().enumerate() {
            let mut buckets = vec![0.0; month_count];
            let year_periods = periods_by_year.get(&year.year_number).map(Vec::as_slice).unwrap_or_default();
            let bucket_of = |p: &VatPeriod| p.start_on.and_then(|d| ctx.layout.month_position(d.month()));

            for period in year_periods {
                let started = period.start_on.map(|d| d <= as_of).unwrap_or(false);
                if !(include_future || started) {
                    continue;
                }
                if let Some(bucket) = bucket_of(*period) {
                    buckets[bucket] += line.value(period);
                }
            }

            let year_accruals = accruals_by_year.get(&year.year_number).map(Vec::as_slice).unwrap_or_default();
            for (n, accrual) in year_accruals.iter().enumerate() {
                let Some(amount) = line.accrual(accrual) else {
                    continue;
                };
                let bucket = match target {
                    AccrualTarget::NthPeriod => year_periods.get(n).and_then(|p| bucket_of(*p)),
                    AccrualTarget::NthMonth => Some(n).filter(|&n| n < month_count),
                };
                if let Some(bucket) = bucket {
                    buckets[bucket] += amount;
                }
            }

            for value in buckets {
                row.push(Cell::number(value));
            }
            let (first, totals) = ctx.layout.year_block(year_idx);
            if month_count == 0 {
                row.push(Cell::number(0.0));
            } else {
                row.push(Cell::formula(format!("SUM({})", row_range(row_index, first, totals - 1))));
            }
        }

        ctx.sheet.append_row(row);
    }

    ctx.sheet.append_blank();
    log::debug!("VAT block '{title}' rendered from {} period(s)", periods.len());
}

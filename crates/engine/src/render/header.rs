//! The four frozen header rows: title, company, year labels, column names.

use cashflow_core::refs::MARKER_COLUMN;

use super::RenderContext;
use crate::error::Result;
use crate::sheet::{Cell, Row};

/// Rows kept frozen at the top of the sheet.
pub const HEADER_ROWS: u32 = 4;

pub fn render_header(ctx: &mut RenderContext<'_>) -> Result<()> {
    let active = ctx.repo.active_period()?.unwrap_or_default();
    let company = ctx.repo.company_name()?;

    let title = ctx
        .t("TextStatementTitle")
        .replace("{0}", &active.month_name)
        .replace("{1}", &active.description);
    ctx.sheet.append_row(Row::labelled(title, ""));
    ctx.sheet.append_row(Row::labelled(company, ""));

    let stamp = ctx.options.as_of.format("%d %b %H:%M:%S").to_string();
    let mut years_row = Row::labelled(ctx.t("TextDate"), stamp);
    let month_count = ctx.layout.months.len();
    for year in &ctx.layout.years {
        if month_count > 0 {
            years_row.push(Cell::text(year.label()));
            for _ in 1..month_count {
                years_row.push(Cell::empty());
            }
        }
        years_row.push(Cell::text(year.display_name()));
    }
    ctx.sheet.append_row(years_row);

    let mut columns_row = Row::labelled(ctx.t("TextCode"), ctx.t("TextName"));
    let totals_label = ctx.t("TextTotals");
    for _ in &ctx.layout.years {
        for month in &ctx.layout.months {
            columns_row.push(Cell::text(month.name.clone()));
        }
        columns_row.push(Cell::text(totals_label.clone()));
    }
    ctx.sheet.append_row(columns_row);

    ctx.sheet.freeze_rows(HEADER_ROWS);
    ctx.sheet.hide_column(MARKER_COLUMN);
    log::debug!("header rendered for {} year(s)", ctx.layout.years.len());
    Ok(())
}

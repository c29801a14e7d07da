//! Category blocks: a heading, one row per cash code, and a polarity-signed
//! total row registered for later cross-references.

use std::collections::HashMap;

use cashflow_core::refs::{column_range, row_range};

use super::RenderContext;
use crate::error::Result;
use crate::model::{CashType, Category, ValueInclusion};
use crate::sheet::{Cell, Row};

/// Render every category of `cash_type` and return them in render order.
pub fn render_categories(
    ctx: &mut RenderContext<'_>,
    cash_type: CashType,
    inclusion: ValueInclusion,
) -> Result<Vec<Category>> {
    ctx.sheet.append_blank();
    let categories = ctx.repo.categories(cash_type)?;

    for category in &categories {
        render_category(ctx, category, inclusion)?;
    }

    log::debug!("{} {} categories rendered", categories.len(), cash_type);
    Ok(categories)
}

fn render_category(ctx: &mut RenderContext<'_>, category: &Category, inclusion: ValueInclusion) -> Result<()> {
    ctx.sheet.append_row(Row::labelled(category.name.clone(), ""));

    let codes = ctx.repo.cash_codes(&category.code)?;
    let month_count = ctx.layout.month_count();

    for code in &codes {
        let row_index = ctx.sheet.next_row_index();
        let mut row = Row::labelled(code.code.clone(), code.description.clone());

        for (year_idx, year) in ctx.layout.years.iter().enumerate() {
            let values: HashMap<u32, f64> = ctx
                .repo
                .cash_code_values(&code.code, year.year_number, inclusion)?
                .into_iter()
                .map(|v| (v.month_number, v.value))
                .collect();

            for month in &ctx.layout.months {
                row.push(Cell::number(values.get(&month.month_number).copied().unwrap_or(0.0)));
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

    let total_row = ctx.sheet.next_row_index();
    let first_code_row = total_row - codes.len() as u32;
    let last_code_row = total_row - 1;
    let negate = category.polarity.multiplier() < 0;

    let mut row = Row::marked(ctx.t("TextTotals"), "", category.code.trim());
    for col in ctx.layout.data_columns() {
        if codes.is_empty() {
            row.push(Cell::number(0.0));
            continue;
        }
        let sum = format!("SUM({})", column_range(col, first_code_row, last_code_row));
        row.push(Cell::formula(if negate { format!("{sum}*-1") } else { sum }));
    }

    let registered = ctx.sheet.append_row(row);
    ctx.sheet.append_blank();
    ctx.register(category.code.trim(), registered);
    Ok(())
}

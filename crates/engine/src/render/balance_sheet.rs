//! Balance sheet: one row per asset, year totals carry the last known
//! balance, and a capital row sums the assets.

use std::collections::HashMap;

use cashflow_core::column_letters;
use cashflow_core::refs::column_range;

use super::RenderContext;
use crate::error::Result;
use crate::sheet::{Cell, Row};

struct AssetGroup {
    code: String,
    name: String,
    balances: HashMap<(i32, u32), f64>,
}

pub fn render_balance_sheet(ctx: &mut RenderContext<'_>) -> Result<()> {
    let heading = Row::labelled(ctx.t("TextBalanceSheet").to_uppercase(), "");
    ctx.sheet.append_row(heading);

    let entries = ctx.repo.balance_sheet()?;
    if entries.is_empty() {
        return Ok(());
    }

    let mut groups: Vec<AssetGroup> = Vec::new();
    for entry in entries {
        let idx = match groups.iter().position(|g| g.code == entry.asset_code && g.name == entry.asset_name) {
            Some(idx) => idx,
            None => {
                groups.push(AssetGroup {
                    code: entry.asset_code.clone(),
                    name: entry.asset_name.clone(),
                    balances: HashMap::new(),
                });
                groups.len() - 1
            }
        };
        groups[idx]
            .balances
            .insert((entry.year_number, entry.month_number), entry.balance.unwrap_or(0.0));
    }

    let first_asset_row = ctx.sheet.next_row_index();
    for group in &groups {
        let row = asset_row(ctx, group);
        ctx.sheet.append_row(row);
    }
    let last_asset_row = ctx.sheet.current_row_index();

    let mut capital = Row::labelled(ctx.t("TextCapital").to_uppercase(), "");
    for col in ctx.layout.data_columns() {
        capital.push(Cell::formula(format!("SUM({})", column_range(col, first_asset_row, last_asset_row))));
    }
    ctx.sheet.append_row(capital);

    log::debug!("{} balance sheet asset(s) rendered", groups.len());
    Ok(())
}

fn asset_row(ctx: &RenderContext<'_>, group: &AssetGroup) -> Row {
    let row_index = ctx.sheet.next_row_index();
    let mut row = Row::labelled(group.code.clone(), group.name.clone());

    for (year_idx, year) in ctx.layout.years.iter().enumerate() {
        let (first, _) = ctx.layout.year_block(year_idx);
        let mut last_non_empty = None;

        for (m_idx, month) in ctx.layout.months.iter().enumerate() {
            let balance = group.balances.get(&(year.year_number, month.month_number)).copied();
            row.push(Cell::number(balance.unwrap_or(0.0)));
            if balance.is_some() {
                last_non_empty = Some(first + m_idx as u32);
            }
        }

        row.push(match last_non_empty {
            Some(col) => Cell::formula(format!("{}{}", column_letters(col), row_index)),
            None => Cell::number(0.0),
        });
    }
    row
}

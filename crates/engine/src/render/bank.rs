//! Closing bank balances per account with a company total.

use std::collections::HashMap;

use cashflow_core::column_letters;
use cashflow_core::refs::column_range;

use super::RenderContext;
use crate::error::Result;
use crate::model::BankBalance;
use crate::sheet::{Cell, Row};

const DECEMBER: u32 = 12;

pub fn render_bank_balances(ctx: &mut RenderContext<'_>) -> Result<()> {
    ctx.sheet.append_blank();
    let heading = Row::labelled(ctx.t("TextClosingBalances").to_uppercase(), "");
    ctx.sheet.append_row(heading);

    let accounts = ctx.repo.bank_accounts()?;
    if accounts.is_empty() {
        ctx.sheet.append_row(Row::labelled("(no bank accounts)", ""));
        return Ok(());
    }

    let first_account_row = ctx.sheet.next_row_index();
    for account in &accounts {
        let balances = ctx.repo.bank_balances(&account.code)?;
        let row = account_row(ctx, &account.code, &account.name, &balances);
        ctx.sheet.append_row(row);
    }
    let last_account_row = ctx.sheet.current_row_index();

    let mut total = Row::labelled(ctx.t("TextCompanyBalance").to_uppercase(), "");
    for col in ctx.layout.data_columns() {
        total.push(Cell::formula(format!("SUM({})", column_range(col, first_account_row, last_account_row))));
    }
    ctx.sheet.append_row(total);

    log::debug!("{} bank account(s) rendered", accounts.len());
    Ok(())
}

/// Monthly balances; the year total carries December's balance, else the
/// last month that has one, else 0.
fn account_row(ctx: &RenderContext<'_>, code: &str, name: &str, balances: &[BankBalance]) -> Row {
    let row_index = ctx.sheet.next_row_index();
    let by_month: HashMap<(i32, u32), f64> =
        balances.iter().map(|b| ((b.year_number, b.month_number), b.balance)).collect();

    let mut row = Row::labelled(code, name);
    for (year_idx, year) in ctx.layout.years.iter().enumerate() {
        let (first, _) = ctx.layout.year_block(year_idx);
        let mut last_with_balance = None;
        let mut december = None;

        for (m_idx, month) in ctx.layout.months.iter().enumerate() {
            let col = first + m_idx as u32;
            match by_month.get(&(year.year_number, month.month_number)) {
                Some(&value) => {
                    row.push(Cell::number(value));
                    last_with_balance = Some(col);
                    if month.month_number == DECEMBER {
                        december = Some(col);
                    }
                }
                None => {
                    row.push(Cell::number(0.0));
                }
            }
        }

        match december.or(last_with_balance) {
            Some(col) => row.push(Cell::formula(format!("{}{}", column_letters(col), row_index))),
            None => row.push(Cell::number(0.0)),
        };
    }
    row
}

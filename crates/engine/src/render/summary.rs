use cashflow_core::column_letters;
use cashflow_core::refs::column_range;
use cashflow_core::DiagnosticKind;

use super::RenderContext;
use crate::model::Category;
use crate::sheet::{Cell, Row};

/// One row per category pointing at its total, then a period total.
///
/// Skipped for fewer than two categories, where the category total already
/// is the summary.
pub fn render_summary(ctx: &mut RenderContext<'_>, categories: &[Category]) {
    if categories.len() < 2 {
        return;
    }

    let heading = Row::labelled(ctx.t("TextSummary"), "");
    ctx.sheet.append_row(heading);
    let first_row = ctx.sheet.next_row_index();

    for category in categories {
        let code = category.code.trim();
        let target = ctx.registry.row_of(code);
        if target.is_none() {
            ctx.diagnostics.push(
                DiagnosticKind::MissingReference,
                code,
                format!("summary of '{}' has no total row; using 0", category.name),
            );
        }

        let mut row = Row::labelled(code, category.name.clone());
        for col in ctx.layout.data_columns() {
            row.push(match target {
                Some(total_row) => Cell::formula(format!("{}{}", column_letters(col), total_row)),
                None => Cell::number(0.0),
            });
        }
        ctx.sheet.append_row(row);
    }

    let last_row = ctx.sheet.current_row_index();
    let mut row = Row::labelled(ctx.t("TextPeriodTotal"), "");
    for col in ctx.layout.data_columns() {
        row.push(Cell::formula(format!("SUM({})", column_range(col, first_row, last_row))));
    }
    ctx.sheet.append_row(row);
}

//! Totals of totals: rows that add up other categories' total rows.

use cashflow_core::{column_letters, DiagnosticKind};

use super::RenderContext;
use crate::error::Result;
use crate::model::TotalDefinition;
use crate::sheet::{Cell, Row};

pub fn render_totals(ctx: &mut RenderContext<'_>) -> Result<()> {
    ctx.sheet.append_blank();
    let heading = Row::labelled(ctx.t("TextTotals"), "");
    ctx.sheet.append_row(heading);

    let mut definitions = Vec::new();
    for total in ctx.repo.category_totals()? {
        let code = total.code.trim().to_string();
        let name = total.name.trim().to_string();
        if code.is_empty() {
            continue;
        }
        if !name.is_empty() {
            ctx.totals_by_name.insert(name.clone(), code.clone());
        }
        let source_codes = ctx.repo.category_total_codes(&code)?;
        definitions.push(TotalDefinition { code, name, source_codes });
    }

    for total in &definitions {
        render_total(ctx, total);
    }

    log::debug!("{} total rows rendered", definitions.len());
    Ok(())
}

fn render_total(ctx: &mut RenderContext<'_>, total: &TotalDefinition) {
    let mut rows = Vec::new();
    let mut missing = Vec::new();
    for source in &total.source_codes {
        let source = source.trim();
        if source == total.code {
            missing.push(source.to_string());
            continue;
        }
        match ctx.registry.row_of(source) {
            Some(row) => rows.push(row),
            None => missing.push(source.to_string()),
        }
    }

    if !missing.is_empty() {
        ctx.diagnostics.push(
            DiagnosticKind::MissingReference,
            total.code.clone(),
            format!("total '{}' skips codes with no row: {}", total.name, missing.join(", ")),
        );
    }

    let mut row = Row::marked(total.code.clone(), total.name.clone(), total.code.clone());
    for col in ctx.layout.data_columns() {
        if rows.is_empty() {
            row.push(Cell::number(0.0));
            continue;
        }
        let letters = column_letters(col);
        let terms: Vec<String> = rows.iter().map(|r| format!("{letters}{r}")).collect();
        row.push(Cell::formula(terms.join("+")));
    }

    let index = ctx.sheet.append_row(row);
    ctx.register(&total.code, index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, CategoryKind};
    use crate::render::testing::{months, options, render_with, years};
    use crate::render::Layout;
    use crate::repository::{FixtureRepository, ReportDataset};
    use cashflow_core::CellRef;

    fn total(code: &str, name: &str, order: i32) -> Category {
        Category { code: code.into(), name: name.into(), kind: CategoryKind::Total, display_order: order, ..Default::default() }
    }

    #[test]
    fn test_totals_sum_registered_sources() {
        let mut data = ReportDataset {
            categories: vec![total("GP", "Gross Profit", 1), total("NP", "Net Profit", 2), total("NONE", "Nothing", 3)],
            ..Default::default()
        };
        data.total_codes.insert("GP".into(), vec!["TR1".into(), "TR2".into()]);
        data.total_codes.insert("NP".into(), vec!["GP".into(), "MISSING".into()]);
        let repo = FixtureRepository::new(data);
        let layout = Layout::new(years(&[2025]), months(&[1]));

        let (sheet, diags, registry) = render_with(&repo, layout, options(), |ctx| {
            ctx.register("TR1", 5);
            ctx.register("TR2", 9);
            render_totals(ctx).unwrap();
            assert_eq!(ctx.totals_by_name.get("Net Profit").map(String::as_str), Some("NP"));
        });

        // blank 1, heading 2, GP 3, NP 4, NONE 5
        assert_eq!(registry.row_of("GP"), Some(3));
        assert_eq!(registry.row_of("NP"), Some(4));
        assert_eq!(sheet.cell(CellRef::new(4, 3)).unwrap().as_formula(), Some("D5+D9"));
        assert_eq!(sheet.cell(CellRef::new(5, 4)).unwrap().as_formula(), Some("E3"));
        assert_eq!(sheet.cell(CellRef::new(3, 4)).unwrap().as_text(), Some("NP"));
        assert_eq!(sheet.cell(CellRef::new(4, 5)).unwrap().as_number(), Some(0.0));

        let missing: Vec<_> = diags.of_kind(DiagnosticKind::MissingReference).map(|d| d.code.clone()).collect();
        assert_eq!(missing, vec!["NP".to_string()]);
    }
}

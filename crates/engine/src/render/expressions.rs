//! Analysis rows computed from `[Name]` templates over registered totals.

use std::collections::HashMap;

use cashflow_core::style_name::{style_for_format_hint, DEFAULT_CELL_STYLE};
use cashflow_core::DiagnosticKind;

use super::RenderContext;
use crate::error::Result;
use crate::expression::PreparedExpression;
use crate::model::{Expression, ExpressionStatus};
use crate::repository::Repository;
use crate::sheet::{Cell, Row};

pub fn render_expressions(ctx: &mut RenderContext<'_>) -> Result<()> {
    let heading = Row::labelled(ctx.t("TextAnalysis"), "");
    ctx.sheet.append_row(heading);

    let expressions = ctx.repo.category_expressions()?;
    let mut rendered = 0;
    for expression in expressions.iter().filter(|e| e.syntax.renders_here()) {
        render_expression(ctx, expression)?;
        rendered += 1;
    }

    log::debug!("{rendered} expression rows rendered");
    Ok(())
}

/// Name → code: category lookup, then known totals, then the name itself.
fn resolve_name(repo: &dyn Repository, totals_by_name: &HashMap<String, String>, name: &str) -> Result<String> {
    if let Some(code) = repo.category_code_from_name(name)? {
        let code = code.trim();
        if !code.is_empty() {
            return Ok(code.to_string());
        }
    }
    Ok(totals_by_name.get(name).cloned().unwrap_or_else(|| name.to_string()))
}

fn render_expression(ctx: &mut RenderContext<'_>, expression: &Expression) -> Result<()> {
    let name = expression.name.trim();
    let template = expression.template.trim();

    let marker = marker_code(ctx, expression, name)?;
    let label = if marker.is_empty() { name.to_string() } else { marker.clone() };

    let style = match style_for_format_hint(expression.format.as_deref()) {
        Some(style) => style,
        None => {
            ctx.diagnostics.push(
                DiagnosticKind::UnsupportedFormat,
                label.clone(),
                format!(
                    "format '{}' is not supported; using {DEFAULT_CELL_STYLE}",
                    expression.format.as_deref().unwrap_or_default()
                ),
            );
            DEFAULT_CELL_STYLE.to_string()
        }
    };

    let repo = ctx.repo;
    let prepared = PreparedExpression::prepare(template, |token| resolve_name(repo, &ctx.totals_by_name, token))?;

    let missing: Vec<String> =
        prepared.codes.iter().filter(|code| !ctx.registry.contains(code)).cloned().collect();
    for code in &missing {
        ctx.diagnostics.push(
            DiagnosticKind::MissingReference,
            code.clone(),
            format!("expression '{name}' references '{code}' which has no row; using 0"),
        );
    }

    let mut row = Row::marked(name, "", marker.clone());
    for col in ctx.layout.data_columns() {
        let formula = prepared.for_column(col, &ctx.registry).formula;
        row.push(Cell::formula_styled(formula, &style));
    }
    let index = ctx.sheet.append_row(row);

    if !expression.code.trim().is_empty() {
        ctx.register(expression.code.trim(), index);
    }

    if !marker.is_empty() {
        let status = if missing.is_empty() {
            ExpressionStatus::Ok
        } else {
            ExpressionStatus::Error(format!("missing references: {}", missing.join(", ")))
        };
        if let Err(err) = ctx.repo.report_expression_status(&marker, &status) {
            ctx.diagnostics.push(DiagnosticKind::StatusReport, marker, err.to_string());
        }
    }
    Ok(())
}

fn marker_code(ctx: &RenderContext<'_>, expression: &Expression, name: &str) -> Result<String> {
    let code = expression.code.trim();
    if !code.is_empty() {
        return Ok(code.to_string());
    }
    if let Some(code) = ctx.repo.category_code_from_name(name)? {
        if !code.trim().is_empty() {
            return Ok(code.trim().to_string());
        }
    }
    Ok(ctx.totals_by_name.get(name).cloned().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, SyntaxType};
    use crate::render::testing::{months, options, render_with, years};
    use crate::render::Layout;
    use crate::repository::{FixtureRepository, ReportDataset};
    use cashflow_core::CellRef;

    fn expr(code: &str, name: &str, template: &str, format: Option<&str>) -> Expression {
        Expression {
            code: code.into(),
            name: name.into(),
            template: template.into(),
            format: format.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_expression_rows() {
        let repo = FixtureRepository::new(ReportDataset {
            categories: vec![Category { code: "TR1".into(), name: "Sales".into(), ..Default::default() }],
            expressions: vec![
                Expression { display_order: 1, ..expr("EX1", "Margin", "[Gross Profit] / [Sales]", Some("Pct1")) },
                Expression { display_order: 2, ..expr("EX2", "Broken", "[Sales] - [Ghost]", Some("Cash0")) },
                Expression { display_order: 3, syntax: SyntaxType::Excel, ..expr("EX3", "Excel only", "[Sales]", None) },
            ],
            ..Default::default()
        });
        let layout = Layout::new(years(&[2025]), months(&[1]));

        let (sheet, diags, registry) = render_with(&repo, layout, options(), |ctx| {
            ctx.register("TR1", 6);
            ctx.register("GP", 8);
            ctx.totals_by_name.insert("Gross Profit".into(), "GP".into());
            render_expressions(ctx).unwrap();
        });

        // heading 1, Margin 2, Broken 3
        assert_eq!(sheet.rows.len(), 3);
        let margin = sheet.cell(CellRef::new(4, 2)).unwrap();
        assert_eq!(margin.as_formula(), Some("D8/D6"));
        assert_eq!(margin.style.as_deref(), Some("PCT1_CELL"));
        assert_eq!(sheet.cell(CellRef::new(3, 2)).unwrap().as_text(), Some("EX1"));
        assert_eq!(sheet.cell(CellRef::new(5, 3)).unwrap().as_formula(), Some("E6-0"));
        assert_eq!(registry.row_of("EX1"), Some(2));

        let missing: Vec<_> = diags.of_kind(DiagnosticKind::MissingReference).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].code, "Ghost");

        let statuses = repo.reported_statuses();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0], ("EX1".to_string(), ExpressionStatus::Ok));
        assert!(statuses[1].1.is_error());
    }

    #[test]
    fn test_unsupported_format_falls_back() {
        let repo = FixtureRepository::new(ReportDataset {
            expressions: vec![expr("EX1", "Odd", "[A]", Some("Currency"))],
            ..Default::default()
        });
        let layout = Layout::new(years(&[2025]), months(&[1]));
        let (sheet, diags, _) = render_with(&repo, layout, options(), |ctx| {
            ctx.register("A", 1);
            render_expressions(ctx).unwrap();
        });
        assert_eq!(sheet.cell(CellRef::new(4, 2)).unwrap().style.as_deref(), Some("CASH0_CELL"));
        assert_eq!(diags.of_kind(DiagnosticKind::UnsupportedFormat).count(), 1);
        assert_eq!(diags.len(), 1);
    }
}

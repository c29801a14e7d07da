//! Cached values for formula cells.
//!
//! ODF readers expect every formula cell to carry the value it last
//! evaluated to. The statement only produces a handful of formula shapes,
//! all of which read cells above or to the left, so one pass in reading
//! order can compute them from values already seen:
//!
//! - a reference: `D10`, `[.D10]`, `$D$10`
//! - `SUM` over part of one row or one column
//! - a signed list of references, numbers and sums: `D9+D14-0`
//! - a single reference or `SUM` with a trailing `*-1`
//!
//! Anything else keeps its placeholder and is reported, as is any formula
//! that reads a cell whose value could not be cached.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use cashflow_core::style_name::{cash_variant, parse_cash_style};
use cashflow_core::{CellRef, DiagnosticKind, Diagnostics};

use crate::ods::{format_number, FORMULA_PREFIX};
use crate::xml::XmlElement;

/// Counters for one caching pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheSummary {
    pub formulas: usize,
    pub resolved: usize,
    pub restamped: usize,
}

#[derive(Clone, Debug, PartialEq)]
enum Term {
    Ref(CellRef),
    Literal(f64),
    /// Inclusive corners of a single-row or single-column range
    Sum(CellRef, CellRef),
}

#[derive(Clone, Debug, PartialEq)]
struct Shape {
    terms: Vec<(f64, Term)>,
    negate: bool,
}

impl Shape {
    /// Whether every referenced cell lies strictly before `at`.
    fn reads_only_before(&self, at: CellRef) -> bool {
        self.terms.iter().all(|(_, term)| match term {
            Term::Ref(r) => r.precedes(&at),
            Term::Literal(_) => true,
            Term::Sum(_, end) => end.precedes(&at),
        })
    }

    /// First referenced cell that is in `cells`.
    fn reads_any_of(&self, cells: &HashSet<CellRef>) -> Option<CellRef> {
        self.terms.iter().find_map(|(_, term)| match term {
            Term::Ref(r) => cells.contains(r).then_some(*r),
            Term::Literal(_) => None,
            Term::Sum(start, end) => (start.row..=end.row)
                .flat_map(|row| (start.col..=end.col).map(move |col| CellRef::new(col, row)))
                .find(|r| cells.contains(r)),
        })
    }

    fn evaluate(&self, values: &HashMap<CellRef, f64>) -> f64 {
        let value_at = |r: &CellRef| values.get(r).copied().unwrap_or(0.0);
        let total: f64 = self
            .terms
            .iter()
            .map(|(sign, term)| {
                sign * match term {
                    Term::Ref(r) => value_at(r),
                    Term::Literal(v) => *v,
                    Term::Sum(start, end) => {
                        let mut sum = 0.0;
                        for row in start.row..=end.row {
                            for col in start.col..=end.col {
                                sum += value_at(&CellRef::new(col, row));
                            }
                        }
                        sum
                    }
                }
            })
            .sum();
        if self.negate {
            -total
        } else {
            total
        }
    }
}

fn parse_shape(formula: &str) -> Option<Shape> {
    let compact: String = formula.chars().filter(|c| !c.is_whitespace()).collect();
    let body = compact
        .strip_prefix(FORMULA_PREFIX)
        .or_else(|| compact.strip_prefix('='))
        .unwrap_or(compact.as_str());

    if body.is_empty() {
        return None;
    }
    // `*-1` binds to the last term only, so it negates a lone reference or sum
    if let Some(rest) = body.strip_suffix("*-1") {
        return match parse_term(rest)? {
            Term::Literal(_) => None,
            term => Some(Shape { terms: vec![(1.0, term)], negate: true }),
        };
    }

    let mut terms = Vec::new();
    let mut sign = 1.0;
    let mut start = 0;
    let mut depth = 0i32;
    for (i, c) in body.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '+' | '-' if depth == 0 => {
                if i == 0 && c == '-' {
                    sign = -1.0;
                    start = 1;
                    continue;
                }
                terms.push((sign, parse_term(&body[start..i])?));
                sign = if c == '-' { -1.0 } else { 1.0 };
                start = i + 1;
            }
            _ => {}
        }
    }
    terms.push((sign, parse_term(&body[start..])?));
    Some(Shape { terms, negate: false })
}

fn parse_term(term: &str) -> Option<Term> {
    if term.is_empty() {
        return None;
    }
    if term.starts_with(|c: char| c.is_ascii_digit() || c == '.') && !term.contains('[') {
        if let Ok(value) = term.parse::<f64>() {
            return Some(Term::Literal(value));
        }
    }
    let upper = term.to_ascii_uppercase();
    if let Some(inner) = upper.strip_prefix("SUM(").and_then(|t| t.strip_suffix(')')) {
        if inner.contains(['(', ')']) {
            return None;
        }
        return parse_range(inner);
    }
    CellRef::from_str(term).ok().map(Term::Ref)
}

fn parse_range(range: &str) -> Option<Term> {
    let inner = range.strip_prefix('[').and_then(|r| r.strip_suffix(']')).unwrap_or(range);
    let (a, b) = inner.split_once(':')?;
    let a = CellRef::from_str(a).ok()?;
    let b = CellRef::from_str(b).ok()?;
    if a.row != b.row && a.col != b.col {
        return None;
    }
    let start = CellRef::new(a.col.min(b.col), a.row.min(b.row));
    let end = CellRef::new(a.col.max(b.col), a.row.max(b.row));
    Some(Term::Sum(start, end))
}

/// Fill in `office:value` for every recognized formula cell and move cash
/// styles onto their sign-correct variant.
pub fn cache_formula_values(content: &mut XmlElement, diagnostics: &mut Diagnostics) -> CacheSummary {
    let mut summary = CacheSummary::default();
    content.walk_mut(&mut |e: &mut XmlElement| {
        if e.name == "table:table" {
            cache_table(e, diagnostics, &mut summary);
        }
    });
    log::info!(
        "formula values cached: {}/{} resolved, {} style(s) restamped",
        summary.resolved,
        summary.formulas,
        summary.restamped
    );
    summary
}

struct TableWalk<'a> {
    values: HashMap<CellRef, f64>,
    /// Formula cells left with their placeholder
    unresolved: HashSet<CellRef>,
    row: u32,
    diagnostics: &'a mut Diagnostics,
    summary: &'a mut CacheSummary,
}

fn cache_table(table: &mut XmlElement, diagnostics: &mut Diagnostics, summary: &mut CacheSummary) {
    let mut walk = TableWalk { values: HashMap::new(), unresolved: HashSet::new(), row: 0, diagnostics, summary };
    walk_rows(table, &mut walk);
}

/// Rows may sit directly in the table or inside header/row groups.
fn walk_rows(parent: &mut XmlElement, walk: &mut TableWalk<'_>) {
    for child in parent.elements_mut() {
        match child.name.as_str() {
            "table:table-row" => walk_row(child, walk),
            "table:table-header-rows" | "table:table-row-group" | "table:table-rows" => walk_rows(child, walk),
            _ => {}
        }
    }
}

fn walk_row(row: &mut XmlElement, walk: &mut TableWalk<'_>) {
    let first_row = walk.row + 1;
    let repeat = repeat_count(row, "table:number-rows-repeated");
    walk.row += repeat;

    let mut col = 0;
    for cell in row.elements_mut() {
        if cell.name != "table:table-cell" && cell.name != "table:covered-table-cell" {
            continue;
        }
        let span = repeat_count(cell, "table:number-columns-repeated");
        let at = CellRef::new(col + 1, first_row);
        col += span;

        let covered = (first_row..first_row + repeat)
            .flat_map(|r| (at.col..at.col + span).map(move |c| CellRef::new(c, r)));
        match cell.attr("table:formula").map(str::to_string) {
            Some(formula) => match cache_cell(cell, at, &formula, walk) {
                Some(value) => walk.values.extend(covered.map(|r| (r, value))),
                None => walk.unresolved.extend(covered),
            },
            None => {
                if let Some(value) = numeric_value(cell) {
                    walk.values.extend(covered.map(|r| (r, value)));
                }
            }
        }
    }
}

fn cache_cell(cell: &mut XmlElement, at: CellRef, formula: &str, walk: &mut TableWalk<'_>) -> Option<f64> {
    walk.summary.formulas += 1;
    let shape = parse_shape(formula).filter(|s| s.reads_only_before(at));
    let Some(shape) = shape else {
        walk.diagnostics.push(
            DiagnosticKind::UnresolvedFormula,
            at.to_string(),
            format!("no cached value for '{formula}'; placeholder kept"),
        );
        return None;
    };
    if let Some(source) = shape.reads_any_of(&walk.unresolved) {
        walk.diagnostics.push(
            DiagnosticKind::UnresolvedFormula,
            at.to_string(),
            format!("no cached value for '{formula}': {source} is unresolved; placeholder kept"),
        );
        return None;
    }

    let value = shape.evaluate(&walk.values);
    cell.set_attr("office:value-type", "float");
    cell.set_attr("office:value", format_number(value));
    walk.summary.resolved += 1;

    if let Some(style) = cell.attr("table:style-name").map(str::to_string) {
        if parse_cash_style(&style).is_some() {
            let variant = cash_variant(&style, value);
            if variant != style {
                cell.set_attr("table:style-name", variant);
                walk.summary.restamped += 1;
            }
        }
    }
    Some(value)
}

fn numeric_value(cell: &XmlElement) -> Option<f64> {
    match cell.attr("office:value-type") {
        Some("float" | "percentage" | "currency") => cell.attr("office:value")?.trim().parse().ok(),
        _ => None,
    }
}

fn repeat_count(e: &XmlElement, key: &str) -> u32 {
    e.attr(key).and_then(|v| v.parse().ok()).filter(|&n| n > 0).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    fn table(rows: &str) -> XmlElement {
        xml::parse(&format!(r#"<office:spreadsheet><table:table table:name="T">{rows}</table:table></office:spreadsheet>"#))
            .unwrap()
    }

    fn cell_at<'a>(doc: &'a XmlElement, col: u32, row: u32) -> &'a XmlElement {
        let table = doc.child("table:table").unwrap();
        let row = table.children_named("table:table-row").nth(row as usize - 1).unwrap();
        row.children_named("table:table-cell").nth(col as usize - 1).unwrap()
    }

    fn num(v: f64) -> String {
        format!(r#"<table:table-cell office:value-type="float" office:value="{v}" table:style-name="CASH0_POS_CELL"/>"#)
    }

    fn formula(f: &str, style: &str) -> String {
        format!(r#"<table:table-cell table:formula="of:={f}" office:value-type="float" office:value="0" table:style-name="{style}"/>"#)
    }

    #[test]
    fn test_shapes() {
        assert_eq!(
            parse_shape("of:=SUM([.D5:.D9])*-1"),
            Some(Shape {
                terms: vec![(1.0, Term::Sum(CellRef::new(4, 5), CellRef::new(4, 9)))],
                negate: true
            })
        );
        assert_eq!(
            parse_shape("=-D9+$E$2-[.F1]+0"),
            Some(Shape {
                terms: vec![
                    (-1.0, Term::Ref(CellRef::new(4, 9))),
                    (1.0, Term::Ref(CellRef::new(5, 2))),
                    (-1.0, Term::Ref(CellRef::new(6, 1))),
                    (1.0, Term::Literal(0.0)),
                ],
                negate: false
            })
        );
        assert!(parse_shape("of:=D9/D14").is_none());
        assert!(parse_shape("of:=SUM([.D5:.E9])").is_none());
        assert!(parse_shape("of:=IF(D1>0;1;0)").is_none());
        assert!(parse_shape("of:=D1+").is_none());

        // `*-1` only negates the term it follows
        assert_eq!(
            parse_shape("of:=[.D9]*-1"),
            Some(Shape { terms: vec![(1.0, Term::Ref(CellRef::new(4, 9)))], negate: true })
        );
        assert!(parse_shape("of:=A1+B1*-1").is_none());
        assert!(parse_shape("of:=D9+D14*-1").is_none());
        assert!(parse_shape("of:=SUM([.A1:.A2])+SUM([.B1:.B2])*-1").is_none());
        assert!(parse_shape("of:=5*-1").is_none());
    }

    #[test]
    fn test_trailing_negation_on_signed_list_is_not_cached() {
        let rows = format!("<table:table-row>{}{}{}</table:table-row>", num(10.0), num(3.0), formula("A1+B1*-1", "CASH0_CELL"));
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();
        let summary = cache_formula_values(&mut doc, &mut diags);

        assert_eq!(summary.resolved, 0);
        assert_eq!(diags.iter().map(|d| d.code.as_str()).collect::<Vec<_>>(), vec!["C1"]);
        assert_eq!(cell_at(&doc, 3, 1).attr("office:value"), Some("0"));
        assert_eq!(cell_at(&doc, 3, 1).attr("table:style-name"), Some("CASH0_CELL"));
    }

    #[test]
    fn test_formulas_reading_unresolved_cells_are_reported() {
        let rows = [
            format!("<table:table-row><table:table-cell/><table:table-cell/>{}</table:table-row>", formula("D1/E1", "PCT1_CELL")),
            format!("<table:table-row><table:table-cell/><table:table-cell/>{}</table:table-row>", formula("C1", "CASH0_CELL")),
            format!("<table:table-row>{}{}{}</table:table-row>", num(2.0), num(3.0), formula("SUM([.A3:.B3])", "CASH0_CELL")),
        ]
        .concat();
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();
        let summary = cache_formula_values(&mut doc, &mut diags);

        assert_eq!(summary, CacheSummary { formulas: 3, resolved: 1, restamped: 1 });
        let codes: Vec<_> = diags.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["C1", "C2"]);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::UnresolvedFormula));
        assert!(diags.iter().nth(1).is_some_and(|d| d.message.contains("C1 is unresolved")));
        assert_eq!(cell_at(&doc, 3, 2).attr("office:value"), Some("0"));
        assert_eq!(cell_at(&doc, 3, 2).attr("table:style-name"), Some("CASH0_CELL"));
        assert_eq!(cell_at(&doc, 3, 3).attr("office:value"), Some("5"));
    }

    #[test]
    fn test_sum_over_unresolved_cell_is_reported() {
        let rows = [
            format!("<table:table-row>{}{}</table:table-row>", num(4.0), formula("A1/2", "CASH0_CELL")),
            format!("<table:table-row>{}{}</table:table-row>", num(1.0), num(1.0)),
            format!("<table:table-row><table:table-cell/>{}</table:table-row>", formula("SUM([.B1:.B2])", "CASH0_CELL")),
        ]
        .concat();
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();
        cache_formula_values(&mut doc, &mut diags);

        assert_eq!(diags.iter().map(|d| d.code.as_str()).collect::<Vec<_>>(), vec!["B1", "B3"]);
        assert_eq!(cell_at(&doc, 2, 3).attr("office:value"), Some("0"));
    }

    #[test]
    fn test_reference_to_negative_value_restamps_neg() {
        // B8 holds -4321; B9 is =B8
        let mut rows = String::new();
        for _ in 1..8 {
            rows.push_str("<table:table-row><table:table-cell/></table:table-row>");
        }
        rows.push_str(&format!("<table:table-row><table:table-cell/>{}</table:table-row>", num(-4321.0)));
        rows.push_str(&format!("<table:table-row><table:table-cell/>{}</table:table-row>", formula("B8", "CASH2_CELL")));
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();

        let summary = cache_formula_values(&mut doc, &mut diags);

        assert!(diags.is_empty());
        assert_eq!(summary, CacheSummary { formulas: 1, resolved: 1, restamped: 1 });
        let b9 = cell_at(&doc, 2, 9);
        assert_eq!(b9.attr("office:value"), Some("-4321"));
        assert_eq!(b9.attr("table:style-name"), Some("CASH2_NEG_CELL"));
    }

    #[test]
    fn test_expense_total_chain() {
        let rows = [
            format!("<table:table-row>{}{}{}</table:table-row>", num(100.0), num(200.0), formula("SUM([.A1:.B1])", "CASH0_CELL")),
            format!("<table:table-row>{}{}{}</table:table-row>", num(50.0), num(50.0), formula("SUM([.A2:.B2])", "CASH0_CELL")),
            format!(
                "<table:table-row>{}{}{}</table:table-row>",
                formula("SUM([.A1:.A2])*-1", "CASH0_CELL"),
                formula("SUM([.B1:.B2])*-1", "CASH0_CELL"),
                formula("SUM([.C1:.C2])*-1", "CASH0_CELL")
            ),
        ]
        .concat();
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();
        cache_formula_values(&mut doc, &mut diags);

        assert_eq!(cell_at(&doc, 3, 1).attr("office:value"), Some("300"));
        assert_eq!(cell_at(&doc, 3, 1).attr("table:style-name"), Some("CASH0_POS_CELL"));
        assert_eq!(cell_at(&doc, 3, 3).attr("office:value"), Some("-400"));
        assert_eq!(cell_at(&doc, 3, 3).attr("table:style-name"), Some("CASH0_NEG_CELL"));
        assert_eq!(cell_at(&doc, 1, 3).attr("office:value"), Some("-150"));
    }

    #[test]
    fn test_repeated_columns_and_rows_advance_position() {
        let rows = [
            r#"<table:table-row table:number-rows-repeated="2"><table:table-cell table:number-columns-repeated="2"/><table:table-cell office:value-type="float" office:value="5"/></table:table-row>"#.to_string(),
            format!("<table:table-row><table:table-cell table:number-columns-repeated=\"2\"/>{}</table:table-row>", formula("SUM([.C1:.C2])", "NUM0_CELL")),
        ]
        .concat();
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();
        cache_formula_values(&mut doc, &mut diags);

        let table = doc.child("table:table").unwrap();
        let last = table.children_named("table:table-row").nth(1).unwrap();
        let c3 = last.children_named("table:table-cell").nth(1).unwrap();
        assert_eq!(c3.attr("office:value"), Some("10"));
        // non-cash styles are never restamped
        assert_eq!(c3.attr("table:style-name"), Some("NUM0_CELL"));
    }

    #[test]
    fn test_unrecognized_and_forward_references_are_reported() {
        let rows = format!(
            "<table:table-row>{}{}{}</table:table-row>",
            num(4.0),
            formula("A1/2", "PCT1_CELL"),
            formula("D1", "CASH0_CELL")
        );
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();
        let summary = cache_formula_values(&mut doc, &mut diags);

        assert_eq!(summary.resolved, 0);
        assert_eq!(diags.len(), 2);
        let codes: Vec<_> = diags.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["B1", "C1"]);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::UnresolvedFormula));
        assert_eq!(cell_at(&doc, 2, 1).attr("office:value"), Some("0"));
        assert_eq!(cell_at(&doc, 3, 1).attr("table:style-name"), Some("CASH0_CELL"));
    }

    #[test]
    fn test_text_and_empty_predecessors_count_as_zero() {
        let rows = format!(
            r#"<table:table-row><table:table-cell office:value-type="string"><text:p>x</text:p></table:table-cell><table:table-cell/>{}</table:table-row>"#,
            formula("A1+B1+7", "CASH0_CELL")
        );
        let mut doc = table(&rows);
        let mut diags = Diagnostics::new();
        cache_formula_values(&mut doc, &mut diags);
        assert_eq!(cell_at(&doc, 3, 1).attr("office:value"), Some("7"));
    }
}

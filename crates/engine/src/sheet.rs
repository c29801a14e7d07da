//! Append-only statement grid.
//!
//! Rows are written top to bottom and never revisited. Formulas address
//! earlier rows by index, so the builder's row counter is the only source
//! of truth for positions.

use cashflow_core::style_name::{cash_variant, DEFAULT_CELL_STYLE};
use cashflow_core::CellRef;

#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Empty,
    Text(String),
    Number(f64),
    /// OpenFormula expression without the `of:=` prefix
    Formula(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub content: CellContent,
    pub style: Option<String>,
}

impl Cell {
    pub fn empty() -> Self {
        Self { content: CellContent::Empty, style: None }
    }

    /// Text cell; empty text yields an empty cell so long labels can overflow.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::empty()
        } else {
            Self { content: CellContent::Text(text), style: None }
        }
    }

    /// Literal number stamped with the sign-correct default cash style.
    pub fn number(value: f64) -> Self {
        Self::number_styled(value, DEFAULT_CELL_STYLE)
    }

    /// Literal number. Cash styles are resolved to their POS/NEG variant.
    pub fn number_styled(value: f64, style: &str) -> Self {
        Self { content: CellContent::Number(value), style: Some(cash_variant(style, value)) }
    }

    /// Formula with the default cash base style; polarity is decided once
    /// the value is known.
    pub fn formula(formula: impl Into<String>) -> Self {
        Self::formula_styled(formula, DEFAULT_CELL_STYLE)
    }

    pub fn formula_styled(formula: impl Into<String>, style: &str) -> Self {
        Self { content: CellContent::Formula(formula.into()), style: Some(style.to_string()) }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match &self.content {
            CellContent::Formula(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.content {
            CellContent::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            CellContent::Text(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code, name and an empty marker column.
    pub fn labelled(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self { cells: vec![Cell::text(code), Cell::text(name), Cell::empty()] }
    }

    /// Code, name and a marker in the hidden column.
    pub fn marked(code: impl Into<String>, name: impl Into<String>, marker: impl Into<String>) -> Self {
        Self { cells: vec![Cell::text(code), Cell::text(name), Cell::text(marker)] }
    }

    pub fn push(&mut self, cell: Cell) -> &mut Self {
        self.cells.push(cell);
        self
    }

    /// Cell at a 1-based column.
    pub fn get(&self, col: u32) -> Option<&Cell> {
        let idx = (col as usize).checked_sub(1)?;
        self.cells.get(idx)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
    /// 1-based columns rendered collapsed
    pub hidden_columns: Vec<u32>,
    /// Rows kept visible while scrolling
    pub frozen_rows: u32,
}

impl Sheet {
    /// Cell at a 1-based address.
    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        let idx = (at.row as usize).checked_sub(1)?;
        self.rows.get(idx)?.get(at.col)
    }

    /// Widest row, in cells.
    pub fn column_count(&self) -> u32 {
        self.rows.iter().map(|r| r.cells.len() as u32).max().unwrap_or(0)
    }
}

/// Streams rows into a [`Sheet`] and tracks the 1-based index of the last
/// appended row.
#[derive(Debug)]
pub struct SheetBuilder {
    sheet: Sheet,
    row_index: u32,
}

impl SheetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sheet: Sheet { name: name.into(), rows: Vec::new(), hidden_columns: Vec::new(), frozen_rows: 0 },
            row_index: 0,
        }
    }

    /// Append a row and return its 1-based index.
    pub fn append_row(&mut self, row: Row) -> u32 {
        self.sheet.rows.push(row);
        self.row_index += 1;
        self.row_index
    }

    pub fn append_blank(&mut self) -> u32 {
        self.append_row(Row::new())
    }

    /// Number of rows appended so far; equals the index of the last row.
    pub fn current_row_index(&self) -> u32 {
        self.row_index
    }

    /// Index the next appended row will get.
    pub fn next_row_index(&self) -> u32 {
        self.row_index + 1
    }

    pub fn hide_column(&mut self, col: u32) {
        if !self.sheet.hidden_columns.contains(&col) {
            self.sheet.hidden_columns.push(col);
        }
    }

    pub fn freeze_rows(&mut self, rows: u32) {
        self.sheet.frozen_rows = rows;
    }

    pub fn finish(self) -> Sheet {
        self.sheet
    }
}

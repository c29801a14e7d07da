//! Section renderers.
//!
//! Each renderer appends its rows to the shared [`RenderContext`] and may
//! register or consult category total rows. Ranges are derived from row
//! counts at the time of writing; nothing reads the grid back.

pub mod balance_sheet;
pub mod bank;
pub mod categories;
pub mod expressions;
pub mod header;
pub mod summary;
pub mod totals;
pub mod vat;

use std::collections::HashMap;
use std::ops::RangeInclusive;

use cashflow_core::refs::{data_column_count, year_block_columns};
use cashflow_core::{DiagnosticKind, Diagnostics, Translate, FIRST_DATA_COLUMN};

use crate::model::{Month, Period};
use crate::registry::TotalsRegistry;
use crate::report::ReportOptions;
use crate::repository::Repository;
use crate::sheet::SheetBuilder;

/// Column layout: one block of month columns plus a totals column per year.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    pub years: Vec<Period>,
    pub months: Vec<Month>,
}

impl Layout {
    pub fn new(years: Vec<Period>, months: Vec<Month>) -> Self {
        Self { years, months }
    }

    pub fn month_count(&self) -> u32 {
        self.months.len() as u32
    }

    /// `(first_month_column, totals_column)` of a year block.
    pub fn year_block(&self, year_index: usize) -> (u32, u32) {
        year_block_columns(self.month_count(), year_index as u32)
    }

    /// Every period column, first to last. Empty when there are no years.
    pub fn data_columns(&self) -> RangeInclusive<u32> {
        let count = data_column_count(self.month_count(), self.years.len() as u32);
        FIRST_DATA_COLUMN..=FIRST_DATA_COLUMN + count - 1
    }

    /// Position of a month number within the calendar.
    pub fn month_position(&self, month_number: u32) -> Option<usize> {
        self.months.iter().position(|m| m.month_number == month_number)
    }
}

/// State owned by one statement build.
pub struct RenderContext<'a> {
    pub repo: &'a dyn Repository,
    pub tr: &'a dyn Translate,
    pub options: ReportOptions,
    pub layout: Layout,
    pub sheet: SheetBuilder,
    pub registry: TotalsRegistry,
    /// Total name → code, filled by the totals section
    pub totals_by_name: HashMap<String, String>,
    pub diagnostics: Diagnostics,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        tr: &'a dyn Translate,
        options: ReportOptions,
        layout: Layout,
        sheet: SheetBuilder,
    ) -> Self {
        Self {
            repo,
            tr,
            options,
            layout,
            sheet,
            registry: TotalsRegistry::new(),
            totals_by_name: HashMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn t(&self, key: &str) -> String {
        self.tr.translate(key)
    }

    /// Register a total row. A second registration keeps the first row.
    pub fn register(&mut self, code: &str, row: u32) {
        if code.is_empty() {
            return;
        }
        if let Err(dup) = self.registry.register(code, row) {
            self.diagnostics.push(
                DiagnosticKind::DuplicateRegistration,
                code,
                format!("row {row} ignored; code already registered at row {}", dup.existing_row),
            );
        }
    }
}

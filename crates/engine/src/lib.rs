//! Cash-flow statement engine.
//!
//! Lays out a multi-year statement as a grid of text, numbers and formulas.
//! Formulas reference earlier rows through a registry of category totals,
//! so the finished grid stays live in a spreadsheet application.

pub mod error;
pub mod expression;
pub mod model;
pub mod registry;
pub mod render;
pub mod report;
pub mod repository;
pub mod sheet;

pub use error::{EngineError, RepositoryError};
pub use report::{build_cash_statement, BuiltReport, ReportOptions, SHEET_NAME};
pub use repository::{FixtureRepository, ReportDataset, Repository};
pub use sheet::{Cell, CellContent, Row, Sheet, SheetBuilder};

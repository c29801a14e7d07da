//! Output and data-source side of the statement generator.
//!
//! Turns a built [`cashflow_engine::Sheet`] into an OpenDocument
//! spreadsheet, materializes the semantic styles its cells name, caches
//! formula values, and opens the repositories a job can point at.

pub mod datasource;
pub mod error;
pub mod export;
pub mod ods;
pub mod sqlite;
pub mod styles;
pub mod value_cache;
pub mod xml;

pub use datasource::{DataSource, DataSourceKind};
pub use error::{ExportError, Result, XmlError};
pub use export::{export_cash_statement, finalize_package, report_filename, write_package, ExportedReport};
pub use ods::OdsPackage;
pub use sqlite::SqliteRepository;
pub use value_cache::{cache_formula_values, CacheSummary};

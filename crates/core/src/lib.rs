//! Shared building blocks for the cash-flow statement generator.
//!
//! Cell reference algebra, the semantic style naming contract, locale
//! values, label translation and the diagnostics list.

pub mod diagnostics;
pub mod locale;
pub mod refs;
pub mod style_name;
pub mod translate;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use locale::Locale;
pub use refs::{column_index, column_letters, year_block_columns, CellRef, FIRST_DATA_COLUMN};
pub use style_name::{Polarity, StyleKey, StyleKind, DEFAULT_CELL_STYLE};
pub use translate::Translate;

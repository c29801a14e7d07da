//! Cell reference algebra for the statement grid.
//!
//! Columns are 1-based throughout: column 1 is `A`. Rows are 1-based as they
//! appear in formulas. Columns 1-3 hold the code, the name and a hidden
//! marker; period data starts at [`FIRST_DATA_COLUMN`].

use std::fmt;
use std::str::FromStr;

/// First column carrying period data (`D`).
pub const FIRST_DATA_COLUMN: u32 = 4;

/// Column holding the hidden code marker (`C`).
pub const MARKER_COLUMN: u32 = 3;

/// Largest column addressable with three letters (`ZZZ`).
pub const MAX_COLUMN: u32 = 18_278;

/// Convert a 1-based column index to letters: 1 → `A`, 26 → `Z`, 27 → `AA`.
///
/// Base-26 without a zero digit. Index 0 has no letters and yields an empty
/// string.
pub fn column_letters(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Parse column letters back to a 1-based index. Case-insensitive.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index)
}

/// Column span of one year block: `monthCount` month columns followed by a
/// totals column.
///
/// Returns `(first_column, totals_column)`.
pub fn year_block_columns(month_count: u32, year_index: u32) -> (u32, u32) {
    let first = FIRST_DATA_COLUMN + year_index * (month_count + 1);
    (first, first + month_count)
}

/// Number of data columns for `year_count` blocks of `month_count` months.
pub fn data_column_count(month_count: u32, year_count: u32) -> u32 {
    year_count * (month_count + 1)
}

/// A single cell address, e.g. `D10`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// 1-based row (first field so ordering follows document order)
    pub row: u32,
    /// 1-based column
    pub col: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { row, col }
    }

    /// `true` when `self` comes strictly before `other` in reading order
    /// (top-to-bottom, then left-to-right).
    pub fn precedes(&self, other: &CellRef) -> bool {
        self < other
    }

    /// Bracketed OpenFormula form: `[.D10]`.
    pub fn to_bracketed(&self) -> String {
        format!("[.{}]", self)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell reference: {0:?}")]
pub struct RefParseError(pub String);

impl FromStr for CellRef {
    type Err = RefParseError;

    /// Accepts `D10`, `$D$10`, `.D10` and `[.D10]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RefParseError(s.to_string());
        let mut body = s.trim();
        if let Some(inner) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
            body = inner;
        }
        let body = body.strip_prefix('.').unwrap_or(body);
        let body: String = body.chars().filter(|c| *c != '$').collect();

        let split = body.find(|c: char| c.is_ascii_digit()).ok_or_else(err)?;
        let (letters, digits) = body.split_at(split);
        let col = column_index(letters).ok_or_else(err)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let row: u32 = digits.parse().map_err(|_| err())?;
        if row == 0 {
            return Err(err());
        }
        Ok(CellRef::new(col, row))
    }
}

/// OpenFormula range over one column: `[.D5:.D9]`.
pub fn column_range(col: u32, first_row: u32, last_row: u32) -> String {
    range(CellRef::new(col, first_row), CellRef::new(col, last_row))
}

/// OpenFormula range over one row: `[.D5:.O5]`.
pub fn row_range(row: u32, first_col: u32, last_col: u32) -> String {
    range(CellRef::new(first_col, row), CellRef::new(last_col, row))
}

/// OpenFormula range between two corners.
pub fn range(start: CellRef, end: CellRef) -> String {
    format!("[.{}:.{}]", start, end)
}

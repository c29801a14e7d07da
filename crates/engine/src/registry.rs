//! Category code → row index, shared by every section of one build.

use std::collections::HashMap;

/// Write-once map from category code to the 1-based row of its total.
///
/// Later sections read it to build cross-references. A code registered
/// twice keeps its first row.
#[derive(Clone, Debug, Default)]
pub struct TotalsRegistry {
    rows: HashMap<String, u32>,
}

/// Returned when a code already has a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlreadyRegistered {
    pub existing_row: u32,
}

impl TotalsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, code: &str, row: u32) -> Result<(), AlreadyRegistered> {
        if let Some(&existing_row) = self.rows.get(code) {
            return Err(AlreadyRegistered { existing_row });
        }
        self.rows.insert(code.to_string(), row);
        Ok(())
    }

    pub fn row_of(&self, code: &str) -> Option<u32> {
        self.rows.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rows.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

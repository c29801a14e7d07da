//! Non-fatal anomalies collected while building a statement.
//!
//! A diagnostic never stops the build. The artifact is always complete; the
//! list explains where a placeholder or fallback was used.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A formula referenced a code with no registered row; `0` was used.
    MissingReference,
    /// A numeric format hint could not be mapped to a style.
    UnsupportedFormat,
    /// A formula's cached value could not be computed.
    UnresolvedFormula,
    /// A code was registered twice; the first row was kept.
    DuplicateRegistration,
    /// The data source refused an expression status update.
    StatusReport,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::MissingReference => "missing-reference",
            DiagnosticKind::UnsupportedFormat => "unsupported-format",
            DiagnosticKind::UnresolvedFormula => "unresolved-formula",
            DiagnosticKind::DuplicateRegistration => "duplicate-registration",
            DiagnosticKind::StatusReport => "status-report",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Category code or cell address the diagnostic is about
    pub code: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.code, self.message)
    }
}

/// Ordered diagnostic list. Every push is also logged at `warn`.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, code: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic { kind, code: code.into(), message: message.into() };
        log::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

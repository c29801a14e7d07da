//! Two-phase resolution of bracketed expression templates.
//!
//! Phase one runs once per template: `[Name]` tokens are resolved to
//! category codes and the text is normalized to the spreadsheet dialect.
//! Phase two runs once per output column: each `[Code]` is replaced by the
//! cell holding that code's total in the column, or `0` when the code has
//! no row.
//!
//! ```text
//! "[Sales] - [Costs]"  →  "[TR1]-[TR2]"  →  "D12-D19"
//! ```

use std::collections::HashMap;

use cashflow_core::column_letters;

use crate::registry::TotalsRegistry;

/// Distinct `[Name]` tokens in first-seen order, trimmed. Empty tokens are
/// skipped; an unclosed `[` ends the scan.
pub fn extract_tokens(template: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for segment in segments(template) {
        if let Segment::Bracket(inner) = segment {
            let token = inner.trim();
            if !token.is_empty() && !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
    }
    tokens
}

/// Replace each `[Name]` with `[Code]` using `names`. Unknown names are left
/// as they are.
pub fn rewrite_names(template: &str, names: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Plain(text) => out.push_str(text),
            Segment::Bracket(inner) => match names.get(inner.trim()) {
                Some(code) => {
                    out.push('[');
                    out.push_str(code);
                    out.push(']');
                }
                None => {
                    out.push('[');
                    out.push_str(inner);
                    out.push(']');
                }
            },
        }
    }
    out
}

/// Canonicalize a template for the spreadsheet dialect.
///
/// Function names (an identifier followed by `(`) are upper-cased, `,`
/// argument separators become `;`, and whitespace is dropped. Bracketed
/// tokens and double-quoted strings are copied untouched.
pub fn normalize_dialect(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '[' => {
                let end = chars[i..].iter().position(|&ch| ch == ']').map(|p| i + p);
                let stop = end.map(|e| e + 1).unwrap_or(chars.len());
                out.extend(&chars[i..stop]);
                i = stop;
            }
            '"' => {
                let end = chars[i + 1..].iter().position(|&ch| ch == '"').map(|p| i + 1 + p);
                let stop = end.map(|e| e + 1).unwrap_or(chars.len());
                out.extend(&chars[i..stop]);
                i = stop;
            }
            ',' => {
                out.push(';');
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let mut next = i;
                while next < chars.len() && chars[next].is_whitespace() {
                    next += 1;
                }
                if chars.get(next) == Some(&'(') {
                    out.push_str(&ident.to_ascii_uppercase());
                } else {
                    out.push_str(&ident);
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Result of substituting cell references into a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substituted {
    pub formula: String,
    /// Codes with no reference, in first-seen order
    pub missing: Vec<String>,
}

/// Replace every `[Code]` with `refs[code]`, or `0` when absent.
pub fn substitute(template: &str, refs: &HashMap<String, String>) -> Substituted {
    let mut formula = String::with_capacity(template.len());
    let mut missing: Vec<String> = Vec::new();
    for segment in segments(template) {
        match segment {
            Segment::Plain(text) => formula.push_str(text),
            Segment::Bracket(inner) => {
                let code = inner.trim();
                match refs.get(code) {
                    Some(cell) => formula.push_str(cell),
                    None => {
                        formula.push('0');
                        if !missing.iter().any(|m| m == code) {
                            missing.push(code.to_string());
                        }
                    }
                }
            }
        }
    }
    Substituted { formula, missing }
}

/// A template with names resolved to codes, ready for per-column output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedExpression {
    pub normalized: String,
    /// Distinct codes referenced, in first-seen order
    pub codes: Vec<String>,
}

impl PreparedExpression {
    /// Resolve names with `resolve` and normalize the dialect.
    pub fn prepare<E, F>(template: &str, mut resolve: F) -> Result<Self, E>
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        let mut names = HashMap::new();
        let mut codes: Vec<String> = Vec::new();
        for token in extract_tokens(template) {
            let code = resolve(&token)?;
            if !codes.contains(&code) {
                codes.push(code.clone());
            }
            names.insert(token, code);
        }
        let normalized = normalize_dialect(&rewrite_names(template, &names));
        Ok(Self { normalized, codes })
    }

    /// Formula text for one 1-based column.
    pub fn for_column(&self, col: u32, registry: &TotalsRegistry) -> Substituted {
        let letters = column_letters(col);
        let refs: HashMap<String, String> = self
            .codes
            .iter()
            .filter_map(|code| registry.row_of(code).map(|row| (code.clone(), format!("{letters}{row}"))))
            .collect();
        substitute(&self.normalized, &refs)
    }
}

enum Segment<'a> {
    Plain(&'a str),
    Bracket(&'a str),
}

/// Split into plain text and `[...]` interiors. An unclosed `[` and the
/// rest of the text are returned as plain.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open + 1..].find(']').map(|c| open + 1 + c) else {
            break;
        };
        if open > 0 {
            out.push(Segment::Plain(&rest[..open]));
        }
        out.push(Segment::Bracket(&rest[open + 1..close]));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Plain(rest));
    }
    out
}

//! Semantic cell style names.
//!
//! The grid only ever refers to styles by name. A name encodes what kind of
//! number the cell holds and how many decimals to show:
//!
//! | Name               | Meaning                                   |
//! |--------------------|-------------------------------------------|
//! | `NUM<d>_CELL`      | plain number, `d` decimals, grouped        |
//! | `PCT<d>_CELL`      | percentage, `d` decimals                  |
//! | `CASH<d>_POS_CELL` | cash, non-negative                        |
//! | `CASH<d>_NEG_CELL` | cash, negative: `(1,234)` in red           |
//! | `CASH<d>_CELL`     | cash base, routes to POS/NEG by value     |
//!
//! `<d>` is a single digit. The concrete display rules are synthesized from
//! these names when the document is packaged.

use std::fmt;

/// Style applied when nothing more specific is known.
pub const DEFAULT_CELL_STYLE: &str = "CASH0_CELL";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleKind {
    Number,
    Percentage,
    Cash,
}

impl StyleKind {
    fn prefix(self) -> &'static str {
        match self {
            StyleKind::Number => "NUM",
            StyleKind::Percentage => "PCT",
            StyleKind::Cash => "CASH",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Polarity::Positive => "POS",
            Polarity::Negative => "NEG",
        }
    }
}

/// Parsed form of a semantic style name. Only `Cash` carries a polarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleKey {
    pub kind: StyleKind,
    pub decimals: u8,
    pub polarity: Option<Polarity>,
}

impl StyleKey {
    pub fn number(decimals: u8) -> Self {
        Self { kind: StyleKind::Number, decimals, polarity: None }
    }

    pub fn percentage(decimals: u8) -> Self {
        Self { kind: StyleKind::Percentage, decimals, polarity: None }
    }

    pub fn cash(decimals: u8, polarity: Polarity) -> Self {
        Self { kind: StyleKind::Cash, decimals, polarity: Some(polarity) }
    }

    /// Cell style name, e.g. `CASH2_NEG_CELL`.
    pub fn cell_style_name(&self) -> String {
        format!("{}_CELL", self.stem())
    }

    /// Data (number format) style name, e.g. `CASH2_NEG_DS`.
    pub fn data_style_name(&self) -> String {
        format!("{}_DS", self.stem())
    }

    /// Name of the cash base style shared by a POS/NEG pair.
    pub fn cash_base_name(&self) -> Option<String> {
        match self.kind {
            StyleKind::Cash => Some(cash_base_style(self.decimals)),
            _ => None,
        }
    }

    fn stem(&self) -> String {
        match self.polarity {
            Some(p) => format!("{}{}_{}", self.kind.prefix(), self.decimals, p.tag()),
            None => format!("{}{}", self.kind.prefix(), self.decimals),
        }
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cell_style_name())
    }
}

/// A cash style name of any of the three shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CashStyle {
    Base { decimals: u8 },
    Variant(StyleKey),
}

impl CashStyle {
    pub fn decimals(&self) -> u8 {
        match self {
            CashStyle::Base { decimals } => *decimals,
            CashStyle::Variant(key) => key.decimals,
        }
    }
}

/// Parse a concrete semantic style name. Base `CASH<d>_CELL` is not a
/// StyleKey; see [`parse_cash_style`].
pub fn parse_style_name(name: &str) -> Option<StyleKey> {
    let stem = name.strip_suffix("_CELL")?;
    let (kind, rest) = split_kind(stem)?;
    let (decimals, tail) = split_digit(rest)?;
    match (kind, tail) {
        (StyleKind::Number, "") => Some(StyleKey::number(decimals)),
        (StyleKind::Percentage, "") => Some(StyleKey::percentage(decimals)),
        (StyleKind::Cash, "_POS") => Some(StyleKey::cash(decimals, Polarity::Positive)),
        (StyleKind::Cash, "_NEG") => Some(StyleKey::cash(decimals, Polarity::Negative)),
        _ => None,
    }
}

/// Parse any cash style name, including the routing base.
pub fn parse_cash_style(name: &str) -> Option<CashStyle> {
    if let Some(key) = parse_style_name(name) {
        return match key.kind {
            StyleKind::Cash => Some(CashStyle::Variant(key)),
            _ => None,
        };
    }
    let stem = name.strip_suffix("_CELL")?;
    let rest = stem.strip_prefix("CASH")?;
    match split_digit(rest)? {
        (decimals, "") => Some(CashStyle::Base { decimals }),
        _ => None,
    }
}

/// `CASH<d>_CELL`
pub fn cash_base_style(decimals: u8) -> String {
    format!("CASH{decimals}_CELL")
}

/// Sign-correct variant of any cash style. Non-cash names pass through.
pub fn cash_variant(name: &str, value: f64) -> String {
    match parse_cash_style(name) {
        Some(style) => StyleKey::cash(style.decimals(), Polarity::of(value)).cell_style_name(),
        None => name.to_string(),
    }
}

/// Map a numeric format hint (`Cash0`, `Num2`, `Pct1`, case-insensitive) to
/// a cell style name.
///
/// Empty hints map to [`DEFAULT_CELL_STYLE`]. Names that already carry the
/// `_CELL` suffix are accepted when they are valid semantic names. Returns
/// `None` for anything unsupported.
pub fn style_for_format_hint(hint: Option<&str>) -> Option<String> {
    let hint = hint.map(str::trim).unwrap_or("");
    if hint.is_empty() {
        return Some(DEFAULT_CELL_STYLE.to_string());
    }
    let upper = hint.to_ascii_uppercase();
    let candidate = if upper.ends_with("_CELL") {
        upper
    } else {
        format!("{upper}_CELL")
    };
    if parse_style_name(&candidate).is_some() || parse_cash_style(&candidate).is_some() {
        Some(candidate)
    } else {
        None
    }
}

fn split_kind(stem: &str) -> Option<(StyleKind, &str)> {
    [StyleKind::Cash, StyleKind::Number, StyleKind::Percentage]
        .into_iter()
        .find_map(|kind| stem.strip_prefix(kind.prefix()).map(|rest| (kind, rest)))
}

fn split_digit(rest: &str) -> Option<(u8, &str)> {
    let mut chars = rest.chars();
    let digit = chars.next()?.to_digit(10)? as u8;
    Some((digit, chars.as_str()))
}

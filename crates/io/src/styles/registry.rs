//! Semantic style names found in a document.

use std::collections::{BTreeMap, BTreeSet};

use cashflow_core::style_name::{parse_cash_style, parse_style_name, CashStyle};
use cashflow_core::{Polarity, StyleKey, StyleKind};

use crate::xml::XmlElement;

/// Deduplicated cell style name → [`StyleKey`]. Ordered so that generated
/// definitions come out in the same order on every run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleRegistry {
    keys: BTreeMap<String, StyleKey>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `table:style-name` on a table cell under `root`.
    pub fn scan(root: &XmlElement) -> Self {
        let mut registry = Self::new();
        root.walk(&mut |e: &XmlElement| {
            if e.name == "table:table-cell" {
                if let Some(name) = e.attr("table:style-name") {
                    registry.add(name);
                }
            }
        });
        registry
    }

    /// Record a cell style name. A cash base name records both of its
    /// variants. Returns false for names that are not semantic.
    pub fn add(&mut self, name: &str) -> bool {
        if let Some(key) = parse_style_name(name) {
            self.keys.insert(key.cell_style_name(), key);
            return true;
        }
        if let Some(CashStyle::Base { decimals }) = parse_cash_style(name) {
            for polarity in [Polarity::Positive, Polarity::Negative] {
                let key = StyleKey::cash(decimals, polarity);
                self.keys.insert(key.cell_style_name(), key);
            }
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    /// Cell styles in name order.
    pub fn cell_styles(&self) -> impl Iterator<Item = &StyleKey> {
        self.keys.values()
    }

    /// Data styles keyed by their own name.
    pub fn data_styles(&self) -> BTreeMap<String, StyleKey> {
        self.keys.values().map(|k| (k.data_style_name(), *k)).collect()
    }

    /// Decimals of every cash root that has both a POS and a NEG style.
    pub fn cash_pairs(&self) -> BTreeSet<u8> {
        self.keys
            .values()
            .filter(|k| k.kind == StyleKind::Cash && k.polarity == Some(Polarity::Positive))
            .map(|k| k.decimals)
            .filter(|&d| self.keys.contains_key(&StyleKey::cash(d, Polarity::Negative).cell_style_name()))
            .collect()
    }
}

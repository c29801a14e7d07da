//! Turn semantic style names into concrete ODF number and cell styles.
//!
//! Every definition is found by exact name or created; existing definitions
//! only get their missing pieces filled in. Running the pass twice leaves the
//! document unchanged.

use cashflow_core::style_name::cash_base_style;
use cashflow_core::{Locale, Polarity, StyleKey, StyleKind};

use super::registry::StyleRegistry;
use crate::xml::XmlElement;

const NEGATIVE_COLOR: &str = "#FF0000";
const PARENT_STYLE: &str = "Default";
const DEFAULT_STYLE_FAMILIES: [&str; 3] = ["paragraph", "text", "table-cell"];

/// What one materialization pass touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub data_styles: usize,
    pub cell_styles: usize,
    pub base_styles: usize,
    pub created: usize,
    pub paragraphs_added: usize,
}

/// Materialize every semantic style used by a table cell in `content`
/// into its `office:automatic-styles`, and give every cell a `text:p`.
pub fn materialize_styles(content: &mut XmlElement, locale: &Locale) -> MaterializeSummary {
    let mut summary = MaterializeSummary { paragraphs_added: ensure_paragraphs(content), ..Default::default() };
    let registry = StyleRegistry::scan(content);

    if !content.has_child("office:automatic-styles") {
        content.insert(0, XmlElement::new("office:automatic-styles"));
    }
    let auto = content.ensure_child("office:automatic-styles");

    for (name, key) in registry.data_styles() {
        let created = match (key.kind, key.polarity) {
            (StyleKind::Percentage, _) => ensure_percentage_style(auto, &name, key, locale),
            (StyleKind::Cash, Some(Polarity::Negative)) => ensure_negative_cash_style(auto, &name, key, locale),
            _ => ensure_number_style(auto, &name, key, locale),
        };
        summary.data_styles += 1;
        summary.created += usize::from(created);
    }

    for key in registry.cell_styles() {
        let created = ensure_cell_style(auto, key);
        summary.cell_styles += 1;
        summary.created += usize::from(created);
    }

    for decimals in registry.cash_pairs() {
        let created = ensure_cash_base_style(auto, decimals);
        summary.base_styles += 1;
        summary.created += usize::from(created);
    }

    log::info!(
        "styles materialized: {} data, {} cell, {} base ({} new), {} empty paragraph(s) added",
        summary.data_styles,
        summary.cell_styles,
        summary.base_styles,
        summary.created,
        summary.paragraphs_added
    );
    summary
}

/// Give every `table:table-cell` a `text:p` child. Returns how many were added.
pub fn ensure_paragraphs(root: &mut XmlElement) -> usize {
    let mut added = 0;
    root.walk_mut(&mut |e: &mut XmlElement| {
        if e.name == "table:table-cell" && !e.has_child("text:p") {
            e.push(XmlElement::new("text:p"));
            added += 1;
        }
    });
    added
}

/// Set the document default language on the paragraph, text and table-cell
/// default styles of a `styles.xml` root.
pub fn apply_default_language(styles: &mut XmlElement, locale: &Locale) {
    let office_styles = styles.ensure_child("office:styles");
    for family in DEFAULT_STYLE_FAMILIES {
        let (default_style, _) = office_styles.ensure_child_with("style:default-style", "style:family", family);
        let props = default_style.ensure_child("style:text-properties");
        props.set_attr("fo:language", locale.language.as_str());
        props.set_attr("fo:country", locale.country.as_str());
        props.set_attr("style:language-asian", locale.language.as_str());
        props.set_attr("style:country-asian", locale.country.as_str());
        props.set_attr("style:language-complex", locale.language.as_str());
        props.set_attr("style:country-complex", locale.country.as_str());
    }
    log::debug!("default language set to {locale}");
}

fn set_locale(style: &mut XmlElement, locale: &Locale) {
    style.set_attr_if_missing("number:language", locale.language.as_str());
    style.set_attr_if_missing("number:country", locale.country.as_str());
}

fn fill_number(number: &mut XmlElement, decimals: u8, grouping: bool) {
    let decimals = decimals.to_string();
    number.set_attr_if_missing("number:decimal-places", decimals.as_str());
    number.set_attr_if_missing("number:min-decimal-places", decimals.as_str());
    number.set_attr_if_missing("number:min-integer-digits", "1");
    if grouping {
        number.set_attr_if_missing("number:grouping", "true");
    }
}

fn literal(text: &str) -> XmlElement {
    XmlElement::new("number:text").with_text(text)
}

fn has_literal(style: &XmlElement, text: &str) -> bool {
    style.children_named("number:text").any(|t| t.text() == text)
}

fn ensure_number_style(auto: &mut XmlElement, name: &str, key: StyleKey, locale: &Locale) -> bool {
    let (style, created) = auto.ensure_child_with("number:number-style", "style:name", name);
    set_locale(style, locale);
    fill_number(style.ensure_child("number:number"), key.decimals, true);
    created
}

fn ensure_percentage_style(auto: &mut XmlElement, name: &str, key: StyleKey, locale: &Locale) -> bool {
    let (style, created) = auto.ensure_child_with("number:percentage-style", "style:name", name);
    set_locale(style, locale);
    fill_number(style.ensure_child("number:number"), key.decimals, false);
    if !style.has_child("number:text") {
        style.push(literal("%"));
    }
    created
}

/// `(1,234)`: the magnitude between literal parentheses, display factor -1.
fn ensure_negative_cash_style(auto: &mut XmlElement, name: &str, key: StyleKey, locale: &Locale) -> bool {
    let (style, created) = auto.ensure_child_with("number:number-style", "style:name", name);
    set_locale(style, locale);
    if created {
        style.push(literal("("));
    }
    let number = style.ensure_child("number:number");
    fill_number(number, key.decimals, true);
    number.set_attr("number:display-factor", "-1");

    if !has_literal(style, "(") {
        style.insert(0, literal("("));
    }
    if !has_literal(style, ")") {
        style.push(literal(")"));
    }
    created
}

fn ensure_cell_style(auto: &mut XmlElement, key: &StyleKey) -> bool {
    let (style, created) = auto.ensure_child_with("style:style", "style:name", &key.cell_style_name());
    init_cell_style(style);
    style.set_attr("style:data-style-name", key.data_style_name());
    if key.polarity == Some(Polarity::Negative) {
        style.ensure_child("style:text-properties").set_attr("fo:color", NEGATIVE_COLOR);
    }
    created
}

/// `CASH<d>_CELL` routes negative values to the NEG style and the rest to POS.
fn ensure_cash_base_style(auto: &mut XmlElement, decimals: u8) -> bool {
    let pos = StyleKey::cash(decimals, Polarity::Positive);
    let neg = StyleKey::cash(decimals, Polarity::Negative);
    let base = cash_base_style(decimals);

    let (style, created) = auto.ensure_child_with("style:style", "style:name", &base);
    init_cell_style(style);
    style.set_attr_if_missing("style:data-style-name", pos.data_style_name());

    style.retain_elements(|e| e.name != "style:map");
    style.push(
        XmlElement::new("style:map")
            .with_attr("style:condition", "value() < 0")
            .with_attr("style:apply-style-name", neg.cell_style_name()),
    );
    style.push(
        XmlElement::new("style:map")
            .with_attr("style:condition", "value() >= 0")
            .with_attr("style:apply-style-name", pos.cell_style_name()),
    );
    created
}

fn init_cell_style(style: &mut XmlElement) {
    style.set_attr_if_missing("style:family", "table-cell");
    style.set_attr_if_missing("style:parent-style-name", PARENT_STYLE);
    if !style.has_child("style:table-cell-properties") {
        style.insert(0, XmlElement::new("style:table-cell-properties"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    const CONTENT: &str = r#"<office:document-content><office:automatic-styles/><office:body><office:spreadsheet><table:table>
<table:table-row><table:table-cell table:style-name="CASH2_CELL" office:value="-5"/><table:table-cell table:style-name="PCT1_CELL"/>
<table:table-cell table:style-name="NUM0_CELL"><text:p>7</text:p></table:table-cell><table:table-cell/></table:table-row>
</table:table></office:spreadsheet></office:body></office:document-content>"#;

    fn auto(doc: &XmlElement) -> &XmlElement {
        doc.child("office:automatic-styles").unwrap()
    }

    fn named<'a>(auto: &'a XmlElement, tag: &str, name: &str) -> &'a XmlElement {
        auto.children_named(tag)
            .find(|e| e.attr("style:name") == Some(name))
            .unwrap_or_else(|| panic!("{tag} {name} missing"))
    }

    #[test]
    fn test_materialized_definitions() {
        let mut doc = xml::parse(CONTENT).unwrap();
        let summary = materialize_styles(&mut doc, &Locale::default());
        assert_eq!(summary.base_styles, 1);
        assert_eq!(summary.paragraphs_added, 3);
        let auto = auto(&doc);

        let neg = named(auto, "number:number-style", "CASH2_NEG_DS");
        let parts: Vec<_> = neg.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(parts, vec!["number:text", "number:number", "number:text"]);
        let number = neg.child("number:number").unwrap();
        assert_eq!(number.attr("number:display-factor"), Some("-1"));
        assert_eq!(number.attr("number:decimal-places"), Some("2"));
        assert_eq!(neg.attr("number:language"), Some("en"));
        assert_eq!(neg.attr("number:country"), Some("GB"));

        let pct = named(auto, "number:percentage-style", "PCT1_DS");
        assert_eq!(pct.child("number:text").map(|t| t.text()), Some("%".to_string()));
        assert_eq!(pct.child("number:number").and_then(|n| n.attr("number:grouping")), None);

        let neg_cell = named(auto, "style:style", "CASH2_NEG_CELL");
        assert_eq!(neg_cell.attr("style:data-style-name"), Some("CASH2_NEG_DS"));
        assert_eq!(neg_cell.attr("style:parent-style-name"), Some("Default"));
        assert_eq!(neg_cell.child("style:text-properties").and_then(|t| t.attr("fo:color")), Some("#FF0000"));
        assert!(named(auto, "style:style", "CASH2_POS_CELL").child("style:text-properties").is_none());

        let base = named(auto, "style:style", "CASH2_CELL");
        let maps: Vec<_> = base
            .children_named("style:map")
            .map(|m| (m.attr("style:condition").unwrap(), m.attr("style:apply-style-name").unwrap()))
            .collect();
        assert_eq!(maps, vec![("value() < 0", "CASH2_NEG_CELL"), ("value() >= 0", "CASH2_POS_CELL")]);
    }

    #[test]
    fn test_second_pass_is_byte_identical() {
        let mut doc = xml::parse(CONTENT).unwrap();
        materialize_styles(&mut doc, &Locale::default());
        let first = xml::write(&doc).unwrap();

        let mut again = xml::parse(std::str::from_utf8(&first).unwrap()).unwrap();
        let summary = materialize_styles(&mut again, &Locale::default());
        assert_eq!(summary.created, 0);
        assert_eq!(summary.paragraphs_added, 0);
        assert_eq!(xml::write(&again).unwrap(), first);
    }

    #[test]
    fn test_partial_definitions_are_completed() {
        let mut doc = xml::parse(
            r#"<office:document-content><office:automatic-styles><number:number-style style:name="CASH0_NEG_DS"><number:number number:decimal-places="0"/></number:number-style><style:style style:name="CASH0_NEG_CELL" style:family="table-cell"><style:map style:condition="x"/></style:style></office:automatic-styles><table:table-cell table:style-name="CASH0_NEG_CELL"/></office:document-content>"#,
        )
        .unwrap();
        let summary = materialize_styles(&mut doc, &Locale::parse("fr"));
        assert_eq!(summary.created, 0);

        let auto = auto(&doc);
        assert_eq!(auto.children_named("number:number-style").count(), 1);
        let ds = named(auto, "number:number-style", "CASH0_NEG_DS");
        assert_eq!(ds.elements().next().map(|e| e.text()), Some("(".to_string()));
        assert_eq!(ds.elements().last().map(|e| e.text()), Some(")".to_string()));
        assert_eq!(ds.attr("number:language"), Some("fr"));
        assert_eq!(ds.child("number:number").and_then(|n| n.attr("number:grouping")), Some("true"));

        let cell = named(auto, "style:style", "CASH0_NEG_CELL");
        assert_eq!(cell.attr("style:data-style-name"), Some("CASH0_NEG_DS"));
        // unrelated children of an existing style are left alone
        assert_eq!(cell.children_named("style:map").count(), 1);
    }

    #[test]
    fn test_missing_automatic_styles_created_first() {
        let mut doc = xml::parse(r#"<office:document-content><office:body/><table:table-cell table:style-name="NUM1_CELL"/></office:document-content>"#).unwrap();
        materialize_styles(&mut doc, &Locale::default());
        assert_eq!(doc.elements().next().map(|e| e.name.as_str()), Some("office:automatic-styles"));
    }

    #[test]
    fn test_default_language() {
        let mut styles = xml::parse(
            r#"<office:document-styles><office:styles><style:default-style style:family="table-cell"><style:text-properties fo:language="de"/></style:default-style></office:styles></office:document-styles>"#,
        )
        .unwrap();
        apply_default_language(&mut styles, &Locale::parse("fr-FR"));
        apply_default_language(&mut styles, &Locale::parse("fr-FR"));

        let office_styles = styles.child("office:styles").unwrap();
        let defaults: Vec<_> = office_styles.children_named("style:default-style").collect();
        assert_eq!(defaults.len(), 3);
        for d in defaults {
            let props = d.child("style:text-properties").unwrap();
            assert_eq!(props.attr("fo:language"), Some("fr"));
            assert_eq!(props.attr("style:country-complex"), Some("FR"));
        }
    }
}

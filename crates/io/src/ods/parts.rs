//! The package's secondary parts: styles, metadata, view settings, manifest.

use chrono::{DateTime, Utc};

use cashflow_engine::Sheet;

use super::{
    CONTENT_XML, META_XML, MIMETYPE, NS_CONFIG, NS_DC, NS_FO, NS_MANIFEST, NS_META, NS_NUMBER, NS_OFFICE, NS_STYLE,
    NS_TABLE, NS_TEXT, ODF_VERSION, SETTINGS_XML, STYLES_XML,
};
use crate::error::XmlError;
use crate::xml::{self, XmlElement};

pub const GENERATOR: &str = concat!("cashflow-ods/", env!("CARGO_PKG_VERSION"));

/// `styles.xml` with the `Default` cell style every generated style inherits.
pub fn styles_xml() -> Result<Vec<u8>, XmlError> {
    let default_cell = XmlElement::new("style:style")
        .with_attr("style:name", "Default")
        .with_attr("style:family", "table-cell");

    let doc = XmlElement::new("office:document-styles")
        .with_attr("xmlns:office", NS_OFFICE)
        .with_attr("xmlns:style", NS_STYLE)
        .with_attr("xmlns:text", NS_TEXT)
        .with_attr("xmlns:table", NS_TABLE)
        .with_attr("xmlns:number", NS_NUMBER)
        .with_attr("xmlns:fo", NS_FO)
        .with_attr("office:version", ODF_VERSION)
        .with_child(XmlElement::new("office:styles").with_child(default_cell))
        .with_child(XmlElement::new("office:automatic-styles"))
        .with_child(XmlElement::new("office:master-styles"));
    xml::write(&doc)
}

pub fn meta_xml(title: &str, language: &str, created: DateTime<Utc>) -> Result<Vec<u8>, XmlError> {
    let stamp = created.format("%Y-%m-%dT%H:%M:%S").to_string();
    let meta = XmlElement::new("office:meta")
        .with_child(XmlElement::new("meta:generator").with_text(GENERATOR))
        .with_child(XmlElement::new("dc:title").with_text(title))
        .with_child(XmlElement::new("dc:language").with_text(language))
        .with_child(XmlElement::new("meta:creation-date").with_text(stamp.as_str()))
        .with_child(XmlElement::new("dc:date").with_text(stamp.as_str()));

    let doc = XmlElement::new("office:document-meta")
        .with_attr("xmlns:office", NS_OFFICE)
        .with_attr("xmlns:meta", NS_META)
        .with_attr("xmlns:dc", NS_DC)
        .with_attr("office:version", ODF_VERSION)
        .with_child(meta);
    xml::write(&doc)
}

/// View settings. Frozen rows become a vertical split below the header.
pub fn settings_xml(sheet: &Sheet) -> Result<Vec<u8>, XmlError> {
    let mut view = XmlElement::new("config:config-item-map-entry")
        .with_child(config_item("ViewId", "string", "view1"))
        .with_child(config_item("ActiveTable", "string", sheet.name.as_str()));

    if sheet.frozen_rows > 0 {
        let rows = sheet.frozen_rows.to_string();
        let entry = XmlElement::new("config:config-item-map-entry")
            .with_attr("config:name", sheet.name.as_str())
            .with_child(config_item("HorizontalSplitMode", "short", "0"))
            .with_child(config_item("VerticalSplitMode", "short", "2"))
            .with_child(config_item("VerticalSplitPosition", "int", &rows))
            .with_child(config_item("ActiveSplitRange", "short", "2"))
            .with_child(config_item("PositionTop", "int", "0"))
            .with_child(config_item("PositionBottom", "int", &rows));
        view.push(XmlElement::new("config:config-item-map-named").with_attr("config:name", "Tables").with_child(entry));
    }

    let views = XmlElement::new("config:config-item-map-indexed").with_attr("config:name", "Views").with_child(view);
    let settings = XmlElement::new("office:settings").with_child(
        XmlElement::new("config:config-item-set").with_attr("config:name", "ooo:view-settings").with_child(views),
    );

    let doc = XmlElement::new("office:document-settings")
        .with_attr("xmlns:office", NS_OFFICE)
        .with_attr("xmlns:config", NS_CONFIG)
        .with_attr("office:version", ODF_VERSION)
        .with_child(settings);
    xml::write(&doc)
}

pub fn manifest_xml() -> Result<Vec<u8>, XmlError> {
    let mut doc = XmlElement::new("manifest:manifest")
        .with_attr("xmlns:manifest", NS_MANIFEST)
        .with_attr("manifest:version", ODF_VERSION)
        .with_child(file_entry("/", MIMETYPE).with_attr("manifest:version", ODF_VERSION));
    for part in [CONTENT_XML, STYLES_XML, META_XML, SETTINGS_XML] {
        doc.push(file_entry(part, "text/xml"));
    }
    xml::write(&doc)
}

fn config_item(name: &str, kind: &str, value: &str) -> XmlElement {
    XmlElement::new("config:config-item")
        .with_attr("config:name", name)
        .with_attr("config:type", kind)
        .with_text(value)
}

fn file_entry(path: &str, media_type: &str) -> XmlElement {
    XmlElement::new("manifest:file-entry")
        .with_attr("manifest:full-path", path)
        .with_attr("manifest:media-type", media_type)
}

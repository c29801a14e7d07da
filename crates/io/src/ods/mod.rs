//! OpenDocument spreadsheet parts and packaging.

pub mod content;
pub mod package;
pub mod parts;

pub use content::{content_document, content_xml};
pub use package::OdsPackage;

pub const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";
pub const ODF_VERSION: &str = "1.2";

pub const CONTENT_XML: &str = "content.xml";
pub const STYLES_XML: &str = "styles.xml";
pub const META_XML: &str = "meta.xml";
pub const SETTINGS_XML: &str = "settings.xml";
pub const MANIFEST_XML: &str = "META-INF/manifest.xml";

pub const NS_OFFICE: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
pub const NS_STYLE: &str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";
pub const NS_TEXT: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
pub const NS_TABLE: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
pub const NS_NUMBER: &str = "urn:oasis:names:tc:opendocument:xmlns:datastyle:1.0";
pub const NS_FO: &str = "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0";
pub const NS_CONFIG: &str = "urn:oasis:names:tc:opendocument:xmlns:config:1.0";
pub const NS_META: &str = "urn:oasis:names:tc:opendocument:xmlns:meta:1.0";
pub const NS_OF: &str = "urn:oasis:names:tc:opendocument:xmlns:of:1.2";
pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_MANIFEST: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

/// Prefix of OpenFormula expressions in `table:formula`.
pub const FORMULA_PREFIX: &str = "of:=";

/// `office:value` text for a number; negative zero is written as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(-4321.0), "-4321");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(1500.5), "1500.5");
    }
}

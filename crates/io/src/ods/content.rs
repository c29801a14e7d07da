//! `content.xml` for a single statement sheet.

use cashflow_engine::{Cell, CellContent, Row, Sheet};

use super::{format_number, FORMULA_PREFIX, NS_FO, NS_NUMBER, NS_OF, NS_OFFICE, NS_STYLE, NS_TABLE, NS_TEXT, ODF_VERSION};
use crate::error::XmlError;
use crate::xml::{self, XmlElement};

/// Serialized `content.xml`.
pub fn content_xml(sheet: &Sheet) -> Result<Vec<u8>, XmlError> {
    xml::write(&content_document(sheet))
}

/// The `office:document-content` tree. Formula cells carry a `0`
/// placeholder value until the value cache fills them in.
pub fn content_document(sheet: &Sheet) -> XmlElement {
    let mut table = XmlElement::new("table:table").with_attr("table:name", sheet.name.as_str());
    for column in columns(sheet) {
        table.push(column);
    }
    for row in &sheet.rows {
        table.push(row_element(row));
    }

    XmlElement::new("office:document-content")
        .with_attr("xmlns:office", NS_OFFICE)
        .with_attr("xmlns:style", NS_STYLE)
        .with_attr("xmlns:text", NS_TEXT)
        .with_attr("xmlns:table", NS_TABLE)
        .with_attr("xmlns:number", NS_NUMBER)
        .with_attr("xmlns:fo", NS_FO)
        .with_attr("xmlns:of", NS_OF)
        .with_attr("office:version", ODF_VERSION)
        .with_child(XmlElement::new("office:automatic-styles"))
        .with_child(
            XmlElement::new("office:body")
                .with_child(XmlElement::new("office:spreadsheet").with_child(table)),
        )
}

/// Column definitions, runs of equal visibility collapsed into one element.
fn columns(sheet: &Sheet) -> Vec<XmlElement> {
    let widest_hidden = sheet.hidden_columns.iter().copied().max().unwrap_or(0);
    let count = sheet.column_count().max(widest_hidden).max(1);

    let mut out = Vec::new();
    let mut col = 1;
    while col <= count {
        let hidden = sheet.hidden_columns.contains(&col);
        let mut run = 1;
        while col + run <= count && sheet.hidden_columns.contains(&(col + run)) == hidden {
            run += 1;
        }

        let mut element = XmlElement::new("table:table-column").with_attr("table:default-cell-style-name", "Default");
        if run > 1 {
            element.set_attr("table:number-columns-repeated", run.to_string());
        }
        if hidden {
            element.set_attr("table:visibility", "collapse");
        }
        out.push(element);
        col += run;
    }
    out
}

fn row_element(row: &Row) -> XmlElement {
    let mut element = XmlElement::new("table:table-row");
    if row.cells.is_empty() {
        element.push(XmlElement::new("table:table-cell"));
    }
    for cell in &row.cells {
        element.push(cell_element(cell));
    }
    element
}

fn cell_element(cell: &Cell) -> XmlElement {
    let mut element = XmlElement::new("table:table-cell");
    if let Some(style) = &cell.style {
        element.set_attr("table:style-name", style.as_str());
    }

    match &cell.content {
        CellContent::Empty => {}
        CellContent::Text(text) => {
            element.set_attr("office:value-type", "string");
            element.push(XmlElement::new("text:p").with_text(text.as_str()));
        }
        CellContent::Number(value) => {
            element.set_attr("office:value-type", "float");
            element.set_attr("office:value", format_number(*value));
        }
        CellContent::Formula(formula) => {
            element.set_attr("table:formula", format!("{FORMULA_PREFIX}{formula}"));
            element.set_attr("office:value-type", "float");
            element.set_attr("office:value", "0");
        }
    }
    element
}

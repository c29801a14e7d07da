//! End-to-end export: build the statement, package it, then post-process
//! the package so it opens with real styles and cached values.

use std::path::{Path, PathBuf};

use cashflow_core::{Diagnostics, Locale, Translate};
use cashflow_engine::{build_cash_statement, ReportOptions, Repository, Sheet, SHEET_NAME};
use chrono::{DateTime, Utc};

use crate::error::{ExportError, Result, XmlError};
use crate::ods::parts::{manifest_xml, meta_xml, settings_xml, styles_xml};
use crate::ods::{content_xml, OdsPackage, CONTENT_XML, MANIFEST_XML, META_XML, SETTINGS_XML, STYLES_XML};
use crate::styles::{apply_default_language, materialize_styles};
use crate::value_cache::cache_formula_values;
use crate::xml::{self, XmlElement};

/// A finished document and everything worth telling the caller about it.
#[derive(Debug)]
pub struct ExportedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub diagnostics: Diagnostics,
}

impl ExportedReport {
    /// Write the document into `dir` under its own file name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// `Cash_Flow_YYYYMMDD_HHMMSS.ods` for the report time, in UTC.
pub fn report_filename(as_of: DateTime<Utc>) -> String {
    format!("Cash_Flow_{}.ods", as_of.format("%Y%m%d_%H%M%S"))
}

pub fn export_cash_statement(
    repo: &dyn Repository,
    translator: &dyn Translate,
    options: &ReportOptions,
    locale: &Locale,
) -> Result<ExportedReport> {
    let built = build_cash_statement(repo, translator, options)?;
    let mut diagnostics = built.diagnostics;

    let raw = write_package(&built.sheet, locale, options.as_of)?.to_bytes()?;
    let bytes = finalize_package(&raw, locale, &mut diagnostics)?;

    log::info!("export finished with {} diagnostic(s)", diagnostics.len());
    Ok(ExportedReport { filename: report_filename(options.as_of), bytes, diagnostics })
}

/// Package a sheet as-is: formulas carry placeholder values and cells
/// reference styles that are not defined yet.
pub fn write_package(sheet: &Sheet, locale: &Locale, created: DateTime<Utc>) -> Result<OdsPackage> {
    let mut package = OdsPackage::new();
    package.set(MANIFEST_XML, manifest_xml().map_err(|e| ExportError::xml(MANIFEST_XML, e))?);
    package.set(CONTENT_XML, content_xml(sheet).map_err(|e| ExportError::xml(CONTENT_XML, e))?);
    package.set(STYLES_XML, styles_xml().map_err(|e| ExportError::xml(STYLES_XML, e))?);
    package.set(
        META_XML,
        meta_xml(SHEET_NAME, &locale.tag(), created).map_err(|e| ExportError::xml(META_XML, e))?,
    );
    package.set(SETTINGS_XML, settings_xml(sheet).map_err(|e| ExportError::xml(SETTINGS_XML, e))?);
    Ok(package)
}

/// Define every semantic style the content uses, cache formula values and
/// stamp the document language. Works on any spreadsheet container, and
/// running it twice gives the same bytes as running it once.
pub fn finalize_package(bytes: &[u8], locale: &Locale, diagnostics: &mut Diagnostics) -> Result<Vec<u8>> {
    let mut package = OdsPackage::from_bytes(bytes)?;

    let mut content = read_part(&package, CONTENT_XML, "office:document-content")?;
    materialize_styles(&mut content, locale);
    cache_formula_values(&mut content, diagnostics);
    // restamped cells may name variants the first pass never saw
    materialize_styles(&mut content, locale);
    package.set(CONTENT_XML, xml::write(&content).map_err(|e| ExportError::xml(CONTENT_XML, e))?);

    if package.get(STYLES_XML).is_some() {
        let mut styles = read_part(&package, STYLES_XML, "office:document-styles")?;
        apply_default_language(&mut styles, locale);
        package.set(STYLES_XML, xml::write(&styles).map_err(|e| ExportError::xml(STYLES_XML, e))?);
    }

    package.to_bytes()
}

fn read_part(package: &OdsPackage, part: &str, root: &'static str) -> Result<XmlElement> {
    let doc = xml::parse(package.text(part)?).map_err(|e| ExportError::xml(part, e))?;
    if doc.name != root {
        return Err(ExportError::xml(part, XmlError::UnexpectedRoot { expected: root, found: doc.name }));
    }
    Ok(doc)
}

//! Zip container with the `mimetype` entry first and uncompressed.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::MIMETYPE;
use crate::error::{ExportError, Result};

const MIMETYPE_ENTRY: &str = "mimetype";

/// Ordered set of named parts. The `mimetype` entry is implicit.
#[derive(Clone, Debug, Default)]
pub struct OdsPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl OdsPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every file entry of an existing container.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut package = Self::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() || file.name() == MIMETYPE_ENTRY {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            package.parts.push((name, data));
        }
        log::debug!("read container with {} part(s)", package.parts.len());
        Ok(package)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, data)| data.as_slice())
    }

    /// Part as UTF-8 text; a missing or non-UTF-8 part is a container error.
    pub fn text(&self, name: &str) -> Result<&str> {
        let data = self.get(name).ok_or_else(|| ExportError::MissingPart(name.to_string()))?;
        std::str::from_utf8(data).map_err(|_| ExportError::MissingPart(format!("{name} (not UTF-8)")))
    }

    /// Insert or replace a part, keeping the original position on replace.
    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Serialize: `mimetype` stored first, every other part deflated.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(MIMETYPE_ENTRY, stored)?;
        writer.write_all(MIMETYPE.as_bytes())?;

        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), deflated)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

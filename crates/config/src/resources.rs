// Translation resources
// JSON files named <locale>.json mapping label keys to text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cashflow_core::{Locale, Translate};

use crate::error::{ConfigError, Result};

/// Environment variable naming a directory of `<locale>.json` files.
pub const LOCALES_DIR_ENV: &str = "CASHFLOW_LOCALES_DIR";

/// Used when no resource exists for the requested locale.
pub const FALLBACK_LOCALE: &str = "en-GB";

const EMBEDDED: &[(&str, &str)] = &[
    ("en-GB", include_str!("locales/en-GB.json")),
    ("fr-FR", include_str!("locales/fr-FR.json")),
];

/// Where a loaded resource came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOrigin {
    File(PathBuf),
    Embedded(&'static str),
    /// Nothing found; every key translates to itself
    None,
}

#[derive(Debug, Clone)]
pub struct ResourceManager {
    locale: String,
    origin: ResourceOrigin,
    strings: HashMap<String, String>,
}

impl ResourceManager {
    /// Directories searched for resource files, most specific first:
    /// the explicit override, then `CASHFLOW_LOCALES_DIR`, then the user
    /// config directory.
    pub fn search_dirs(dir_override: Option<&Path>) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(dir) = dir_override {
            dirs.push(dir.to_path_buf());
        }
        if let Some(dir) = std::env::var_os(LOCALES_DIR_ENV).filter(|v| !v.is_empty()) {
            dirs.push(PathBuf::from(dir));
        }
        if let Some(config) = dirs::config_dir() {
            dirs.push(config.join("cashflow").join("locales"));
        }
        dirs
    }

    pub fn load(locale: &Locale, dir_override: Option<&Path>) -> Result<Self> {
        Self::load_from(locale, &Self::search_dirs(dir_override))
    }

    /// Resolve `locale` against `dirs`, then the embedded set, then the
    /// same two places for the fallback locale.
    pub fn load_from(locale: &Locale, dirs: &[PathBuf]) -> Result<Self> {
        let tag = locale.tag();
        let mut wanted = vec![tag.clone()];
        if tag != FALLBACK_LOCALE {
            wanted.push(FALLBACK_LOCALE.to_string());
        }

        for name in wanted {
            for dir in dirs {
                let path = dir.join(format!("{name}.json"));
                if path.is_file() {
                    let text = std::fs::read_to_string(&path)
                        .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
                    let strings = parse_resource(&path.display().to_string(), &text)?;
                    log::debug!("translations for {tag} from {}", path.display());
                    return Ok(Self { locale: tag, origin: ResourceOrigin::File(path), strings });
                }
            }
            if let Some(&(embedded, text)) = EMBEDDED.iter().find(|(n, _)| *n == name) {
                let strings = parse_resource(embedded, text)?;
                log::debug!("translations for {tag} from embedded {embedded}");
                return Ok(Self { locale: tag, origin: ResourceOrigin::Embedded(embedded), strings });
            }
        }

        log::warn!("no translations found for {tag}; labels will show their keys");
        Ok(Self { locale: tag, origin: ResourceOrigin::None, strings: HashMap::new() })
    }

    /// Embedded resources only.
    pub fn embedded(locale: &Locale) -> Result<Self> {
        Self::load_from(locale, &[])
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn origin(&self) -> &ResourceOrigin {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Translate for ResourceManager {
    fn translate(&self, key: &str) -> String {
        self.strings.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

fn parse_resource(name: &str, text: &str) -> Result<HashMap<String, String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    serde_json::from_str(text).map_err(|e| ConfigError::Resource { name: name.to_string(), message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_locales() {
        let en = ResourceManager::embedded(&Locale::default()).unwrap();
        assert_eq!(en.origin(), &ResourceOrigin::Embedded("en-GB"));
        assert_eq!(en.translate("TextTotals"), "Totals");
        assert_eq!(en.translate("TextUnknown"), "TextUnknown");

        // file carries a BOM
        let fr = ResourceManager::embedded(&Locale::parse("france")).unwrap();
        assert_eq!(fr.locale(), "fr-FR");
        assert_eq!(fr.translate("TextTotals"), "Totaux");
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let de = ResourceManager::embedded(&Locale::parse("de")).unwrap();
        assert_eq!(de.locale(), "de-DE");
        assert_eq!(de.origin(), &ResourceOrigin::Embedded("en-GB"));
        assert_eq!(de.translate("TextCode"), "Code");
    }

    #[test]
    fn test_directory_wins_over_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en-GB.json"), "\u{feff}{\"TextTotals\": \"Sum\"}").unwrap();
        let dirs = vec![dir.path().join("missing"), dir.path().to_path_buf()];

        let en = ResourceManager::load_from(&Locale::default(), &dirs).unwrap();
        assert_eq!(en.translate("TextTotals"), "Sum");
        assert_eq!(en.origin(), &ResourceOrigin::File(dir.path().join("en-GB.json")));

        // the requested locale's embedded file beats a fallback on disk
        let fr = ResourceManager::load_from(&Locale::parse("fr-FR"), &dirs).unwrap();
        assert_eq!(fr.translate("TextTotals"), "Totaux");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("es-ES.json"), "{not json").unwrap();
        let err = ResourceManager::load_from(&Locale::parse("es"), &[dir.path().to_path_buf()]);
        assert!(matches!(err, Err(ConfigError::Resource { .. })));
    }

    #[test]
    fn test_override_dir_searched_first() {
        let dirs = ResourceManager::search_dirs(Some(Path::new("/tmp/override")));
        assert_eq!(dirs[0], PathBuf::from("/tmp/override"));
    }
}

//! Locale value type used for number-format rules and resource lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A language/country pair such as `en`/`GB`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    pub language: String,
    pub country: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self { language: "en".to_string(), country: "GB".to_string() }
    }
}

impl Locale {
    /// Normalize a user-supplied locale string.
    ///
    /// Accepts `fr-FR`, `fr_FR`, `fr` and a few country-name aliases
    /// (`france`, `germany`, `spain`, `united kingdom`, `uk`). A bare
    /// language gets its usual country. Empty input yields `en-GB`.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        let aliased = match trimmed.to_ascii_lowercase().as_str() {
            "france" => "fr-FR".to_string(),
            "germany" => "de-DE".to_string(),
            "spain" => "es-ES".to_string(),
            "united kingdom" | "uk" => "en-GB".to_string(),
            _ => trimmed.replace('_', "-"),
        };

        match aliased.split_once('-') {
            Some((lang, country)) => Self {
                language: lang.to_ascii_lowercase(),
                country: country.to_ascii_uppercase(),
            },
            None => {
                let language = aliased.to_ascii_lowercase();
                let country = match language.as_str() {
                    "en" => "GB".to_string(),
                    "fr" => "FR".to_string(),
                    "de" => "DE".to_string(),
                    "es" => "ES".to_string(),
                    other => other.to_ascii_uppercase(),
                };
                Self { language, country }
            }
        }
    }

    /// Resource tag, e.g. `en-GB`.
    pub fn tag(&self) -> String {
        format!("{}-{}", self.language, self.country)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.language, self.country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(input: &str) -> (String, String) {
        let l = Locale::parse(input);
        (l.language, l.country)
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(pair("fr-FR"), ("fr".into(), "FR".into()));
        assert_eq!(pair("fr_ca"), ("fr".into(), "CA".into()));
        assert_eq!(pair("DE"), ("de".into(), "DE".into()));
        assert_eq!(pair("en"), ("en".into(), "GB".into()));
        assert_eq!(pair("it"), ("it".into(), "IT".into()));
        assert_eq!(pair(""), ("en".into(), "GB".into()));
        assert_eq!(pair("   "), ("en".into(), "GB".into()));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Locale::parse("France").tag(), "fr-FR");
        assert_eq!(Locale::parse("UK").tag(), "en-GB");
        assert_eq!(Locale::parse("united kingdom").tag(), "en-GB");
        assert_eq!(Locale::parse("spain").to_string(), "es-ES");
    }
}

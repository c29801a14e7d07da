use std::collections::HashMap;

/// Localized label lookup. Implementations return the key itself when no
/// translation exists, so a missing resource never blanks a label.
pub trait Translate {
    fn translate(&self, key: &str) -> String;
}

impl Translate for HashMap<String, String> {
    fn translate(&self, key: &str) -> String {
        self.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

/// Returns every key unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeysOnly;

impl Translate for KeysOnly {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

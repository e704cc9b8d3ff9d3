/// Menu label translation lookup

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Translator {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub strings: HashMap<String, String>,
}

impl Translator {
    pub fn new(language: Option<&str>) -> Self {
        Translator {
            language: language.map(str::to_string),
            strings: HashMap::new(),
        }
    }

    pub fn insert(&mut self, original: &str, translated: &str) -> &mut Self {
        self.strings.insert(original.to_string(), translated.to_string());
        self
    }

    pub fn lookup(&self, original: &str) -> Option<&str> {
        self.strings.get(original).map(String::as_str)
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// The translated text, or the original when there is none.
    pub fn translate<'a>(&'a self, original: &'a str) -> &'a str {
        self.lookup(original).unwrap_or(original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_falls_back_to_original() {
        let mut translator = Translator::new(Some("french"));
        translator.insert("Yes", "Oui");

        assert_eq!(translator.translate("Yes"), "Oui");
        assert_eq!(translator.translate("No"), "No");
        assert_eq!(translator.lookup("No"), None);
        assert_eq!(translator.language(), Some("french"));
        assert_eq!(translator.len(), 1);
    }
}

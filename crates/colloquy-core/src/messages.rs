//! Message catalog and text resolution.
//!
//! Messages are keyed per language; patterns interpolate `#{key}` references
//! against the call's message data. The engine treats the catalog as opaque:
//! an unresolved key is simply used verbatim.

use std::collections::HashMap;

use serde_json::Value as Json;

/// Per-language message dictionary.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    languages: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message pattern for a language.
    pub fn insert(
        &mut self,
        language: impl Into<String>,
        key: impl Into<String>,
        pattern: impl Into<String>,
    ) {
        self.languages
            .entry(language.into())
            .or_default()
            .insert(key.into(), pattern.into());
    }

    /// Look up a raw pattern.
    pub fn resolve(&self, language: &str, key: &str) -> Option<&str> {
        let messages = match self.languages.get(language) {
            Some(messages) => messages,
            None => {
                tracing::warn!(language, "language not in message catalog");
                return None;
            }
        };
        messages.get(key).map(String::as_str)
    }

    /// True when the catalog defines the key for the language.
    pub fn has_message(&self, language: &str, key: &str) -> bool {
        self.languages
            .get(language)
            .is_some_and(|messages| messages.contains_key(key))
    }
}

/// Interpolate `#{key}` references in a pattern against message data.
///
/// Unknown keys render as empty; array values join with `", "`.
pub fn resolve_text(pattern: &str, data: &Json) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("#{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                out.push_str(&render_fragment(data.get(key)));
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_fragment(value: Option<&Json>) -> String {
    match value {
        None | Some(Json::Null) => String::new(),
        Some(Json::String(s)) => s.clone(),
        Some(Json::Array(items)) => items
            .iter()
            .map(|item| render_fragment(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_pattern_passes_through() {
        assert_eq!(resolve_text("hello", &json!({})), "hello");
    }

    #[test]
    fn test_interpolation_renders_strings_and_numbers() {
        let data = json!({ "name": "Homer", "age": 39 });
        assert_eq!(
            resolve_text("#{name} is #{age}", &data),
            "Homer is 39"
        );
    }

    #[test]
    fn test_arrays_join_with_commas() {
        let data = json!({ "items": ["tea", "coffee"] });
        assert_eq!(resolve_text("pick: #{items}", &data), "pick: tea, coffee");
    }

    #[test]
    fn test_catalog_lookup_per_language() {
        let mut catalog = MessageCatalog::new();
        catalog.insert("en_US", "greet", "Hi #{name}!");
        assert_eq!(catalog.resolve("en_US", "greet"), Some("Hi #{name}!"));
        assert_eq!(catalog.resolve("fr_CA", "greet"), None);
        assert!(catalog.has_message("en_US", "greet"));
        assert!(!catalog.has_message("en_US", "missing"));
    }
}

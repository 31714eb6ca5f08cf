//! Intent matching for reactor conditions.
//!
//! Deliberately crude: pre-parsed intents win, then exact text, then keyword
//! containment from the catalog. Real language understanding lives outside
//! the engine.

use std::collections::HashMap;

use serde_json::{json, Value as Json};

use crate::event::Utterance;
use crate::value::Value;

/// A keyword-defined intent.
#[derive(Debug, Clone)]
pub struct IntentDef {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Catalog of intents for one deployment; constructed at startup and carried
/// on the conversation handle.
#[derive(Debug, Clone, Default)]
pub struct IntentCatalog {
    intents: HashMap<String, IntentDef>,
}

impl IntentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intent matched by any of the given keywords.
    pub fn define(&mut self, name: impl Into<String>, keywords: Vec<String>) {
        let name = name.into();
        self.intents.insert(
            name.clone(),
            IntentDef {
                name,
                keywords,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&IntentDef> {
        self.intents.get(name)
    }

    /// Match an utterance against a named intent.
    ///
    /// Order: pre-parsed intents by name; exact text match (`#`-prefixed
    /// texts are coded requests, never intents); keyword containment when the
    /// catalog defines the intent.
    pub fn match_utterance(&self, utterance: &Utterance, name: &str) -> Option<Value> {
        if !utterance.intents.is_empty() {
            return utterance
                .intents
                .iter()
                .find(|intent| intent.name == name)
                .map(|intent| intent_match(name, &utterance.text, None));
        }

        let text = utterance.text.trim();
        if text.starts_with('#') {
            return None;
        }
        if text == name {
            return Some(intent_match(name, text, None));
        }

        let def = self.get(name)?;
        let lowered = text.to_lowercase();
        let keyword = def
            .keywords
            .iter()
            .find(|kw| contains_keyword(&lowered, kw))?;
        Some(intent_match(name, text, Some(keyword)))
    }
}

fn intent_match(name: &str, text: &str, keyword: Option<&str>) -> Value {
    let mut data = json!({ "intent": name, "text": text });
    if let Some(keyword) = keyword {
        data["keyword"] = Json::String(keyword.to_string());
    }
    Value::Data(data)
}

/// Word-boundary containment; a keyword may span multiple words.
fn contains_keyword(text: &str, keyword: &str) -> bool {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(keyword) {
        let start = search_from + offset;
        let end = start + keyword.len();
        let boundary_before =
            start == 0 || text[..start].chars().next_back() == Some(' ');
        let boundary_after = end == text.len() || text[end..].starts_with(' ');
        if boundary_before && boundary_after {
            return true;
        }
        search_from = start + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_text_matches_without_catalog_entry() {
        let catalog = IntentCatalog::new();
        let utterance = Utterance::from_text("help");
        assert!(catalog.match_utterance(&utterance, "help").is_some());
        assert!(catalog.match_utterance(&utterance, "stop").is_none());
    }

    #[test]
    fn test_coded_requests_never_match() {
        let catalog = IntentCatalog::new();
        let utterance = Utterance::from_text("#help");
        assert!(catalog.match_utterance(&utterance, "#help").is_none());
    }

    #[test]
    fn test_keyword_match_honors_word_boundaries() {
        let mut catalog = IntentCatalog::new();
        catalog.define("balance", vec!["account balance".to_string()]);
        let hit = Utterance::from_text("show my account balance please");
        let miss = Utterance::from_text("rebalance my portfolio");
        assert!(catalog.match_utterance(&hit, "balance").is_some());
        assert!(catalog.match_utterance(&miss, "balance").is_none());
    }

    #[test]
    fn test_preparsed_intent_wins_over_text() {
        let catalog = IntentCatalog::new();
        let mut utterance = Utterance::from_text("whatever");
        utterance.intents.push(crate::event::ParsedIntent {
            name: "help".to_string(),
            entities: Vec::new(),
            confidence: 1.0,
        });
        assert!(catalog.match_utterance(&utterance, "help").is_some());
    }
}

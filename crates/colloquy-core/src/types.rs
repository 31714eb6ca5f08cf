//! Entity types - parse raw text into typed values.
//!
//! The catalog is an explicit object constructed at startup and carried on
//! the conversation handle; nothing here is process-global.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::value::Entity;

/// Type name reserved for structural (non-fillable) slots.
pub const COMPOSITE: &str = "composite";

type Parser = Arc<dyn Fn(&str) -> Option<Json> + Send + Sync>;

/// Admissible answers for a type, used for menus and slot descriptions.
#[derive(Clone, Debug)]
pub enum Choices {
    /// Flat list of accepted values
    List(Vec<String>),
    /// Canonical value -> accepted synonyms, in declaration order
    Synonyms(Vec<(String, Vec<String>)>),
}

impl Choices {
    /// Human-facing labels: list entries, or the first synonym per value.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::List(values) => values.clone(),
            Self::Synonyms(groups) => groups
                .iter()
                .filter_map(|(_, names)| names.first().cloned())
                .collect(),
        }
    }
}

/// A named entity type with a parser and optional choice description.
#[derive(Clone)]
pub struct EntityType {
    name: String,
    parser: Parser,
    choices: Option<Choices>,
}

impl EntityType {
    /// Define a type from a parser function.
    pub fn new(
        name: impl Into<String>,
        parser: impl Fn(&str) -> Option<Json> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parser: Arc::new(parser),
            choices: None,
        }
    }

    /// Define a type accepting a fixed list of values, case-insensitively.
    pub fn from_list(name: impl Into<String>, values: Vec<String>) -> Self {
        let lowered: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();
        let mut entity_type = Self::new(name, move |text| {
            let candidate = text.to_lowercase();
            lowered
                .contains(&candidate)
                .then(|| Json::String(candidate))
        });
        entity_type.choices = Some(Choices::List(values));
        entity_type
    }

    /// Define a type mapping synonym groups to canonical values.
    pub fn from_synonyms(name: impl Into<String>, groups: Vec<(String, Vec<String>)>) -> Self {
        let table = groups.clone();
        let mut entity_type = Self::new(name, move |text| {
            let candidate = text.to_lowercase();
            table
                .iter()
                .find(|(_, names)| names.iter().any(|n| n == &candidate))
                .map(|(canonical, _)| Json::String(canonical.clone()))
        });
        entity_type.choices = Some(Choices::Synonyms(groups));
        entity_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for the catch-all `any` type.
    pub fn is_any(&self) -> bool {
        self.name == "any"
    }

    pub fn choices(&self) -> Option<&Choices> {
        self.choices.as_ref()
    }

    /// Parse trimmed text into an entity of this type.
    pub fn parse(&self, text: &str) -> Option<Entity> {
        let trimmed = text.trim();
        let value = (self.parser)(trimmed)?;
        Some(Entity::new(trimmed, value, self.name.clone()))
    }
}

impl std::fmt::Debug for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Catalog of entity types for one deployment.
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<String, Arc<EntityType>>,
}

impl TypeCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-loaded with the standard types: `any`, `notnull`,
    /// `yes_no`, `int`.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.define(EntityType::new("any", |text| {
            Some(Json::String(text.to_string()))
        }));
        catalog.define(EntityType::new("notnull", |text| {
            (!text.is_empty()).then(|| Json::String(text.to_string()))
        }));
        catalog.define(EntityType::from_synonyms(
            "yes_no",
            vec![
                (
                    "yes".to_string(),
                    vec!["y".to_string(), "yes".to_string(), "ok".to_string()],
                ),
                (
                    "no".to_string(),
                    vec!["n".to_string(), "no".to_string(), "nope".to_string()],
                ),
            ],
        ));
        catalog.define(EntityType::new("int", |text| {
            text.parse::<i64>().ok().map(Json::from)
        }));
        catalog
    }

    /// Add or replace a type definition.
    pub fn define(&mut self, entity_type: EntityType) -> Arc<EntityType> {
        let entry = Arc::new(entity_type);
        self.types.insert(entry.name().to_string(), entry.clone());
        entry
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<Arc<EntityType>> {
        self.types.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_parses_trimmed_and_negative() {
        let catalog = TypeCatalog::standard();
        let int = catalog.get("int").unwrap();
        assert_eq!(int.parse("  25  ").unwrap().value, json!(25));
        assert_eq!(int.parse("-10").unwrap().value, json!(-10));
        assert!(int.parse("aaa").is_none());
        assert!(int.parse("").is_none());
    }

    #[test]
    fn test_yes_no_maps_synonyms_case_insensitively() {
        let catalog = TypeCatalog::standard();
        let yes_no = catalog.get("yes_no").unwrap();
        assert_eq!(yes_no.parse("Y").unwrap().value, json!("yes"));
        assert_eq!(yes_no.parse("ok").unwrap().value, json!("yes"));
        assert_eq!(yes_no.parse("Nope").unwrap().value, json!("no"));
        assert!(yes_no.parse("maybe").is_none());
    }

    #[test]
    fn test_notnull_rejects_blank_input() {
        let catalog = TypeCatalog::standard();
        let notnull = catalog.get("notnull").unwrap();
        assert!(notnull.parse("   ").is_none());
        assert!(notnull.parse("x").is_some());
    }

    #[test]
    fn test_list_type_exposes_choice_labels() {
        let recipients = EntityType::from_list(
            "recipient",
            vec!["bart".to_string(), "lisa".to_string()],
        );
        assert_eq!(recipients.parse("Bart").unwrap().value, json!("bart"));
        assert_eq!(recipients.choices().unwrap().labels(), vec!["bart", "lisa"]);
    }
}

//! Values flowing between actions.
//!
//! A step's success value is either raw JSON data or a typed [`Entity`]
//! extracted from user input. Comparisons (switch cases, filters) always work
//! on the resolved datum, so an entity and its parsed value compare equal.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A typed value extracted from user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Raw text the value was extracted from
    pub text: String,
    /// Parsed value
    pub value: Json,
    /// Name of the type that produced the entity
    pub type_name: String,
    /// Extraction confidence, 1.0 for deterministic parsers
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl Entity {
    /// Create an entity from raw text and its parsed value.
    pub fn new(text: impl Into<String>, value: Json, type_name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value,
            type_name: type_name.into(),
            confidence: 1.0,
        }
    }

    /// Replace the parsed value, keeping text and type.
    pub fn transform(mut self, f: impl FnOnce(Json) -> Json) -> Self {
        self.value = f(self.value);
        self
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<entity:{}:{}>", self.type_name, self.value)
    }
}

/// Dynamic value produced by running an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A typed entity extracted from user input
    Entity(Entity),
    /// Plain JSON data
    Data(Json),
}

impl Value {
    /// The null value.
    pub fn null() -> Self {
        Self::Data(Json::Null)
    }

    /// Resolve to the underlying JSON datum.
    ///
    /// Entities resolve to their parsed value, not their raw text.
    pub fn resolved(&self) -> &Json {
        match self {
            Self::Entity(entity) => &entity.value,
            Self::Data(data) => data,
        }
    }

    /// Consume the value, returning the underlying JSON datum.
    pub fn into_resolved(self) -> Json {
        match self {
            Self::Entity(entity) => entity.value,
            Self::Data(data) => data,
        }
    }

    /// True when the resolved datum is exactly `false`.
    pub fn is_false(&self) -> bool {
        matches!(self.resolved(), Json::Bool(false))
    }

    /// Resolved datum as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.resolved().as_str()
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

impl From<Json> for Value {
    fn from(data: Json) -> Self {
        Self::Data(data)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Data(Json::Bool(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Data(Json::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Data(Json::String(v.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Data(Json::String(v))
    }
}

/// Compare two values by their resolved data.
pub fn equal_values(a: &Value, b: &Value) -> bool {
    a.resolved() == b.resolved()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_resolves_to_parsed_value() {
        let entity = Entity::new("25", json!(25), "int");
        let value = Value::from(entity);
        assert_eq!(value.resolved(), &json!(25));
    }

    #[test]
    fn test_entity_and_data_compare_equal_when_resolved_matches() {
        let a = Value::from(Entity::new("yes", json!("yes"), "yes_no"));
        let b = Value::from("yes");
        assert!(equal_values(&a, &b));
    }

    #[test]
    fn test_is_false_only_for_boolean_false() {
        assert!(Value::from(false).is_false());
        assert!(!Value::from(0).is_false());
        assert!(!Value::null().is_false());
    }
}

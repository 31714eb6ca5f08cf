//! Conversation events.
//!
//! Events flow in two directions: user events arrive through the
//! conversation's event source, bot utterances and trace notifications leave
//! through its sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::types::EntityType;
use crate::value::Entity;

/// Who produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// One conversation event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Who sent it
    pub sender: Sender,
    /// Event kind tag (`utterance`, `control`, ...)
    pub kind: String,
    /// User utterance payload, when the event carries one
    pub utterance: Option<Utterance>,
    /// Free-form payload for non-utterance events
    pub data: Json,
    /// Arrival timestamp
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// A user utterance event.
    pub fn user_utterance(utterance: Utterance) -> Self {
        Self {
            sender: Sender::User,
            kind: "utterance".to_string(),
            utterance: Some(utterance),
            data: Json::Null,
            timestamp: Utc::now(),
        }
    }

    /// Utterance text, when present.
    pub fn text(&self) -> Option<&str> {
        self.utterance.as_ref().map(|u| u.text.as_str())
    }
}

/// A user utterance: raw text plus any pre-parsed understanding.
#[derive(Debug, Clone, Default)]
pub struct Utterance {
    /// Raw text as typed
    pub text: String,
    /// Pre-parsed intents, best first. Empty when only raw text is known.
    pub intents: Vec<ParsedIntent>,
}

/// A recognized intent attached to an utterance.
#[derive(Debug, Clone)]
pub struct ParsedIntent {
    /// Intent name
    pub name: String,
    /// Entities carried by the intent
    pub entities: Vec<Entity>,
    /// Recognition confidence
    pub confidence: f64,
}

impl Utterance {
    /// Utterance from raw text only.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            intents: Vec::new(),
        }
    }

    /// Best pre-parsed intent, if any.
    pub fn top_intent(&self) -> Option<&ParsedIntent> {
        self.intents.first()
    }

    /// Extract a typed entity from the utterance.
    ///
    /// When the utterance carries pre-parsed intents, only the top intent's
    /// entities are considered (any-typed extraction takes the first one).
    /// Otherwise the raw text is parsed with the given type.
    pub fn extract_type(&self, entity_type: &EntityType) -> Option<Entity> {
        if let Some(top) = self.top_intent() {
            let matched = if entity_type.is_any() {
                top.entities.first()
            } else {
                top.entities
                    .iter()
                    .find(|entity| entity.type_name == entity_type.name())
            };
            return matched.cloned();
        }
        entity_type.parse(&self.text)
    }
}

/// A resolved bot utterance handed to the output sink.
#[derive(Debug, Clone)]
pub struct BotUtterance {
    /// Resolved text
    pub text: String,
    /// Message-catalog key the text was resolved from, if any
    pub key: Option<String>,
}

/// Observational lifecycle notifications for the trace sink.
///
/// Purely diagnostic: nothing in the engine reads these back.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    TaskEnter { name: String },
    TaskLeave { name: String },
    AgentEnter { name: String },
    AgentLeave { name: String },
    ReactorPushed { level: String, name: String },
    ReactorMatched { level: String, name: String },
    AskPrompted { prompt: String, attempts: u32 },
    AskAccepted { prompt: String },
    AskRejected { prompt: String, attempts: u32 },
    AskInterrupted { prompt: String },
}
